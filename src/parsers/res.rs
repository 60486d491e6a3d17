//! # AIRSS .res 格式解析器
//!
//! 从 AIRSS 结构搜索产生的 .res 文件提取组成与焓。
//! 凸包分析不需要晶格与原子坐标，只统计 TITL 行元数据
//! 和各元素的原子数。
//!
//! ## .res 格式说明
//! ```text
//! TITL name P V E H 0 0 n (sym) [spin info]
//! CELL 1.0 a b c alpha beta gamma
//! LATT -1
//! SFAC Element1 Element2 ...
//! Element1 1 x1 y1 z1 1.0
//! Element2 2 x2 y2 z2 1.0
//! ...
//! END
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{QonvexError, Result};
use crate::models::StructureRecord;
use std::fs;
use std::path::Path;

/// 解析 .res 文件
pub fn parse_res_file(path: &Path) -> Result<StructureRecord> {
    let content = fs::read_to_string(path).map_err(|e| QonvexError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_res_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 .res 格式
pub fn parse_res_content(content: &str, default_name: &str) -> Result<StructureRecord> {
    let mut name = default_name.to_string();
    let mut enthalpy: Option<f64> = None;
    let mut sfac_elements: Vec<String> = Vec::new();
    let mut counts: Vec<(String, f64)> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_uppercase().as_str() {
            "TITL" => {
                // TITL name P V E H 0 0 n (sym) [spin]
                if parts.len() >= 2 {
                    name = parts[1].to_string();
                }
                // parts[4] 是能量 E，parts[5] 是焓 H；热力学分析用焓
                if parts.len() >= 6 {
                    enthalpy = parts[5].parse().ok();
                }
            }
            "SFAC" => {
                // SFAC Element1 Element2 ...
                sfac_elements = parts[1..].iter().map(|s| s.to_string()).collect();
            }
            "CELL" | "LATT" | "ZERR" | "END" | "REM" => {
                // 忽略这些行
            }
            _ => {
                // 可能是原子行: Element type x y z occ
                if parts.len() >= 5 && !sfac_elements.is_empty() {
                    let element = parts[0];
                    if sfac_elements
                        .iter()
                        .any(|e| e.eq_ignore_ascii_case(element))
                        && parts[2].parse::<f64>().is_ok()
                        && parts[3].parse::<f64>().is_ok()
                        && parts[4].parse::<f64>().is_ok()
                    {
                        match counts.iter_mut().find(|(e, _)| e == element) {
                            Some((_, n)) => *n += 1.0,
                            None => counts.push((element.to_string(), 1.0)),
                        }
                    }
                }
            }
        }
    }

    let enthalpy = enthalpy.ok_or_else(|| QonvexError::ParseError {
        format: "res".to_string(),
        path: name.clone(),
        reason: "Missing enthalpy field in TITL line".to_string(),
    })?;

    if counts.is_empty() {
        return Err(QonvexError::ParseError {
            format: "res".to_string(),
            path: name,
            reason: "No atom lines found".to_string(),
        });
    }

    Ok(StructureRecord::new(name, counts, enthalpy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_res_basic() {
        let content = r#"
TITL TiC-12345 100.0 50.0 -100.0 -99.5 0 0 8 (Fm-3m)
CELL 1.0 4.33 4.33 4.33 90.0 90.0 90.0
LATT -1
SFAC Ti C
Ti 1 0.0 0.0 0.0 1.0
Ti 1 0.5 0.5 0.0 1.0
Ti 1 0.5 0.0 0.5 1.0
Ti 1 0.0 0.5 0.5 1.0
C 2 0.5 0.5 0.5 1.0
C 2 0.0 0.0 0.5 1.0
C 2 0.0 0.5 0.0 1.0
C 2 0.5 0.0 0.0 1.0
END
"#;
        let record = parse_res_content(content, "test").unwrap();
        assert_eq!(record.source, "TiC-12345");
        assert!((record.energy - (-99.5)).abs() < 1e-9);
        assert_eq!(record.stoichiometry.len(), 2);
        assert!((record.num_atoms() - 8.0).abs() < 1e-9);
        let ti = record
            .stoichiometry
            .iter()
            .find(|(e, _)| e == "Ti")
            .unwrap();
        assert!((ti.1 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_res_elemental() {
        let content = r#"
TITL Fe2-123 0.0 25.0 -50.0 -50.2 0 0 2 (P-1)
CELL 1.0 2.87 2.87 2.87 90.0 90.0 90.0
LATT -1
SFAC Fe
Fe 1 0.0 0.0 0.0 1.0
Fe 1 0.5 0.5 0.5 1.0
END
"#;
        let record = parse_res_content(content, "test").unwrap();
        assert!(record.is_elemental());
        assert_eq!(record.elemental_symbol(), Some("Fe"));
        assert!((record.energy_per_atom() - (-25.1)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_res_missing_enthalpy() {
        let content = r#"
TITL Broken
SFAC Fe
Fe 1 0.0 0.0 0.0 1.0
END
"#;
        assert!(parse_res_content(content, "test").is_err());
    }

    #[test]
    fn test_parse_res_no_atoms() {
        let content = r#"
TITL Empty 0.0 10.0 0.0 -1.0 0 0 0 (P1)
CELL 1.0 5.0 5.0 5.0 90.0 90.0 90.0
SFAC Fe
END
"#;
        assert!(parse_res_content(content, "test").is_err());
    }
}
