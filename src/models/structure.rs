//! # 结构记录数据模型
//!
//! 凸包计算的输入单元：一个结构的化学计量比与总能量。
//! 不保留晶格和原子坐标，热力学分析只需要组成和能量。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `hull/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 结构记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureRecord {
    /// 来源标识（通常为文件名）
    pub source: String,

    /// 化学计量比：(元素符号, 原子数)
    pub stoichiometry: Vec<(String, f64)>,

    /// 总能量 / 焓 (eV)
    pub energy: f64,
}

impl StructureRecord {
    pub fn new(source: impl Into<String>, stoichiometry: Vec<(String, f64)>, energy: f64) -> Self {
        StructureRecord {
            source: source.into(),
            stoichiometry,
            energy,
        }
    }

    /// 总原子数
    pub fn num_atoms(&self) -> f64 {
        self.stoichiometry.iter().map(|(_, n)| n).sum()
    }

    /// 每原子能量 (eV)
    pub fn energy_per_atom(&self) -> f64 {
        let n = self.num_atoms();
        if n > 0.0 {
            self.energy / n
        } else {
            f64::NAN
        }
    }

    /// 是否为单质（只含一种元素）
    pub fn is_elemental(&self) -> bool {
        let mut elements: Vec<&str> = self
            .stoichiometry
            .iter()
            .filter(|(_, n)| *n > 0.0)
            .map(|(e, _)| e.as_str())
            .collect();
        elements.dedup();
        elements.len() == 1
    }

    /// 单质的元素符号
    pub fn elemental_symbol(&self) -> Option<&str> {
        if self.is_elemental() {
            self.stoichiometry
                .iter()
                .find(|(_, n)| *n > 0.0)
                .map(|(e, _)| e.as_str())
        } else {
            None
        }
    }

    /// 所有元素是否都在给定集合内
    pub fn elements_within(&self, allowed: &[String]) -> bool {
        self.stoichiometry
            .iter()
            .filter(|(_, n)| *n > 0.0)
            .all(|(e, _)| allowed.iter().any(|a| a == e))
    }

    /// 计算化学式字符串
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
        for (e, n) in &self.stoichiometry {
            *counts.entry(e.as_str()).or_insert(0.0) += n;
        }

        counts
            .into_iter()
            .filter(|(_, n)| *n > 0.0)
            .map(|(e, n)| {
                if (n - 1.0).abs() < 1e-9 {
                    e.to_string()
                } else if (n - n.round()).abs() < 1e-9 {
                    format!("{}{}", e, n.round() as i64)
                } else {
                    format!("{}{:.3}", e, n)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stoich: &[(&str, f64)], energy: f64) -> StructureRecord {
        StructureRecord::new(
            "test",
            stoich.iter().map(|(e, n)| (e.to_string(), *n)).collect(),
            energy,
        )
    }

    #[test]
    fn test_energy_per_atom() {
        let r = record(&[("Li", 2.0), ("S", 1.0)], -661.985);
        assert!((r.energy_per_atom() - (-661.985 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_elemental_detection() {
        let li = record(&[("Li", 2.0)], -380.071);
        assert!(li.is_elemental());
        assert_eq!(li.elemental_symbol(), Some("Li"));

        let li2s = record(&[("Li", 2.0), ("S", 1.0)], -661.985);
        assert!(!li2s.is_elemental());
        assert_eq!(li2s.elemental_symbol(), None);
    }

    #[test]
    fn test_elements_within() {
        let r = record(&[("K", 1.0), ("P", 2.0), ("Sn", 2.0)], -100.0);
        let kp_sn: Vec<String> = vec!["K".into(), "P".into(), "Sn".into()];
        let kp: Vec<String> = vec!["K".into(), "P".into()];
        assert!(r.elements_within(&kp_sn));
        assert!(!r.elements_within(&kp));
    }

    #[test]
    fn test_formula() {
        let r = record(&[("Sn", 2.0), ("S", 4.0)], -1305.0911);
        assert_eq!(r.formula(), "S4Sn2");

        let single = record(&[("P", 1.0)], -50.0);
        assert_eq!(single.formula(), "P");
    }
}
