//! # 元素基与组成坐标
//!
//! 把结构的元素多重集映射到固定的有序元素基上，
//! 归一化为每原子分数坐标。
//!
//! ## 过滤语义
//! 含有基外元素的结构被整体排除（不做重投影），
//! 以保证把多元数据集限制到子集时的精确排除行为。
//!
//! ## 依赖关系
//! - 被 `hull/phase.rs`, `hull/query.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{QonvexError, Result};
use crate::hull::COMP_TOL;
use crate::models::StructureRecord;

/// 元素基：一次凸包计算的固定有序（排序去重）元素集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBasis {
    elements: Vec<String>,
}

impl ElementBasis {
    /// 从调用方给定的元素列表创建（排序 + 去重）
    pub fn new(elements: &[String]) -> Result<Self> {
        let mut els: Vec<String> = elements
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        els.sort();
        els.dedup();

        if els.len() < 2 || els.len() > 3 {
            return Err(QonvexError::InvalidArgument(format!(
                "Element basis must contain 2 (binary) or 3 (ternary) elements, got {}",
                els.len()
            )));
        }

        Ok(ElementBasis { elements: els })
    }

    /// 基的维数（元素个数）
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 元素符号列表
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// 元素在基中的位置
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.elements.iter().position(|e| e == symbol)
    }

    /// 结构是否只含基内元素
    pub fn admits(&self, record: &StructureRecord) -> bool {
        record.elements_within(&self.elements)
    }

    /// 计算结构在基上的分数坐标（和为 1）
    ///
    /// 组成畸形（零原子、负计数、基外元素）时返回 `None`。
    pub fn fractions(&self, record: &StructureRecord) -> Option<Vec<f64>> {
        let total = record.num_atoms();
        if !(total > 0.0) {
            return None;
        }

        let mut fractions = vec![0.0; self.elements.len()];
        for (element, count) in &record.stoichiometry {
            if *count < 0.0 {
                return None;
            }
            if *count == 0.0 {
                continue;
            }
            let idx = self.index_of(element)?;
            fractions[idx] += count / total;
        }

        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > COMP_TOL {
            return None;
        }

        Some(fractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stoich: &[(&str, f64)]) -> StructureRecord {
        StructureRecord::new(
            "test",
            stoich.iter().map(|(e, n)| (e.to_string(), *n)).collect(),
            -1.0,
        )
    }

    #[test]
    fn test_basis_sorted_and_deduped() {
        let basis =
            ElementBasis::new(&["Sn".to_string(), "Li".to_string(), "Sn".to_string()]).unwrap();
        assert_eq!(basis.elements(), &["Li".to_string(), "Sn".to_string()]);
        assert_eq!(basis.index_of("Li"), Some(0));
        assert_eq!(basis.index_of("Sn"), Some(1));
        assert_eq!(basis.index_of("P"), None);
    }

    #[test]
    fn test_basis_size_limits() {
        assert!(ElementBasis::new(&["Li".to_string()]).is_err());
        assert!(ElementBasis::new(&[
            "K".to_string(),
            "Sn".to_string(),
            "P".to_string(),
            "S".to_string()
        ])
        .is_err());
    }

    #[test]
    fn test_fractions() {
        let basis = ElementBasis::new(&["Li".to_string(), "S".to_string(), "Sn".to_string()])
            .unwrap();
        let fr = basis.fractions(&record(&[("Sn", 2.0), ("S", 4.0)])).unwrap();
        assert!((fr[0] - 0.0).abs() < 1e-12);
        assert!((fr[1] - 4.0 / 6.0).abs() < 1e-12);
        assert!((fr[2] - 2.0 / 6.0).abs() < 1e-12);
        assert!((fr.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_extraneous_element_rejected() {
        let basis = ElementBasis::new(&["K".to_string(), "Sn".to_string()]).unwrap();
        let r = record(&[("K", 1.0), ("P", 2.0)]);
        assert!(!basis.admits(&r));
        assert!(basis.fractions(&r).is_none());
    }

    #[test]
    fn test_malformed_composition() {
        let basis = ElementBasis::new(&["K".to_string(), "Sn".to_string()]).unwrap();
        assert!(basis.fractions(&record(&[("K", 0.0)])).is_none());
        assert!(basis.fractions(&record(&[("K", -1.0), ("Sn", 2.0)])).is_none());
    }
}
