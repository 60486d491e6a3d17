//! # 查询门面
//!
//! 对外的统一入口：结构记录 → 元素基过滤 → 相点构建 →
//! 凸包 → 距离 / 电压查询。命令层只与本模块交互。
//!
//! ## 依赖关系
//! - 被 `commands/hull.rs`, `commands/voltage.rs` 使用
//! - 使用 `hull/composition.rs`, `hull/phase.rs`,
//!   `hull/engine.rs`, `hull/voltage.rs`

use crate::error::{QonvexError, Result};
use crate::hull::composition::ElementBasis;
use crate::hull::engine::{self, Hull};
use crate::hull::phase::{self, PhasePoint};
use crate::hull::voltage::{self, VoltageCurve};
use crate::models::StructureRecord;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// 一次完成构建的凸包查询对象
#[derive(Debug)]
pub struct QueryHull {
    basis: ElementBasis,
    points: Vec<PhasePoint>,
    hull: Hull,

    /// 因含基外元素被排除的结构数
    pub excluded: usize,

    /// 因组成畸形被跳过的结构数
    pub failed: usize,
}

impl QueryHull {
    /// 从结构记录构建凸包
    ///
    /// `chemical_potentials` 覆盖对应元素的端元参考能量。
    pub fn build(
        records: &[StructureRecord],
        elements: &[String],
        chemical_potentials: &BTreeMap<String, f64>,
    ) -> Result<QueryHull> {
        let basis = ElementBasis::new(elements)?;
        let report = phase::build_phase_points(records, &basis, chemical_potentials)?;
        let mut points = report.points;
        let hull = engine::build(&mut points, basis.len())?;

        Ok(QueryHull {
            basis,
            points,
            hull,
            excluded: report.excluded,
            failed: report.failed,
        })
    }

    pub fn basis(&self) -> &ElementBasis {
        &self.basis
    }

    /// 参与计算的全部相点（凸包距离已填充）
    pub fn points(&self) -> &[PhasePoint] {
        &self.points
    }

    /// 凸包上的相点，按凸包成员顺序
    pub fn hull_members(&self) -> Vec<&PhasePoint> {
        self.hull.members.iter().map(|&i| &self.points[i]).collect()
    }

    /// 全部相点的 (来源, 凸包距离)，按距离升序
    pub fn hull_distances(&self) -> Vec<(&str, f64)> {
        let mut distances: Vec<(&str, f64)> = self
            .points
            .iter()
            .map(|p| (p.source.as_str(), p.hull_distance))
            .collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        distances
    }

    /// 批量外部探测点距离（并行）
    ///
    /// 探测点不改变凸包；能量低于凸包时返回负距离。
    pub fn probe_distances(&self, probes: &[(Vec<f64>, f64)]) -> Vec<Result<f64>> {
        probes
            .par_iter()
            .map(|(composition, energy)| {
                engine::probe_distance(
                    &self.points,
                    &self.hull.facets,
                    self.basis.len(),
                    composition,
                    *energy,
                )
            })
            .collect()
    }

    /// 推导电压曲线
    ///
    /// 二元体系恒返回一条曲线；三元体系按路径搜索返回
    /// 一条或多条，以及按起点隔离的失败描述。
    pub fn voltage_curves(
        &self,
        active: &str,
        all_pathways: bool,
    ) -> Result<(Vec<VoltageCurve>, Vec<String>)> {
        if self.basis.index_of(active).is_none() {
            return Err(QonvexError::InvalidArgument(format!(
                "Active element '{}' is not in the element basis [{}]",
                active,
                self.basis.elements().join(", ")
            )));
        }

        match self.basis.len() {
            2 => {
                let curve = voltage::binary_curve(&self.points, &self.hull, &self.basis, active)?;
                Ok((vec![curve], Vec::new()))
            }
            3 => voltage::ternary_curves(&self.points, &self.hull, &self.basis, active, all_pathways),
            n => Err(QonvexError::InvalidArgument(format!(
                "Voltage curves require a 2- or 3-element basis, got {}",
                n
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, stoich: &[(&str, f64)], energy: f64) -> StructureRecord {
        StructureRecord::new(
            name,
            stoich.iter().map(|(e, n)| (e.to_string(), *n)).collect(),
            energy,
        )
    }

    fn elements(names: &[&str]) -> Vec<String> {
        names.iter().map(|e| e.to_string()).collect()
    }

    fn ksn_records() -> Vec<StructureRecord> {
        vec![
            record("K", &[("K", 1.0)], -100.0),
            record("Sn", &[("Sn", 1.0)], -95.0),
            record("P", &[("P", 1.0)], -60.0),
            record("KSn", &[("K", 1.0), ("Sn", 1.0)], -196.4),
            record("KSn-meta", &[("K", 1.0), ("Sn", 1.0)], -196.0),
            record("KSnP", &[("K", 1.0), ("Sn", 1.0), ("P", 1.0)], -260.0),
        ]
    }

    #[test]
    fn test_subset_basis_excludes_extraneous() {
        // K-Sn 子集：含 P 的结构整体排除
        let query =
            QueryHull::build(&ksn_records(), &elements(&["K", "Sn"]), &BTreeMap::new()).unwrap();
        assert_eq!(query.excluded, 2);
        assert_eq!(query.failed, 0);
        assert_eq!(query.points().len(), 4);

        let members: Vec<&str> = query.hull_members().iter().map(|p| p.source.as_str()).collect();
        assert_eq!(members, vec!["K", "Sn", "KSn"]);
    }

    #[test]
    fn test_hull_distances_sorted() {
        let query =
            QueryHull::build(&ksn_records(), &elements(&["K", "Sn"]), &BTreeMap::new()).unwrap();
        let distances = query.hull_distances();
        assert_eq!(distances.len(), 4);
        for w in distances.windows(2) {
            assert!(w[0].1 <= w[1].1);
        }
        // 亚稳 KSn 高出 0.2 eV/atom
        let meta = distances.iter().find(|(s, _)| *s == "KSn-meta").unwrap();
        assert!((meta.1 - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_missing_end_member_and_override() {
        let records = vec![
            record("K", &[("K", 1.0)], -100.0),
            record("KSn", &[("K", 1.0), ("Sn", 1.0)], -196.4),
        ];
        // 没有 Sn 单质：失败
        let err = QueryHull::build(&records, &elements(&["K", "Sn"]), &BTreeMap::new());
        assert!(matches!(
            err,
            Err(QonvexError::MissingEndMember { ref element }) if element == "Sn"
        ));

        // 外部化学势补上端元
        let mut chempots = BTreeMap::new();
        chempots.insert("Sn".to_string(), -95.0);
        let query = QueryHull::build(&records, &elements(&["K", "Sn"]), &chempots).unwrap();
        // KSn: -98.2 - (-97.5) = -0.7
        let ksn = query
            .points()
            .iter()
            .find(|p| p.source == "KSn")
            .unwrap();
        assert!((ksn.formation_energy - (-0.7)).abs() < 1e-9);
    }

    #[test]
    fn test_probe_distances_parallel() {
        let query =
            QueryHull::build(&ksn_records(), &elements(&["K", "Sn"]), &BTreeMap::new()).unwrap();

        let probes = vec![
            (vec![0.5, 0.5], -0.5),
            (vec![0.5, 0.5], -0.9),
            (vec![0.5, 0.6], -0.5),
        ];
        let results = query.probe_distances(&probes);
        assert_eq!(results.len(), 3);

        // KSn 形成能 -0.7：上方 0.2，下方 -0.2
        assert!((results[0].as_ref().unwrap() - 0.2).abs() < 1e-9);
        assert!((results[1].as_ref().unwrap() - (-0.2)).abs() < 1e-9);
        assert!(results[2].is_err());
    }

    #[test]
    fn test_voltage_active_validation() {
        let query =
            QueryHull::build(&ksn_records(), &elements(&["K", "Sn"]), &BTreeMap::new()).unwrap();
        assert!(query.voltage_curves("Li", true).is_err());
        let (curves, failures) = query.voltage_curves("K", true).unwrap();
        assert_eq!(curves.len(), 1);
        assert!(failures.is_empty());
    }
}
