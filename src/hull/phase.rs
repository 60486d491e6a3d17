//! # 相点构建
//!
//! 把可接纳的结构转换为相点：组成分数坐标 + 每原子形成能。
//! 形成能以各元素最低能量单质为参考零点。
//!
//! ## 端元选择
//! 每个元素取输入中能量最低的单质结构作为参考；
//! 能量完全相同时取输入顺序中先出现者（确定性约定）。
//! 调用方可用外部化学势覆盖扫描结果。
//!
//! ## 部分失败策略
//! 单个结构畸形不中止整批：记录被排除 / 失败计数，
//! 其余结构继续参与凸包构建。
//!
//! ## 依赖关系
//! - 被 `hull/query.rs` 使用
//! - 使用 `hull/composition.rs`, `models/structure.rs`

use crate::error::{QonvexError, Result};
use crate::hull::composition::ElementBasis;
use crate::models::StructureRecord;
use std::collections::BTreeMap;

/// 相点：一个结构在组成单纯形中的位置与形成能
#[derive(Debug, Clone)]
pub struct PhasePoint {
    /// 基上的分数组成（和为 1）
    pub composition: Vec<f64>,

    /// 每原子形成能 (eV)
    pub formation_energy: f64,

    /// 来源标识
    pub source: String,

    /// 凸包距离 (eV/atom)，由凸包引擎填充
    pub hull_distance: f64,
}

/// 相点构建报告
#[derive(Debug)]
pub struct BuildReport {
    /// 构建出的相点
    pub points: Vec<PhasePoint>,

    /// 因含基外元素被排除的结构数
    pub excluded: usize,

    /// 因组成畸形失败的结构数
    pub failed: usize,
}

/// 确定每个基元素的端元参考能量 (eV/atom)
///
/// `supplied` 中给出的化学势优先于输入扫描。
pub fn end_member_energies(
    records: &[StructureRecord],
    basis: &ElementBasis,
    supplied: &BTreeMap<String, f64>,
) -> Result<Vec<f64>> {
    let mut references = Vec::with_capacity(basis.len());

    for element in basis.elements() {
        if let Some(&energy) = supplied.get(element) {
            references.push(energy);
            continue;
        }

        let mut best: Option<f64> = None;
        for record in records {
            if record.elemental_symbol() != Some(element.as_str()) {
                continue;
            }
            let e = record.energy_per_atom();
            if !e.is_finite() {
                continue;
            }
            // 严格小于才替换：相同能量保留首次出现
            match best {
                Some(current) if e >= current => {}
                _ => best = Some(e),
            }
        }

        match best {
            Some(e) => references.push(e),
            None => {
                return Err(QonvexError::MissingEndMember {
                    element: element.clone(),
                })
            }
        }
    }

    Ok(references)
}

/// 把结构记录批量转换为相点
pub fn build_phase_points(
    records: &[StructureRecord],
    basis: &ElementBasis,
    supplied: &BTreeMap<String, f64>,
) -> Result<BuildReport> {
    let references = end_member_energies(records, basis, supplied)?;

    let mut points = Vec::new();
    let mut excluded = 0;
    let mut failed = 0;

    for record in records {
        if !basis.admits(record) {
            excluded += 1;
            continue;
        }

        let fractions = match basis.fractions(record) {
            Some(fr) => fr,
            None => {
                failed += 1;
                continue;
            }
        };

        let reference: f64 = fractions
            .iter()
            .zip(references.iter())
            .map(|(x, e)| x * e)
            .sum();
        let formation_energy = record.energy_per_atom() - reference;

        if !formation_energy.is_finite() {
            failed += 1;
            continue;
        }

        points.push(PhasePoint {
            composition: fractions,
            formation_energy,
            source: record.source.clone(),
            hull_distance: f64::NAN,
        });
    }

    Ok(BuildReport {
        points,
        excluded,
        failed,
    })
}
