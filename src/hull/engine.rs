//! # 凸包引擎
//!
//! 在 (k-1) 维组成坐标 + 能量的提升空间中构建下凸包，
//! 并计算每个相点到凸包的竖直（能量轴）距离。
//!
//! ## 算法概述
//! - 二元：按组成排序后单调链扫描，O(n log n)
//! - 三元：枚举候选三角形并做支撑面检验（所有其余点
//!   在平面之上），得到下包络的单纯形面
//! - 距离：在包含该组成的下包络面内做重心插值
//!
//! ## 简并处理
//! 相同组成的多个点只有能量最低者可能在凸包上，
//! 其余即使几何重合也不算凸包成员。
//! 距支撑面 1e-9 eV 以内视为在凸包上，距离钳为 0。
//!
//! ## 依赖关系
//! - 被 `hull/query.rs`, `hull/voltage.rs` 使用
//! - 使用 `hull/phase.rs` 的 PhasePoint

use crate::error::{QonvexError, Result};
use crate::hull::phase::PhasePoint;
use crate::hull::{COMP_TOL, HULL_TOL};

/// 凸包单纯形面（二元 2 顶点连接线 / 三元 3 顶点连接三角形）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    /// 顶点在相点数组中的下标
    pub vertices: Vec<usize>,
}

/// 下凸包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hull {
    /// 在凸包上的相点下标（升序）
    pub members: Vec<usize>,

    /// 单纯形面列表
    pub facets: Vec<Facet>,
}

/// 相点的独立组成坐标（去掉最后一个冗余分量）
fn coords(point: &PhasePoint, k: usize) -> Vec<f64> {
    point.composition[..k - 1].to_vec()
}

/// 两个组成是否在容差内相同
fn same_composition(a: &PhasePoint, b: &PhasePoint) -> bool {
    a.composition
        .iter()
        .zip(b.composition.iter())
        .all(|(x, y)| (x - y).abs() < COMP_TOL)
}

/// 二维叉积
fn cross2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// 构建下凸包并填充所有相点的凸包距离
///
/// 距离为负（超出容差）表示面分类出错，按内部一致性错误处理。
pub fn build(points: &mut [PhasePoint], k: usize) -> Result<Hull> {
    if points.is_empty() {
        return Err(QonvexError::EmptyHull);
    }

    // 相同组成只保留能量最低者作为候选（严格小于，首次出现优先）
    let mut candidates: Vec<usize> = Vec::new();
    'outer: for i in 0..points.len() {
        for slot in candidates.iter_mut() {
            if same_composition(&points[i], &points[*slot]) {
                if points[i].formation_energy < points[*slot].formation_energy {
                    *slot = i;
                }
                continue 'outer;
            }
        }
        candidates.push(i);
    }

    check_degeneracy(points, &candidates, k)?;

    let facets = match k {
        2 => binary_facets(points, &candidates),
        3 => ternary_facets(points, &candidates),
        _ => {
            return Err(QonvexError::InvalidArgument(format!(
                "Hull construction supports 2 or 3 elements, got {}",
                k
            )))
        }
    };

    if facets.is_empty() {
        return Err(QonvexError::InternalConsistency(
            "Hull construction produced no lower facets".to_string(),
        ));
    }

    // 全部相点的凸包距离
    for i in 0..points.len() {
        let c = coords(&points[i], k);
        let hull_energy = hull_energy_at(points, &facets, k, &c).ok_or_else(|| {
            QonvexError::InternalConsistency(format!(
                "No enclosing lower facet found for '{}'",
                points[i].source
            ))
        })?;

        let mut distance = points[i].formation_energy - hull_energy;
        if distance < -HULL_TOL {
            return Err(QonvexError::InternalConsistency(format!(
                "Negative hull distance {distance:e} for '{}': facet misclassification",
                points[i].source
            )));
        }
        if distance < HULL_TOL {
            distance = 0.0;
        }
        points[i].hull_distance = distance;
    }

    // 成员：距离为零的候选点（重合组成的非最低点永不入选）
    let mut members: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| points[i].hull_distance == 0.0)
        .collect();
    members.sort_unstable();

    Ok(Hull { members, facets })
}

/// 对外部探测点的批量距离查询使用的单点计算
///
/// 不修改凸包状态；探测点能量低于凸包时允许返回负值
/// （表示该点会改变凸包）。
pub fn probe_distance(
    points: &[PhasePoint],
    facets: &[Facet],
    k: usize,
    composition: &[f64],
    formation_energy: f64,
) -> Result<f64> {
    if composition.len() != k {
        return Err(QonvexError::InvalidArgument(format!(
            "Probe composition has {} components, basis has {}",
            composition.len(),
            k
        )));
    }
    let sum: f64 = composition.iter().sum();
    if (sum - 1.0).abs() > COMP_TOL || composition.iter().any(|x| *x < -COMP_TOL) {
        return Err(QonvexError::InvalidArgument(
            "Probe composition fractions must be non-negative and sum to 1".to_string(),
        ));
    }

    let hull_energy = hull_energy_at(points, facets, k, &composition[..k - 1]).ok_or_else(
        || {
            QonvexError::InvalidArgument(
                "Probe composition lies outside the hull's composition span".to_string(),
            )
        },
    )?;

    let mut distance = formation_energy - hull_energy;
    if distance.abs() < HULL_TOL {
        distance = 0.0;
    }
    Ok(distance)
}

/// 在给定组成处插值凸包能量
fn hull_energy_at(
    points: &[PhasePoint],
    facets: &[Facet],
    k: usize,
    c: &[f64],
) -> Option<f64> {
    match k {
        2 => {
            let u = c[0];
            for facet in facets {
                let (i, j) = (facet.vertices[0], facet.vertices[1]);
                let (ui, uj) = (points[i].composition[0], points[j].composition[0]);
                let (lo, hi) = if ui <= uj { (ui, uj) } else { (uj, ui) };
                if u >= lo - COMP_TOL && u <= hi + COMP_TOL {
                    let span = uj - ui;
                    let t = if span.abs() < 1e-15 {
                        0.0
                    } else {
                        ((u - ui) / span).clamp(0.0, 1.0)
                    };
                    return Some(
                        (1.0 - t) * points[i].formation_energy
                            + t * points[j].formation_energy,
                    );
                }
            }
            None
        }
        3 => {
            // 取重心坐标最靠内的面，避免边界上的数值抖动
            let mut best: Option<(f64, f64)> = None;
            for facet in facets {
                let (a, b, d) = (facet.vertices[0], facet.vertices[1], facet.vertices[2]);
                let (ax, ay) = (points[a].composition[0], points[a].composition[1]);
                let (bx, by) = (points[b].composition[0], points[b].composition[1]);
                let (dx, dy) = (points[d].composition[0], points[d].composition[1]);

                let denom = cross2d(bx - ax, by - ay, dx - ax, dy - ay);
                if denom.abs() < 1e-12 {
                    continue;
                }
                let lb = cross2d(c[0] - ax, c[1] - ay, dx - ax, dy - ay) / denom;
                let ld = cross2d(bx - ax, by - ay, c[0] - ax, c[1] - ay) / denom;
                let la = 1.0 - lb - ld;

                let min_lambda = la.min(lb).min(ld);
                let energy = la * points[a].formation_energy
                    + lb * points[b].formation_energy
                    + ld * points[d].formation_energy;

                match best {
                    Some((best_lambda, _)) if best_lambda >= min_lambda => {}
                    _ => best = Some((min_lambda, energy)),
                }
            }
            match best {
                Some((min_lambda, energy)) if min_lambda >= -COMP_TOL => Some(energy),
                _ => None,
            }
        }
        _ => None,
    }
}

/// 输入组成是否张满 k-1 个独立方向
fn check_degeneracy(points: &[PhasePoint], candidates: &[usize], k: usize) -> Result<()> {
    match k {
        2 => {
            if candidates.len() < 2 {
                return Err(QonvexError::DegenerateComposition { expected: 1 });
            }
        }
        3 => {
            if candidates.len() < 3 {
                return Err(QonvexError::DegenerateComposition { expected: 2 });
            }
            // 寻找非共线三元组
            let p0 = &points[candidates[0]];
            let mut second: Option<usize> = None;
            for &i in &candidates[1..] {
                let dx = points[i].composition[0] - p0.composition[0];
                let dy = points[i].composition[1] - p0.composition[1];
                if dx.abs() > COMP_TOL || dy.abs() > COMP_TOL {
                    second = Some(i);
                    break;
                }
            }
            let second = match second {
                Some(i) => i,
                None => return Err(QonvexError::DegenerateComposition { expected: 2 }),
            };
            let (ex, ey) = (
                points[second].composition[0] - p0.composition[0],
                points[second].composition[1] - p0.composition[1],
            );
            let non_collinear = candidates.iter().any(|&i| {
                let dx = points[i].composition[0] - p0.composition[0];
                let dy = points[i].composition[1] - p0.composition[1];
                cross2d(ex, ey, dx, dy).abs() > COMP_TOL
            });
            if !non_collinear {
                return Err(QonvexError::DegenerateComposition { expected: 2 });
            }
        }
        _ => {}
    }
    Ok(())
}

/// 二元下凸包：单调链
fn binary_facets(points: &[PhasePoint], candidates: &[usize]) -> Vec<Facet> {
    let mut order: Vec<usize> = candidates.to_vec();
    order.sort_by(|&a, &b| {
        points[a].composition[0]
            .partial_cmp(&points[b].composition[0])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut chain: Vec<usize> = Vec::new();
    for &i in &order {
        while chain.len() >= 2 {
            let o = chain[chain.len() - 2];
            let a = chain[chain.len() - 1];
            let cross = (points[a].composition[0] - points[o].composition[0])
                * (points[i].formation_energy - points[o].formation_energy)
                - (points[a].formation_energy - points[o].formation_energy)
                    * (points[i].composition[0] - points[o].composition[0]);
            if cross <= 0.0 {
                chain.pop();
            } else {
                break;
            }
        }
        chain.push(i);
    }

    chain
        .windows(2)
        .map(|w| Facet {
            vertices: vec![w[0], w[1]],
        })
        .collect()
}

/// 三元下包络：支撑面枚举
fn ternary_facets(points: &[PhasePoint], candidates: &[usize]) -> Vec<Facet> {
    let m = candidates.len();
    let mut facets = Vec::new();

    for a in 0..m {
        for b in (a + 1)..m {
            for d in (b + 1)..m {
                let (ia, ib, id) = (candidates[a], candidates[b], candidates[d]);
                let pa = &points[ia];
                let pb = &points[ib];
                let pd = &points[id];

                let e1 = [
                    pb.composition[0] - pa.composition[0],
                    pb.composition[1] - pa.composition[1],
                    pb.formation_energy - pa.formation_energy,
                ];
                let e2 = [
                    pd.composition[0] - pa.composition[0],
                    pd.composition[1] - pa.composition[1],
                    pd.formation_energy - pa.formation_energy,
                ];

                // 平面法向量
                let mut nx = e1[1] * e2[2] - e1[2] * e2[1];
                let mut ny = e1[2] * e2[0] - e1[0] * e2[2];
                let mut nz = e1[0] * e2[1] - e1[1] * e2[0];

                // nz 同时是组成空间三角形的有向面积：接近零则组成简并
                if nz.abs() < 1e-12 {
                    continue;
                }

                // 统一取能量分量为负的外法向（下包络面）
                if nz > 0.0 {
                    nx = -nx;
                    ny = -ny;
                    nz = -nz;
                }

                // 支撑面检验：其余候选点都在平面之上（容差内）
                let tolerance = HULL_TOL * nz.abs();
                let mut supporting = true;
                for (q, &iq) in candidates.iter().enumerate() {
                    if q == a || q == b || q == d {
                        continue;
                    }
                    let pq = &points[iq];
                    let dot = nx * (pq.composition[0] - pa.composition[0])
                        + ny * (pq.composition[1] - pa.composition[1])
                        + nz * (pq.formation_energy - pa.formation_energy);
                    // nz < 0 时 dot > 0 表示该点位于平面之下
                    if dot > tolerance {
                        supporting = false;
                        break;
                    }
                }

                if supporting {
                    facets.push(Facet {
                        vertices: vec![ia, ib, id],
                    });
                }
            }
        }
    }

    facets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(composition: &[f64], formation_energy: f64, source: &str) -> PhasePoint {
        PhasePoint {
            composition: composition.to_vec(),
            formation_energy,
            source: source.to_string(),
            hull_distance: f64::NAN,
        }
    }

    fn binary_set() -> Vec<PhasePoint> {
        vec![
            point(&[0.0, 1.0], 0.0, "B"),
            point(&[0.5, 0.5], -0.5, "AB"),
            point(&[0.5, 0.5], -0.3, "AB-metastable"),
            point(&[2.0 / 3.0, 1.0 / 3.0], -0.4, "A2B"),
            point(&[0.3, 0.7], -0.1, "A3B7"),
            point(&[1.0, 0.0], 0.0, "A"),
        ]
    }

    #[test]
    fn test_binary_hull_membership() {
        let mut points = binary_set();
        let hull = build(&mut points, 2).unwrap();

        let member_sources: Vec<&str> = hull
            .members
            .iter()
            .map(|&i| points[i].source.as_str())
            .collect();
        assert_eq!(member_sources, vec!["B", "AB", "A2B", "A"]);
        assert_eq!(hull.facets.len(), 3);
    }

    #[test]
    fn test_binary_hull_distances() {
        let mut points = binary_set();
        build(&mut points, 2).unwrap();

        for p in &points {
            assert!(p.hull_distance >= 0.0, "negative distance for {}", p.source);
        }

        // 凸包成员距离精确为零
        assert_eq!(points[0].hull_distance, 0.0);
        assert_eq!(points[1].hull_distance, 0.0);
        assert_eq!(points[3].hull_distance, 0.0);
        assert_eq!(points[5].hull_distance, 0.0);

        // 重合组成的亚稳点：到同组成最低能量点的能量差
        assert!((points[2].hull_distance - 0.2).abs() < 1e-9);

        // 0.3 处插值：-0.5 * 0.3/0.5 = -0.3，距离 0.2
        assert!((points[4].hull_distance - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_composition_never_member() {
        let mut points = vec![
            point(&[0.0, 1.0], 0.0, "B"),
            point(&[1.0, 0.0], 0.0, "A"),
            point(&[0.5, 0.5], -0.5, "AB-1"),
            point(&[0.5, 0.5], -0.5, "AB-2"),
        ];
        let hull = build(&mut points, 2).unwrap();

        // 能量完全相同：首次出现者入选
        assert!(hull.members.contains(&2));
        assert!(!hull.members.contains(&3));
        assert_eq!(points[3].hull_distance, 0.0);
    }

    #[test]
    fn test_on_hull_within_tolerance() {
        // 连接线上方 1e-10 的点视为在凸包上
        let mut points = vec![
            point(&[0.0, 1.0], 0.0, "B"),
            point(&[1.0, 0.0], 0.0, "A"),
            point(&[0.5, 0.5], -0.5, "AB"),
            point(&[0.25, 0.75], -0.25 + 1e-10, "near-hull"),
        ];
        let hull = build(&mut points, 2).unwrap();
        assert_eq!(points[3].hull_distance, 0.0);
        assert!(hull.members.contains(&3));
    }

    #[test]
    fn test_empty_input() {
        let mut points: Vec<PhasePoint> = Vec::new();
        assert!(matches!(build(&mut points, 2), Err(QonvexError::EmptyHull)));
    }

    #[test]
    fn test_degenerate_composition() {
        let mut points = vec![
            point(&[0.5, 0.5], -0.5, "AB-1"),
            point(&[0.5, 0.5], -0.3, "AB-2"),
        ];
        assert!(matches!(
            build(&mut points, 2),
            Err(QonvexError::DegenerateComposition { expected: 1 })
        ));

        // 三元共线：全部落在一条组成线上
        let mut collinear = vec![
            point(&[0.0, 0.5, 0.5], 0.0, "a"),
            point(&[0.5, 0.25, 0.25], -0.1, "b"),
            point(&[1.0, 0.0, 0.0], 0.0, "c"),
        ];
        assert!(matches!(
            build(&mut collinear, 3),
            Err(QonvexError::DegenerateComposition { expected: 2 })
        ));
    }

    #[test]
    fn test_deterministic_rebuild() {
        let mut points_a = binary_set();
        let mut points_b = binary_set();
        let hull_a = build(&mut points_a, 2).unwrap();
        let hull_b = build(&mut points_b, 2).unwrap();

        assert_eq!(hull_a, hull_b);
        for (a, b) in points_a.iter().zip(points_b.iter()) {
            assert_eq!(a.hull_distance, b.hull_distance);
        }
    }

    fn ternary_set() -> Vec<PhasePoint> {
        vec![
            point(&[1.0, 0.0, 0.0], 0.0, "A"),
            point(&[0.0, 1.0, 0.0], 0.0, "B"),
            point(&[0.0, 0.0, 1.0], 0.0, "C"),
            point(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], -1.0, "ABC"),
            point(&[0.25, 0.25, 0.5], -0.3, "ABC2-metastable"),
        ]
    }

    #[test]
    fn test_ternary_hull() {
        let mut points = ternary_set();
        let hull = build(&mut points, 3).unwrap();

        // 三个角 + 深的三元相在凸包上
        assert_eq!(hull.members, vec![0, 1, 2, 3]);
        assert_eq!(hull.facets.len(), 3);

        // (0.25, 0.25, 0.5) 位于 C 与 ABC 的连接线上：插值 0.75 * -1.0
        assert!((points[4].hull_distance - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_probe_matches_direct() {
        let mut points = binary_set();
        let hull = build(&mut points, 2).unwrap();

        for p in &points {
            let probed =
                probe_distance(&points, &hull.facets, 2, &p.composition, p.formation_energy)
                    .unwrap();
            assert!(
                (probed - p.hull_distance).abs() < 1e-3,
                "probe {} direct {} for {}",
                probed,
                p.hull_distance,
                p.source
            );
        }
    }

    #[test]
    fn test_probe_below_hull_is_negative() {
        let mut points = binary_set();
        let hull = build(&mut points, 2).unwrap();

        let d = probe_distance(&points, &hull.facets, 2, &[0.5, 0.5], -1.0).unwrap();
        assert!((d - (-0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_probe_invalid_composition() {
        let mut points = binary_set();
        let hull = build(&mut points, 2).unwrap();

        assert!(probe_distance(&points, &hull.facets, 2, &[0.5, 0.6], -1.0).is_err());
        assert!(probe_distance(&points, &hull.facets, 2, &[0.5], -1.0).is_err());
    }
}
