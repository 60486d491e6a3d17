//! # 电压曲线推导
//!
//! 从形成能凸包推导平均嵌入电压的阶梯曲线。
//!
//! ## 物理模型
//! 每个凸包单纯形面对应一个多相共存区，区内活性元素
//! 化学势恒定，电压 V = -μ_active（以活性金属为参考）。
//! - 二元：对相邻凸包点做每宿主原子坐标下的差分
//! - 三元：解面顶点的 3×3 化学势方程组（Cramer 法则）
//!
//! ## 路径搜索（三元）
//! 从宿主边上的稳定二元化合物出发，沿组成空间中指向
//! 纯活性角的直线前进，依次穿过凸包面。每个被穿过的面
//! 产生一个电压台阶；包含纯活性顶点的面是终端面，
//! 电压为零（与活性金属共存）。
//!
//! ## 曲线数组约定
//! 容量 = [0, q₁, …, qₙ, NaN]，电压 = [v₁, v₁, …, vₙ, 0]。
//! 终端台阶容量为 NaN、电压为 0，表示活性金属共存区。
//!
//! ## 依赖关系
//! - 被 `hull/query.rs`, `commands/voltage.rs` 使用
//! - 使用 `hull/engine.rs`, `hull/phase.rs`, `utils/elements.rs`

use crate::error::{QonvexError, Result};
use crate::hull::composition::ElementBasis;
use crate::hull::engine::Hull;
use crate::hull::phase::PhasePoint;
use crate::hull::COMP_TOL;
use crate::utils::elements::{molar_mass, FARADAY};

/// 电压相同视为同一台阶的合并容差 (V)
const VOLTAGE_MERGE_TOL: f64 = 1e-9;

/// 电压台阶：一个多相共存区
#[derive(Debug, Clone)]
pub struct VoltageStep {
    /// 区间起点（每宿主原子的活性原子数）
    pub x_start: f64,

    /// 区间终点；终端台阶为无穷
    pub x_end: f64,

    /// 平台电压 (V)
    pub voltage: f64,

    /// 区间终点处的累计重量容量 (mAh/g)；终端台阶为 NaN
    pub capacity: f64,

    /// 共存相的来源标识
    pub phases: Vec<String>,
}

/// 一条完整的阶梯电压曲线
#[derive(Debug, Clone)]
pub struct VoltageCurve {
    /// 起始化合物的来源标识
    pub start: String,

    /// 电压台阶（活性含量递增，最后一个为终端台阶）
    pub steps: Vec<VoltageStep>,
}

impl VoltageCurve {
    /// 导出绘图 / 导出用的 (容量, 电压) 数组对
    ///
    /// 容量以 0 开头、NaN 结尾；电压首元素重复第一个平台、
    /// 以 0 结尾。两个数组等长。
    pub fn profile(&self) -> (Vec<f64>, Vec<f64>) {
        let first_voltage = self.steps.first().map(|s| s.voltage).unwrap_or(0.0);
        let mut capacities = vec![0.0];
        let mut voltages = vec![first_voltage];
        for step in &self.steps {
            capacities.push(step.capacity);
            voltages.push(step.voltage);
        }
        (capacities, voltages)
    }

    /// 最大可逆容量 (mAh/g)：最后一个非终端台阶的终点容量
    pub fn max_capacity(&self) -> f64 {
        self.steps
            .iter()
            .rev()
            .find(|s| s.capacity.is_finite())
            .map(|s| s.capacity)
            .unwrap_or(0.0)
    }
}

/// 组成处的重量容量 (mAh/g)：活性原子数 × 法拉第常数 / 宿主质量
fn gravimetric_capacity(
    composition: &[f64],
    basis: &ElementBasis,
    active_idx: usize,
) -> Result<f64> {
    let mut host_mass = 0.0;
    for (i, element) in basis.elements().iter().enumerate() {
        if i == active_idx {
            continue;
        }
        host_mass += composition[i] * molar_mass(element)?;
    }
    if host_mass <= 0.0 {
        return Err(QonvexError::InvalidArgument(
            "Capacity undefined for a composition without host atoms".to_string(),
        ));
    }
    // 3.6 换算 C/mol → mAh/g
    Ok(composition[active_idx] * FARADAY / (3.6 * host_mass))
}

/// 每宿主原子的活性原子数
fn active_per_host(c_active: f64) -> f64 {
    if c_active >= 1.0 - COMP_TOL {
        f64::INFINITY
    } else {
        c_active / (1.0 - c_active)
    }
}

/// 合并电压相同的相邻台阶
fn merge_equal_steps(steps: Vec<VoltageStep>) -> Vec<VoltageStep> {
    let mut merged: Vec<VoltageStep> = Vec::new();
    for step in steps {
        if let Some(last) = merged.last_mut() {
            if (last.voltage - step.voltage).abs() < VOLTAGE_MERGE_TOL {
                last.x_end = step.x_end;
                last.capacity = step.capacity;
                for phase in step.phases {
                    if !last.phases.contains(&phase) {
                        last.phases.push(phase);
                    }
                }
                continue;
            }
        }
        merged.push(step);
    }
    merged
}

/// 二元体系电压曲线
///
/// 沿凸包按活性含量递增遍历相邻凸包点对，每一对构成
/// 一个两相共存台阶。
pub fn binary_curve(
    points: &[PhasePoint],
    hull: &Hull,
    basis: &ElementBasis,
    active: &str,
) -> Result<VoltageCurve> {
    let active_idx = basis.index_of(active).ok_or_else(|| {
        QonvexError::InvalidArgument(format!(
            "Active element '{}' is not in the hull's element basis",
            active
        ))
    })?;

    // 凸包成员按活性分数升序；纯活性端元单独记下
    let mut compounds: Vec<usize> = Vec::new();
    let mut active_member: Option<usize> = None;
    for &i in &hull.members {
        if points[i].composition[active_idx] >= 1.0 - COMP_TOL {
            active_member = Some(i);
        } else {
            compounds.push(i);
        }
    }
    compounds.sort_by(|&a, &b| {
        points[a].composition[active_idx]
            .partial_cmp(&points[b].composition[active_idx])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if compounds.is_empty() {
        return Err(QonvexError::EmptyHull);
    }

    let start_name = points[compounds[0]].source.clone();
    let mut steps = Vec::new();

    for pair in compounds.windows(2) {
        let (i, j) = (pair[0], pair[1]);
        let (ci, cj) = (
            points[i].composition[active_idx],
            points[j].composition[active_idx],
        );
        let (xi, xj) = (active_per_host(ci), active_per_host(cj));

        // 每宿主原子形成能的差分给出 -μ_active
        let ei = points[i].formation_energy / (1.0 - ci);
        let ej = points[j].formation_energy / (1.0 - cj);
        let voltage = -(ej - ei) / (xj - xi);

        steps.push(VoltageStep {
            x_start: xi,
            x_end: xj,
            voltage,
            capacity: gravimetric_capacity(&points[j].composition, basis, active_idx)?,
            phases: vec![points[i].source.clone(), points[j].source.clone()],
        });
    }

    // 终端台阶：最富活性的化合物与活性金属共存，电压为零
    let last = *compounds.last().unwrap_or(&compounds[0]);
    let mut terminal_phases = vec![points[last].source.clone()];
    if let Some(m) = active_member {
        terminal_phases.push(points[m].source.clone());
    }
    steps.push(VoltageStep {
        x_start: active_per_host(points[last].composition[active_idx]),
        x_end: f64::INFINITY,
        voltage: 0.0,
        capacity: f64::NAN,
        phases: terminal_phases,
    });

    Ok(VoltageCurve {
        start: start_name,
        steps: merge_equal_steps(steps),
    })
}

/// 三元体系电压曲线
///
/// 每个宿主边上的稳定二元化合物产生一条候选路径。
/// `all_pathways` 为假时只取形成能最低的起点。
/// 返回成功的曲线与按起点隔离的失败描述。
pub fn ternary_curves(
    points: &[PhasePoint],
    hull: &Hull,
    basis: &ElementBasis,
    active: &str,
    all_pathways: bool,
) -> Result<(Vec<VoltageCurve>, Vec<String>)> {
    let active_idx = basis.index_of(active).ok_or_else(|| {
        QonvexError::InvalidArgument(format!(
            "Active element '{}' is not in the hull's element basis",
            active
        ))
    })?;

    let host_indices: Vec<usize> = (0..basis.len()).filter(|&i| i != active_idx).collect();

    // 起点：宿主边上同时含两种宿主元素的凸包成员
    let mut starts: Vec<usize> = hull
        .members
        .iter()
        .copied()
        .filter(|&i| {
            let c = &points[i].composition;
            c[active_idx] < COMP_TOL
                && host_indices.iter().all(|&h| c[h] > COMP_TOL)
        })
        .collect();
    if starts.is_empty() {
        return Err(QonvexError::InvalidArgument(format!(
            "No stable binary compounds on the {}-{} edge to start from",
            basis.elements()[host_indices[0]],
            basis.elements()[host_indices[1]]
        )));
    }

    // 按第一宿主元素分数降序，保证确定性的路径顺序
    starts.sort_by(|&a, &b| {
        points[b].composition[host_indices[0]]
            .partial_cmp(&points[a].composition[host_indices[0]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if !all_pathways {
        let best = starts
            .iter()
            .copied()
            .min_by(|&a, &b| {
                points[a]
                    .formation_energy
                    .partial_cmp(&points[b].formation_energy)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(starts[0]);
        starts = vec![best];
    }

    let mut curves = Vec::new();
    let mut failures = Vec::new();

    for &start in &starts {
        match trace_pathway(points, hull, basis, active_idx, start) {
            Ok(curve) => curves.push(curve),
            Err(e) => failures.push(format!("{}: {}", points[start].source, e)),
        }
    }

    Ok((curves, failures))
}

/// 追踪一条起点 → 纯活性角的路径
fn trace_pathway(
    points: &[PhasePoint],
    hull: &Hull,
    basis: &ElementBasis,
    active_idx: usize,
    start: usize,
) -> Result<VoltageCurve> {
    let s = &points[start].composition;
    let mut a = vec![0.0; basis.len()];
    a[active_idx] = 1.0;

    let p0 = (s[0], s[1]);
    let p1 = (a[0], a[1]);

    // 路径被每个面裁出的参数区间
    let mut intervals: Vec<(f64, f64, usize)> = Vec::new();
    for (fi, facet) in hull.facets.iter().enumerate() {
        let tri = [
            (
                points[facet.vertices[0]].composition[0],
                points[facet.vertices[0]].composition[1],
            ),
            (
                points[facet.vertices[1]].composition[0],
                points[facet.vertices[1]].composition[1],
            ),
            (
                points[facet.vertices[2]].composition[0],
                points[facet.vertices[2]].composition[1],
            ),
        ];
        if let Some((t_in, t_out)) = clip_to_triangle(p0, p1, &tri) {
            if t_out - t_in > 1e-9 {
                intervals.push((t_in, t_out, fi));
            }
        }
    }

    intervals.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut steps = Vec::new();
    let mut cursor = 0.0_f64;
    let mut reached_terminal = false;

    for (t_in, t_out, fi) in intervals {
        if t_out <= cursor + 1e-9 {
            continue;
        }
        if t_in > cursor + 1e-6 {
            return Err(QonvexError::InternalConsistency(format!(
                "Pathway leaves hull coverage at t = {cursor:.6}"
            )));
        }

        let facet = &hull.facets[fi];
        let phases: Vec<String> = facet
            .vertices
            .iter()
            .map(|&v| points[v].source.clone())
            .collect();

        let is_terminal = facet
            .vertices
            .iter()
            .any(|&v| points[v].composition[active_idx] >= 1.0 - COMP_TOL);

        let c_in = path_composition(s, &a, cursor);
        let x_start = active_per_host(c_in[active_idx]);

        if is_terminal {
            steps.push(VoltageStep {
                x_start,
                x_end: f64::INFINITY,
                voltage: 0.0,
                capacity: f64::NAN,
                phases,
            });
            reached_terminal = true;
            break;
        }

        let voltage = facet_voltage(points, &facet.vertices, active_idx)?;
        let c_out = path_composition(s, &a, t_out);

        steps.push(VoltageStep {
            x_start,
            x_end: active_per_host(c_out[active_idx]),
            voltage,
            capacity: gravimetric_capacity(&c_out, basis, active_idx)?,
            phases,
        });
        cursor = t_out;
    }

    if !reached_terminal {
        return Err(QonvexError::InternalConsistency(format!(
            "Pathway from '{}' never reached the pure {} corner",
            points[start].source,
            basis.elements()[active_idx]
        )));
    }

    Ok(VoltageCurve {
        start: points[start].source.clone(),
        steps: merge_equal_steps(steps),
    })
}

/// 路径参数 t 处的完整组成
fn path_composition(s: &[f64], a: &[f64], t: f64) -> Vec<f64> {
    s.iter()
        .zip(a.iter())
        .map(|(si, ai)| (1.0 - t) * si + t * ai)
        .collect()
}

/// 面的平台电压：解 C·μ = e 后取 V = -μ_active
///
/// C 的行是三个顶点的组成，e 是顶点形成能。
fn facet_voltage(points: &[PhasePoint], vertices: &[usize], active_idx: usize) -> Result<f64> {
    let rows: Vec<&PhasePoint> = vertices.iter().map(|&v| &points[v]).collect();
    let m = [
        [
            rows[0].composition[0],
            rows[0].composition[1],
            rows[0].composition[2],
        ],
        [
            rows[1].composition[0],
            rows[1].composition[1],
            rows[1].composition[2],
        ],
        [
            rows[2].composition[0],
            rows[2].composition[1],
            rows[2].composition[2],
        ],
    ];
    let e = [
        rows[0].formation_energy,
        rows[1].formation_energy,
        rows[2].formation_energy,
    ];

    let det = det3(&m);
    if det.abs() < 1e-12 {
        return Err(QonvexError::InternalConsistency(
            "Singular composition matrix while solving facet chemical potentials".to_string(),
        ));
    }

    // Cramer 法则：替换活性元素所在列
    let mut replaced = m;
    for (row, &energy) in replaced.iter_mut().zip(e.iter()) {
        row[active_idx] = energy;
    }
    let mu_active = det3(&replaced) / det;

    Ok(-mu_active)
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 线段与三角形的参数区间交（Liang–Barsky 半平面裁剪）
fn clip_to_triangle(
    p0: (f64, f64),
    p1: (f64, f64),
    tri: &[(f64, f64); 3],
) -> Option<(f64, f64)> {
    let area = (tri[1].0 - tri[0].0) * (tri[2].1 - tri[0].1)
        - (tri[1].1 - tri[0].1) * (tri[2].0 - tri[0].0);
    if area.abs() < 1e-12 {
        return None;
    }
    let sign = if area > 0.0 { 1.0 } else { -1.0 };

    let mut t_lo = 0.0_f64;
    let mut t_hi = 1.0_f64;

    for i in 0..3 {
        let (ax, ay) = tri[i];
        let (bx, by) = tri[(i + 1) % 3];
        let inside = |x: f64, y: f64| sign * ((bx - ax) * (y - ay) - (by - ay) * (x - ax));

        let f0 = inside(p0.0, p0.1);
        let f1 = inside(p1.0, p1.1);
        let denom = f1 - f0;

        if denom.abs() < 1e-15 {
            if f0 < -1e-12 {
                return None;
            }
            continue;
        }

        let t = -f0 / denom;
        if denom > 0.0 {
            t_lo = t_lo.max(t);
        } else {
            t_hi = t_hi.min(t);
        }
        if t_lo > t_hi {
            return None;
        }
    }

    Some((t_lo, t_hi))
}
