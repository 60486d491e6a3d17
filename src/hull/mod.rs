//! # 凸包分析模块
//!
//! 实现形成能凸包构建与电压曲线推导的核心算法。
//!
//! ## 子模块
//! - `composition`: 元素基与分数组成坐标
//! - `phase`: 相点构建（形成能归一化）
//! - `engine`: 下凸包构建与凸包距离计算
//! - `voltage`: 电压曲线推导（二元 / 三元路径搜索）
//! - `query`: 查询门面，对外统一入口
//!
//! ## 数据流
//! ```text
//! StructureRecord → composition → phase → engine → voltage
//!                                    └────── query (编排) ──────┘
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/structure.rs`, `utils/elements.rs`

pub mod composition;
pub mod engine;
pub mod phase;
pub mod query;
pub mod voltage;

pub use composition::ElementBasis;
pub use engine::{Facet, Hull};
pub use phase::PhasePoint;
pub use query::QueryHull;
pub use voltage::{VoltageCurve, VoltageStep};

/// 组成坐标容差
pub const COMP_TOL: f64 = 1e-6;

/// 能量 / 几何容差 (eV)：距支撑面小于该值视为在凸包上
pub const HULL_TOL: f64 = 1e-9;
