//! # 数据模型模块
//!
//! 定义统一的结构记录数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `hull/` 使用
//! - 子模块: structure

pub mod structure;

pub use structure::StructureRecord;
