//! # 工具模块
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `hull/` 模块使用
//! - 子模块: output, progress, elements

pub mod elements;
pub mod output;
pub mod progress;
