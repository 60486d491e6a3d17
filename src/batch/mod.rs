//! # 批量处理模块
//!
//! 提供结构文件的批量收集与并行解析能力。
//!
//! ## 功能
//! - 自动检测输入类型（文件/目录）
//! - glob 模式收集匹配文件
//! - rayon 并行解析
//! - 进度反馈与失败统计
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{ParseOutcome, ParseRunner};
