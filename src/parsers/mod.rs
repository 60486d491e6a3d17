//! # 解析器模块
//!
//! 将结构文件解析为凸包计算所需的组成 + 能量记录。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: res

pub mod res;

use crate::error::{QonvexError, Result};
use crate::models::StructureRecord;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<StructureRecord> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "res" => res::parse_res_file(path),
        _ => Err(QonvexError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}
