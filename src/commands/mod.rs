//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `hull/`, `utils/`
//! - 子模块: hull, voltage

pub mod hull;
pub mod voltage;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Hull(args) => hull::execute(args),
        Commands::Voltage(args) => voltage::execute(args),
    }
}
