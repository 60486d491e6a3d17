//! # Qonvex - 凸包稳定性与电压曲线分析工具
//!
//! 面向晶体结构预测（AIRSS 等）产出的批量 DFT 结果：
//! 构建形成能凸包、排名稳定性、推导嵌入电压曲线。
//!
//! ## 子命令
//! - `hull`    - 凸包构建、稳定性排名、探测点距离
//! - `voltage` - 电压曲线推导（二元 / 三元路径搜索）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/   (文件收集与并行解析)
//!   │     ├── parsers/ (格式解析器)
//!   │     ├── hull/    (凸包与电压计算)
//!   │     └── models/  (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod hull;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
