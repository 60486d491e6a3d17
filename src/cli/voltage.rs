//! # voltage 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/voltage.rs`

use super::parse_chemical_potential;
use clap::Args;
use std::path::PathBuf;

/// voltage 子命令参数
#[derive(Args, Debug)]
pub struct VoltageArgs {
    /// Input .res file or directory of structure files
    pub input: PathBuf,

    /// Element basis, comma-separated (e.g., 'Li,Sn,S'); 2 or 3 elements
    #[arg(long, short = 'e', value_delimiter = ',', required = true)]
    pub elements: Vec<String>,

    /// Active (shuttle) element, e.g., 'Li'
    #[arg(long, short = 'a', required = true)]
    pub active: String,

    /// Trace every stable host-edge pathway instead of only the lowest one
    #[arg(long, default_value_t = false)]
    pub pathways: bool,

    /// Filename pattern(s) to match, comma-separated
    #[arg(long, default_value = "*.res")]
    pub pattern: String,

    /// Search directories recursively
    #[arg(long, short = 'r', default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = all CPU cores)
    #[arg(long, short = 'j', default_value_t = 0)]
    pub jobs: usize,

    /// Override an elemental reference energy (eV/atom), e.g., 'Li=-190.0355'
    #[arg(long, value_parser = parse_chemical_potential)]
    pub chempot: Vec<(String, f64)>,

    /// Filename for the voltage curve CSV output
    #[arg(long, default_value = "voltage_curves.csv")]
    pub output_csv: PathBuf,

    /// Filename for the voltage curve plot (PNG format)
    #[arg(long, default_value = "voltage.png")]
    pub output_plot: PathBuf,

    /// Skip plot generation
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,
}
