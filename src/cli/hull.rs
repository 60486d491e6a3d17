//! # hull 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/hull.rs`

use super::parse_chemical_potential;
use clap::Args;
use std::path::PathBuf;

/// hull 子命令参数
#[derive(Args, Debug)]
pub struct HullArgs {
    /// Input .res file or directory of structure files
    pub input: PathBuf,

    /// Element basis, comma-separated (e.g., 'Li,Sn,S'); 2 or 3 elements
    #[arg(long, short = 'e', value_delimiter = ',', required = true)]
    pub elements: Vec<String>,

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

    /// Number of lowest-lying structures to print in the ranking table
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Filename for the hull distance CSV output
    #[arg(long, default_value = "hull_distances.csv")]
    pub output_csv: PathBuf,

    /// Filename for the hull plot (PNG format, binary systems only)
    #[arg(long, default_value = "hull.png")]
    pub output_plot: PathBuf,

    /// Skip plot generation
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// CSV of probe compositions/energies to evaluate against the hull
    #[arg(long)]
    pub probe_csv: Option<PathBuf>,

    /// Filename for the probe distance CSV output
    #[arg(long, default_value = "probe_distances.csv")]
    pub probe_output: PathBuf,
}
