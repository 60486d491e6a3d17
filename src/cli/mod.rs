//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `hull`: 形成能凸包构建与稳定性排名
//! - `voltage`: 电压曲线推导
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: hull, voltage

pub mod hull;
pub mod voltage;

use clap::{Parser, Subcommand};

/// Qonvex - 凸包稳定性与电压曲线分析工具
#[derive(Parser)]
#[command(name = "qonvex")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Convex hull stability and battery voltage analysis for crystal structure prediction", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Build the formation-energy convex hull and rank structures by stability
    Hull(hull::HullArgs),

    /// Derive voltage curves against an active (shuttle) element
    Voltage(voltage::VoltageArgs),
}

/// 解析化学势参数（格式 `Element=energy`，能量为 eV/atom）
pub fn parse_chemical_potential(input: &str) -> Result<(String, f64), String> {
    let (element, energy) = input
        .split_once('=')
        .ok_or_else(|| format!("Expected 'Element=energy', got '{}'", input))?;

    let element = element.trim();
    if element.is_empty() {
        return Err(format!("Missing element symbol in '{}'", input));
    }

    let energy: f64 = energy
        .trim()
        .parse()
        .map_err(|_| format!("Invalid energy value in '{}'", input))?;

    Ok((element.to_string(), energy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chemical_potential() {
        assert_eq!(
            parse_chemical_potential("Li=-190.0355").unwrap(),
            ("Li".to_string(), -190.0355)
        );
        assert_eq!(
            parse_chemical_potential(" Sn = -95.532 ").unwrap(),
            ("Sn".to_string(), -95.532)
        );
        assert!(parse_chemical_potential("Li").is_err());
        assert!(parse_chemical_potential("=1.0").is_err());
        assert!(parse_chemical_potential("Li=abc").is_err());
    }
}
