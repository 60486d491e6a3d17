//! # 元素摩尔质量数据库
//!
//! 提供标准原子量（g/mol），用于重量比容量换算。
//!
//! ## 数据来源
//! IUPAC Standard Atomic Weights (2021 abridged)
//! https://iupac.org/what-we-do/periodic-table-of-elements/
//!
//! ## 依赖关系
//! - 被 `hull/voltage.rs` 调用换算容量
//! - 纯静态数据，无外部依赖

use crate::error::{QonvexError, Result};
use std::collections::HashMap;
use std::sync::LazyLock;

/// 法拉第常数 (C/mol)
pub const FARADAY: f64 = 96485.33212;

/// 摩尔质量数据库 (g/mol)
pub static MOLAR_MASSES: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("H", 1.008);
    m.insert("He", 4.0026);
    m.insert("Li", 6.94);
    m.insert("Be", 9.0122);
    m.insert("B", 10.81);
    m.insert("C", 12.011);
    m.insert("N", 14.007);
    m.insert("O", 15.999);
    m.insert("F", 18.998);
    m.insert("Ne", 20.180);
    m.insert("Na", 22.990);
    m.insert("Mg", 24.305);
    m.insert("Al", 26.982);
    m.insert("Si", 28.085);
    m.insert("P", 30.974);
    m.insert("S", 32.06);
    m.insert("Cl", 35.45);
    m.insert("Ar", 39.95);
    m.insert("K", 39.098);
    m.insert("Ca", 40.078);
    m.insert("Sc", 44.956);
    m.insert("Ti", 47.867);
    m.insert("V", 50.942);
    m.insert("Cr", 51.996);
    m.insert("Mn", 54.938);
    m.insert("Fe", 55.845);
    m.insert("Co", 58.933);
    m.insert("Ni", 58.693);
    m.insert("Cu", 63.546);
    m.insert("Zn", 65.38);
    m.insert("Ga", 69.723);
    m.insert("Ge", 72.630);
    m.insert("As", 74.922);
    m.insert("Se", 78.971);
    m.insert("Br", 79.904);
    m.insert("Kr", 83.798);
    m.insert("Rb", 85.468);
    m.insert("Sr", 87.62);
    m.insert("Y", 88.906);
    m.insert("Zr", 91.224);
    m.insert("Nb", 92.906);
    m.insert("Mo", 95.95);
    m.insert("Tc", 97.0);
    m.insert("Ru", 101.07);
    m.insert("Rh", 102.91);
    m.insert("Pd", 106.42);
    m.insert("Ag", 107.87);
    m.insert("Cd", 112.41);
    m.insert("In", 114.82);
    m.insert("Sn", 118.71);
    m.insert("Sb", 121.76);
    m.insert("Te", 127.60);
    m.insert("I", 126.90);
    m.insert("Xe", 131.29);
    m.insert("Cs", 132.91);
    m.insert("Ba", 137.33);
    m.insert("La", 138.91);
    m.insert("Ce", 140.12);
    m.insert("Pr", 140.91);
    m.insert("Nd", 144.24);
    m.insert("Pm", 145.0);
    m.insert("Sm", 150.36);
    m.insert("Eu", 151.96);
    m.insert("Gd", 157.25);
    m.insert("Tb", 158.93);
    m.insert("Dy", 162.50);
    m.insert("Ho", 164.93);
    m.insert("Er", 167.26);
    m.insert("Tm", 168.93);
    m.insert("Yb", 173.05);
    m.insert("Lu", 174.97);
    m.insert("Hf", 178.49);
    m.insert("Ta", 180.95);
    m.insert("W", 183.84);
    m.insert("Re", 186.21);
    m.insert("Os", 190.23);
    m.insert("Ir", 192.22);
    m.insert("Pt", 195.08);
    m.insert("Au", 196.97);
    m.insert("Hg", 200.59);
    m.insert("Tl", 204.38);
    m.insert("Pb", 207.2);
    m.insert("Bi", 208.98);
    m.insert("Th", 232.04);
    m.insert("U", 238.03);

    m
});

/// 查询元素摩尔质量
pub fn molar_mass(symbol: &str) -> Result<f64> {
    MOLAR_MASSES
        .get(symbol)
        .copied()
        .ok_or_else(|| QonvexError::UnknownElement {
            symbol: symbol.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_molar_mass_known() {
        assert!((molar_mass("Li").unwrap() - 6.94).abs() < 1e-6);
        assert!((molar_mass("Sn").unwrap() - 118.71).abs() < 1e-6);
    }

    #[test]
    fn test_molar_mass_unknown() {
        assert!(molar_mass("Xx").is_err());
    }
}
