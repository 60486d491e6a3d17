//! # 统一错误处理模块
//!
//! 定义 Qonvex 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// Qonvex 统一错误类型
#[derive(Error, Debug)]
pub enum QonvexError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 凸包 / 热力学错误
    // ─────────────────────────────────────────────────────────────
    #[error("No reference energy for element '{element}': no pure {element} structure in the input and no chemical potential supplied")]
    MissingEndMember { element: String },

    #[error("No admissible structures remain after element filtering; cannot build hull")]
    EmptyHull,

    #[error("Input compositions are degenerate: the hull is undefined in {expected} independent composition directions")]
    DegenerateComposition { expected: usize },

    #[error("Unknown element symbol: {symbol}")]
    UnknownElement { symbol: String },

    #[error("Internal consistency failure in hull geometry: {0}")]
    InternalConsistency(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, QonvexError>;
