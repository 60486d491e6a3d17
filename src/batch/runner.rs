//! # 并行解析执行器
//!
//! 把收集到的结构文件并行解析为结构记录。
//! 单个文件解析失败不中止整批，失败详情单独收集。
//!
//! ## 依赖关系
//! - 被 `commands/hull.rs`, `commands/voltage.rs` 调用
//! - 使用 `parsers/` 做格式解析
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::models::StructureRecord;
use crate::parsers;
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 批量解析结果
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// 成功解析的结构记录，保持输入文件顺序
    pub records: Vec<StructureRecord>,

    /// 失败详情 (文件路径, 错误信息)
    pub failures: Vec<(String, String)>,
}

/// 并行解析执行器
pub struct ParseRunner {
    /// 并行作业数
    jobs: usize,
}

impl ParseRunner {
    /// 创建新的执行器；jobs 为 0 时使用全部 CPU 核心
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 并行解析文件列表
    pub fn parse_all(&self, files: &[PathBuf]) -> ParseOutcome {
        let pb = progress::create_progress_bar(files.len() as u64, "Parsing");

        // 配置 rayon 线程池
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .unwrap();

        let results: Vec<std::result::Result<StructureRecord, (String, String)>> =
            pool.install(|| {
                files
                    .par_iter()
                    .map(|file| {
                        let result = parsers::parse_structure_file(file)
                            .map_err(|e| (file.display().to_string(), e.to_string()));
                        pb.inc(1);
                        result
                    })
                    .collect()
            });

        pb.finish_and_clear();

        let mut outcome = ParseOutcome::default();
        for result in results {
            match result {
                Ok(record) => outcome.records.push(record),
                Err(failure) => outcome.failures.push(failure),
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_all_isolates_failures() {
        let dir = std::env::temp_dir().join("qonvex-runner-test");
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.res");
        fs::write(
            &good,
            "TITL Fe2-1 0.0 25.0 -50.0 -50.2 0 0 2 (P-1)\nSFAC Fe\nFe 1 0.0 0.0 0.0 1.0\nFe 1 0.5 0.5 0.5 1.0\nEND\n",
        )
        .unwrap();
        let bad = dir.join("bad.res");
        fs::write(&bad, "not a res file\n").unwrap();

        let outcome = ParseRunner::new(1).parse_all(&[good, bad]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.records[0].source, "Fe2-1");

        fs::remove_dir_all(&dir).ok();
    }
}
