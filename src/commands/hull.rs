//! # hull 命令执行逻辑
//!
//! 批量解析结构文件，构建形成能凸包，输出稳定性排名、
//! CSV、二元体系凸包图，以及可选的外部探测点距离。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `batch/` 收集与解析，`hull/` 做计算
//! - 使用 `tabled` 显示排名，`plotters` 绘图

use crate::batch::{FileCollector, ParseRunner};
use crate::cli::hull::HullArgs;
use crate::error::{QonvexError, Result};
use crate::hull::{PhasePoint, QueryHull};
use crate::models::StructureRecord;
use crate::utils::{output, progress};

use std::collections::BTreeMap;
use std::path::Path;
use tabled::{Table, Tabled};

/// 排名表格行
#[derive(Debug, Clone, Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Structure")]
    structure: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "E_f (eV/atom)")]
    formation_energy: String,
    #[tabled(rename = "Hull dist (eV/atom)")]
    hull_distance: String,
    #[tabled(rename = "Stable")]
    stable: String,
}

/// 执行 hull 命令
pub fn execute(args: HullArgs) -> Result<()> {
    output::print_header("Convex Hull Analysis");

    let records = collect_and_parse(
        &args.input,
        &args.pattern,
        args.recursive,
        args.jobs,
    )?;

    let chempots: BTreeMap<String, f64> = args.chempot.iter().cloned().collect();
    let spinner = progress::create_spinner("Building convex hull");
    let query = QueryHull::build(&records, &args.elements, &chempots);
    spinner.finish_and_clear();
    let query = query?;
    report_build(&query, records.len());

    // 按凸包距离排名
    let mut ranked: Vec<&PhasePoint> = query.points().iter().collect();
    ranked.sort_by(|a, b| {
        a.hull_distance
            .partial_cmp(&b.hull_distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let formulas: BTreeMap<&str, String> = records
        .iter()
        .map(|r| (r.source.as_str(), r.formula()))
        .collect();

    let table_rows: Vec<RankRow> = ranked
        .iter()
        .take(args.top_n)
        .enumerate()
        .map(|(i, p)| RankRow {
            rank: i + 1,
            structure: p.source.clone(),
            formula: formulas.get(p.source.as_str()).cloned().unwrap_or_default(),
            formation_energy: format!("{:.6}", p.formation_energy),
            hull_distance: format!("{:.6}", p.hull_distance),
            stable: if p.hull_distance == 0.0 { "yes" } else { "" }.to_string(),
        })
        .collect();

    output::print_header(&format!(
        "Top {} Structures by Hull Distance",
        args.top_n.min(ranked.len())
    ));
    let table = Table::new(&table_rows);
    println!("{}", table);

    save_distances_csv(&ranked, &formulas, &args.output_csv)?;
    output::print_success(&format!(
        "Full ranking saved to '{}'",
        args.output_csv.display()
    ));

    if !args.no_plot {
        if query.basis().len() == 2 {
            plot_binary_hull(&query, &args.output_plot)?;
            output::print_success(&format!(
                "Hull plot saved to '{}'",
                args.output_plot.display()
            ));
        } else {
            output::print_info("Hull plot skipped (only supported for binary systems)");
        }
    }

    if let Some(ref probe_csv) = args.probe_csv {
        run_probes(&query, probe_csv, &args.probe_output)?;
    }

    Ok(())
}

/// 收集并并行解析结构文件（hull 与 voltage 共用）
pub fn collect_and_parse(
    input: &Path,
    pattern: &str,
    recursive: bool,
    jobs: usize,
) -> Result<Vec<StructureRecord>> {
    if !input.exists() {
        return Err(QonvexError::DirectoryNotFound {
            path: input.display().to_string(),
        });
    }

    let collector = FileCollector::new(input.to_path_buf())
        .with_pattern(pattern)
        .recursive(recursive);
    if collector.is_directory() {
        output::print_info(&format!("Batch mode: directory '{}'", input.display()));
    } else {
        output::print_info(&format!("Single file mode: '{}'", input.display()));
    }
    let files = collector.collect();

    if files.is_empty() {
        return Err(QonvexError::NoFilesFound {
            pattern: pattern.to_string(),
        });
    }
    output::print_info(&format!("Found {} structure files", files.len()));

    let outcome = ParseRunner::new(jobs).parse_all(&files);
    if !outcome.failures.is_empty() {
        output::print_warning(&format!(
            "{} files failed to parse",
            outcome.failures.len()
        ));
        for (path, reason) in outcome.failures.iter().take(5) {
            output::print_warning(&format!("  {}: {}", path, reason));
        }
    }
    output::print_info(&format!("Parsed {} structures", outcome.records.len()));

    Ok(outcome.records)
}

/// 报告过滤与构建统计
fn report_build(query: &QueryHull, total: usize) {
    output::print_info(&format!(
        "Element basis: [{}]",
        query.basis().elements().join(", ")
    ));
    if query.excluded > 0 {
        output::print_info(&format!(
            "{} of {} structures excluded (elements outside the basis)",
            query.excluded, total
        ));
    }
    if query.failed > 0 {
        output::print_warning(&format!(
            "{} structures skipped (malformed composition)",
            query.failed
        ));
    }
    output::print_info(&format!(
        "{} phases on the hull out of {} considered",
        query.hull_members().len(),
        query.points().len()
    ));
}

/// 保存完整距离排名到 CSV
fn save_distances_csv(
    ranked: &[&PhasePoint],
    formulas: &BTreeMap<&str, String>,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(QonvexError::CsvError)?;

    wtr.write_record([
        "rank",
        "structure",
        "formula",
        "formation_energy_ev",
        "hull_distance_ev",
        "on_hull",
    ])
    .map_err(QonvexError::CsvError)?;

    for (i, p) in ranked.iter().enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            p.source.clone(),
            formulas.get(p.source.as_str()).cloned().unwrap_or_default(),
            format!("{:.10}", p.formation_energy),
            format!("{:.10}", p.hull_distance),
            (p.hull_distance == 0.0).to_string(),
        ])
        .map_err(QonvexError::CsvError)?;
    }

    wtr.flush().map_err(|e| QonvexError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 绘制二元凸包：散点 + 凸包折线
fn plot_binary_hull(query: &QueryHull, output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let scatter: Vec<(f64, f64)> = query
        .points()
        .iter()
        .map(|p| (p.composition[0], p.formation_energy))
        .collect();

    let mut hull_line: Vec<(f64, f64)> = query
        .hull_members()
        .iter()
        .map(|p| (p.composition[0], p.formation_energy))
        .collect();
    hull_line.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let y_min = scatter.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let y_max = scatter
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_margin = ((y_max - y_min).abs() * 0.1).max(0.01);

    let elements = query.basis().elements();
    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| QonvexError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{}-{} Formation Energy Hull", elements[0], elements[1]),
            ("sans-serif", 24),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.05..1.05, (y_min - y_margin)..(y_max + y_margin))
        .map_err(|e| QonvexError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc(format!("x in {}(x){}(1-x)", elements[0], elements[1]))
        .y_desc("Formation energy (eV/atom)")
        .draw()
        .map_err(|e| QonvexError::Other(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(hull_line.iter().copied(), BLUE.stroke_width(2)))
        .map_err(|e| QonvexError::Other(e.to_string()))?
        .label("Hull")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(
            scatter
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 4, RED.filled())),
        )
        .map_err(|e| QonvexError::Other(e.to_string()))?
        .label("Structures")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| QonvexError::Other(e.to_string()))?;

    root.present().map_err(|e| QonvexError::Other(e.to_string()))?;
    Ok(())
}

/// 读取探测点 CSV，计算距离并输出
///
/// 输入列：每个基元素一列（分数组成）+ `formation_energy`。
fn run_probes(query: &QueryHull, probe_csv: &Path, output_path: &Path) -> Result<()> {
    let mut rdr = csv::Reader::from_path(probe_csv).map_err(QonvexError::CsvError)?;

    let headers = rdr.headers().map_err(QonvexError::CsvError)?.clone();
    let elements = query.basis().elements();

    // 表头 → 基元素列号映射
    let mut element_cols = Vec::with_capacity(elements.len());
    for element in elements {
        let col = headers
            .iter()
            .position(|h| h.trim() == element)
            .ok_or_else(|| {
                QonvexError::InvalidArgument(format!(
                    "Probe CSV is missing a '{}' column",
                    element
                ))
            })?;
        element_cols.push(col);
    }
    let energy_col = headers
        .iter()
        .position(|h| h.trim() == "formation_energy")
        .ok_or_else(|| {
            QonvexError::InvalidArgument(
                "Probe CSV is missing a 'formation_energy' column".to_string(),
            )
        })?;

    let mut probes = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(QonvexError::CsvError)?;
        let mut composition = Vec::with_capacity(element_cols.len());
        for &col in &element_cols {
            let value: f64 = record
                .get(col)
                .unwrap_or("")
                .trim()
                .parse()
                .map_err(|_| {
                    QonvexError::InvalidArgument(format!(
                        "Invalid composition value in probe CSV row {:?}",
                        record
                    ))
                })?;
            composition.push(value);
        }
        let energy: f64 = record
            .get(energy_col)
            .unwrap_or("")
            .trim()
            .parse()
            .map_err(|_| {
                QonvexError::InvalidArgument(format!(
                    "Invalid formation energy in probe CSV row {:?}",
                    record
                ))
            })?;
        probes.push((composition, energy));
    }

    output::print_info(&format!("Evaluating {} probe compositions", probes.len()));
    let distances = query.probe_distances(&probes);

    let mut wtr = csv::Writer::from_path(output_path).map_err(QonvexError::CsvError)?;
    let mut header: Vec<String> = elements.to_vec();
    header.push("formation_energy".to_string());
    header.push("hull_distance_ev".to_string());
    wtr.write_record(&header).map_err(QonvexError::CsvError)?;

    let mut errors = 0;
    for ((composition, energy), distance) in probes.iter().zip(distances.iter()) {
        let mut row: Vec<String> = composition.iter().map(|x| format!("{:.6}", x)).collect();
        row.push(format!("{:.10}", energy));
        match distance {
            Ok(d) => row.push(format!("{:.10}", d)),
            Err(e) => {
                errors += 1;
                output::print_warning(&format!("Probe skipped: {}", e));
                row.push(String::new());
            }
        }
        wtr.write_record(&row).map_err(QonvexError::CsvError)?;
    }

    wtr.flush().map_err(|e| QonvexError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    if errors > 0 {
        output::print_warning(&format!("{} probes could not be evaluated", errors));
    }
    output::print_success(&format!(
        "Probe distances saved to '{}'",
        output_path.display()
    ));

    Ok(())
}
