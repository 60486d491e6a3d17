//! # voltage 命令执行逻辑
//!
//! 在凸包之上推导电压曲线，输出平台表格、CSV 与阶梯图。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 复用 `commands/hull.rs` 的文件收集与解析
//! - 使用 `hull/` 做计算，`tabled` 显示，`plotters` 绘图

use crate::cli::voltage::VoltageArgs;
use crate::commands::hull::collect_and_parse;
use crate::error::{QonvexError, Result};
use crate::hull::{QueryHull, VoltageCurve};
use crate::utils::output;

use std::collections::BTreeMap;
use std::path::Path;
use tabled::{Table, Tabled};

/// 电压平台表格行
#[derive(Debug, Clone, Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "x range")]
    x_range: String,
    #[tabled(rename = "Voltage (V)")]
    voltage: String,
    #[tabled(rename = "Capacity (mAh/g)")]
    capacity: String,
    #[tabled(rename = "Coexisting phases")]
    phases: String,
}

/// 执行 voltage 命令
pub fn execute(args: VoltageArgs) -> Result<()> {
    output::print_header("Voltage Curve Analysis");

    let records = collect_and_parse(
        &args.input,
        &args.pattern,
        args.recursive,
        args.jobs,
    )?;

    let chempots: BTreeMap<String, f64> = args.chempot.iter().cloned().collect();
    let query = QueryHull::build(&records, &args.elements, &chempots)?;

    output::print_info(&format!(
        "Element basis: [{}], active element: {}",
        query.basis().elements().join(", "),
        args.active
    ));

    let (curves, failures) = query.voltage_curves(&args.active, args.pathways)?;
    for failure in &failures {
        output::print_warning(&format!("Pathway failed: {}", failure));
    }
    if curves.is_empty() {
        return Err(QonvexError::Other(
            "No voltage pathway could be traced".to_string(),
        ));
    }

    for curve in &curves {
        print_curve(curve);
        output::print_separator();
    }

    save_curves_csv(&curves, &args.output_csv)?;
    output::print_success(&format!(
        "Voltage curves saved to '{}'",
        args.output_csv.display()
    ));

    if !args.no_plot {
        plot_curves(&curves, &args.active, &args.output_plot)?;
        output::print_success(&format!(
            "Voltage plot saved to '{}'",
            args.output_plot.display()
        ));
    }

    Ok(())
}

/// 打印一条曲线的平台表格
fn print_curve(curve: &VoltageCurve) {
    output::print_header(&format!("Pathway from {}", curve.start));

    let rows: Vec<StepRow> = curve
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| StepRow {
            step: i + 1,
            x_range: if step.x_end.is_finite() {
                format!("{:.3} - {:.3}", step.x_start, step.x_end)
            } else {
                format!("{:.3} - ∞", step.x_start)
            },
            voltage: format!("{:.4}", step.voltage),
            capacity: if step.capacity.is_finite() {
                format!("{:.1}", step.capacity)
            } else {
                "-".to_string()
            },
            phases: step.phases.join(" + "),
        })
        .collect();

    let table = Table::new(&rows);
    println!("{}", table);

    output::print_info(&format!(
        "Maximum capacity: {:.1} mAh/g",
        curve.max_capacity()
    ));
}

/// 保存全部曲线的 (容量, 电压) 数组到 CSV
fn save_curves_csv(curves: &[VoltageCurve], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(QonvexError::CsvError)?;

    wtr.write_record(["pathway", "capacity_mah_g", "voltage_v"])
        .map_err(QonvexError::CsvError)?;

    for curve in curves {
        let (capacities, voltages) = curve.profile();
        for (q, v) in capacities.iter().zip(voltages.iter()) {
            wtr.write_record(&[
                curve.start.clone(),
                if q.is_finite() {
                    format!("{:.10}", q)
                } else {
                    String::new()
                },
                format!("{:.10}", v),
            ])
            .map_err(QonvexError::CsvError)?;
        }
    }

    wtr.flush().map_err(|e| QonvexError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 绘制阶梯电压曲线
fn plot_curves(curves: &[VoltageCurve], active: &str, output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    // 每条曲线的阶梯折线点（跳过终端台阶）
    let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for curve in curves {
        let mut pts = Vec::new();
        let mut q_prev = 0.0;
        for step in curve.steps.iter().filter(|s| s.capacity.is_finite()) {
            pts.push((q_prev, step.voltage));
            pts.push((step.capacity, step.voltage));
            q_prev = step.capacity;
        }
        if !pts.is_empty() {
            series.push((curve.start.clone(), pts));
        }
    }

    if series.is_empty() {
        output::print_warning("Nothing to plot: no finite-capacity voltage steps");
        return Ok(());
    }

    let q_max = series
        .iter()
        .flat_map(|(_, pts)| pts.iter().map(|(q, _)| *q))
        .fold(0.0_f64, f64::max);
    let v_max = series
        .iter()
        .flat_map(|(_, pts)| pts.iter().map(|(_, v)| *v))
        .fold(0.0_f64, f64::max);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| QonvexError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Voltage vs {} Capacity", active),
            ("sans-serif", 24),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..(q_max * 1.05), 0.0..(v_max * 1.1))
        .map_err(|e| QonvexError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Gravimetric capacity (mAh/g)")
        .y_desc(format!("Voltage vs {} metal (V)", active))
        .draw()
        .map_err(|e| QonvexError::Other(e.to_string()))?;

    for (i, (label, pts)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(pts.iter().copied(), color.stroke_width(2)))
            .map_err(|e| QonvexError::Other(e.to_string()))?
            .label(label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

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
