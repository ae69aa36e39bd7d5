//! Console report and chart rendering
//!
//! Purely presentational: prints the per-algorithm summary tables and the
//! significance-test outcomes, and renders bar charts of metric means by
//! algorithm. No decision logic lives here.

use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

use crate::config::ChartConfig;
use crate::eval::{mean_rmse_by_algorithm, LongScore, MetricReport, RmseScore};
use crate::stats::{PairwiseComparison, SignificanceReport};

const FONT_SIZE_TITLE: u32 = 20;
const FONT_SIZE_AXIS: u32 = 15;
const PLOT_MARGIN: i32 = 20;
const BAR_COLOR: RGBColor = RGBColor(66, 133, 244);

/// Print mean metric values per algorithm as a fixed-width table.
pub fn print_metric_summary(report: &MetricReport) {
    let means_per_metric: Vec<Vec<(String, f64)>> = report
        .metric_names
        .iter()
        .map(|name| report.mean_by_algorithm(name))
        .collect();

    println!("\n┌─ METRIC MEANS BY ALGORITHM ──────────────────────────────────┐");
    print!("{:25}", "Algorithm");
    for name in &report.metric_names {
        print!(" {:>12}", name);
    }
    println!();
    println!("{}", "─".repeat(26 + 13 * report.metric_names.len()));

    for (row_idx, algorithm) in report.algorithms().iter().enumerate() {
        print!("{:25}", algorithm);
        for means in &means_per_metric {
            // mean_by_algorithm and algorithms() share the same sort order
            let mean = means.get(row_idx).map(|&(_, v)| v).unwrap_or(0.0);
            print!(" {:>12.3}", mean);
        }
        println!();
    }
}

/// Print mean per-user RMSE per algorithm.
pub fn print_rmse_summary(rows: &[RmseScore]) {
    if rows.is_empty() {
        println!("\n  No predictions overlap the ground truth; RMSE skipped");
        return;
    }
    println!("\n┌─ MEAN PER-USER RMSE ─────────────────────────────────────────┐");
    println!("{:25} {:>12} {:>12}", "Algorithm", "RMSE", "Users");
    println!("{}", "─".repeat(52));
    for (algorithm, mean) in mean_rmse_by_algorithm(rows) {
        let users = rows.iter().filter(|r| r.algorithm == algorithm).count();
        println!("{:25} {:>12.3} {:>12}", algorithm, mean, users);
    }
}

/// One console line per pairwise comparison.
pub fn pairwise_line(comparison: &PairwiseComparison) -> String {
    format!(
        "{} vs {}, Statistics={:.3}, p-value={:.3}, {}",
        comparison.first,
        comparison.second,
        comparison.statistic,
        comparison.p_value,
        comparison.decision.text()
    )
}

/// Print the significance-test outcome for one metric.
pub fn print_significance(metric: &str, report: &SignificanceReport, alpha: f64) {
    println!("\n┌─ SIGNIFICANCE: {metric} ─────────────────────────────────────");
    match report {
        SignificanceReport::NotComparable { algorithms } => {
            println!("  {algorithms} algorithm(s) present, nothing to compare");
        }
        SignificanceReport::NoDifference { omnibus } => {
            println!(
                "  Friedman: Statistics={:.3}, p-value={:.3}",
                omnibus.statistic, omnibus.p_value
            );
            println!("  No significant difference detected (p >= {alpha})");
        }
        SignificanceReport::PairwiseBreakdown {
            omnibus,
            adjusted_alpha,
            comparisons,
        } => {
            println!(
                "  Friedman: Statistics={:.3}, p-value={:.3}",
                omnibus.statistic, omnibus.p_value
            );
            println!(
                "  Post-hoc Wilcoxon signed-rank over {} pairs, adjusted alpha={:.4}",
                comparisons.len(),
                adjusted_alpha
            );
            for comparison in comparisons {
                println!("  {}", pairwise_line(comparison));
            }
        }
    }
}

/// Mean value per algorithm for each metric in the long-form table.
///
/// Metrics keep their first-appearance order; algorithms are sorted within
/// each panel.
pub fn panel_means(long: &[LongScore]) -> Vec<(String, Vec<(String, f64)>)> {
    let mut metric_names: Vec<&str> = Vec::new();
    for row in long {
        if !metric_names.contains(&row.metric.as_str()) {
            metric_names.push(&row.metric);
        }
    }

    let mut sums: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
    for row in long {
        let entry = sums
            .entry((row.metric.as_str(), row.algorithm.as_str()))
            .or_default();
        entry.0 += row.value;
        entry.1 += 1;
    }

    metric_names
        .into_iter()
        .map(|metric| {
            let bars: Vec<(String, f64)> = sums
                .iter()
                .filter(|((m, _), _)| *m == metric)
                .map(|((_, alg), &(sum, n))| (alg.to_string(), sum / n as f64))
                .collect();
            (metric.to_string(), bars)
        })
        .collect()
}

/// Render mean metric value by algorithm, one panel per metric, from the
/// long-form score table.
pub fn render_metric_chart(
    path: &Path,
    long: &[LongScore],
    config: &ChartConfig,
) -> Result<(), Box<dyn Error>> {
    let panels_data = panel_means(long);
    if panels_data.is_empty() {
        return Ok(());
    }

    let root =
        BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((1, panels_data.len()));
    for (panel, (metric, bars)) in panels.iter().zip(&panels_data) {
        draw_bar_panel(panel, metric, bars)?;
    }
    root.present()?;
    Ok(())
}

/// Render mean per-user RMSE by algorithm.
pub fn render_rmse_chart(
    path: &Path,
    rows: &[RmseScore],
    config: &ChartConfig,
) -> Result<(), Box<dyn Error>> {
    let bars = mean_rmse_by_algorithm(rows);
    if bars.is_empty() {
        return Ok(());
    }

    let root =
        BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;
    draw_bar_panel(&root, "rmse", &bars)?;
    root.present()?;
    Ok(())
}

fn draw_bar_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    title: &str,
    bars: &[(String, f64)],
) -> Result<(), Box<dyn Error>> {
    let y_max = bars
        .iter()
        .map(|&(_, v)| v)
        .fold(0.0_f64, f64::max)
        .max(1e-6)
        * 1.15;
    let labels: Vec<String> = bars.iter().map(|(name, _)| name.clone()).collect();

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", FONT_SIZE_TITLE))
        .margin(PLOT_MARGIN)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..bars.len() as f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|x| {
            let idx = x.floor() as usize;
            labels.get(idx).cloned().unwrap_or_default()
        })
        .label_style(("sans-serif", FONT_SIZE_AXIS))
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, &(_, value))| {
        Rectangle::new(
            [(i as f64 + 0.2, 0.0), (i as f64 + 0.8, value)],
            BAR_COLOR.mix(0.7).filled(),
        )
    }))?;
    Ok(())
}
