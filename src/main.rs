//! Recommender evaluation CLI
//!
//! Offline analysis of per-algorithm recommendation runs against a
//! held-out test split.
//!
//! ## Quick Start
//!
//! ```bash
//! # Analyze every algorithm run for one dataset
//! ./rec-eval run --dataset ml100k \
//!     --runs-root ./runs \
//!     --splits-root ./splits
//!
//! # Show the run directories that would be analyzed
//! ./rec-eval list --dataset ml100k --runs-root ./runs
//! ```
//!
//! ## Expected layout
//!
//! Run directories are named `<dataset>-<algorithm>[-suffix]` and hold
//! `recs-*` recommendation files and `pred-*` prediction files. Test
//! splits live under `<splits-root>/<dataset>/test-*`.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use rec_eval::config::AnalysisConfig;
use rec_eval::eval::{self, default_metrics};
use rec_eval::input::{
    data_files, discover_runs, load_ground_truth, load_predictions, load_recommendations,
    PRED_FILE_PREFIX, REC_FILE_PREFIX,
};
use rec_eval::report;
use rec_eval::stats::{compare_algorithms, SignificanceReport};

#[derive(Parser)]
#[command(name = "rec-eval")]
#[command(about = "Offline evaluation and significance analysis for recommender outputs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis for one dataset
    ///
    /// Loads every algorithm run, scores the recommendation lists against
    /// the test split, renders charts, and tests significance.
    Run {
        /// Dataset identifier (selects run directories and the test split)
        #[arg(short, long)]
        dataset: String,

        /// Directory holding the per-algorithm run directories
        #[arg(long, default_value = "runs")]
        runs_root: PathBuf,

        /// Directory holding the per-dataset split directories
        #[arg(long, default_value = "splits")]
        splits_root: PathBuf,

        /// Directory charts are written into
        #[arg(long, default_value = "charts")]
        charts_dir: PathBuf,

        /// Path to the analysis config file (TOML)
        #[arg(short, long, default_value = "rec-eval.toml")]
        config: PathBuf,
    },

    /// List the run directories discovered for a dataset
    List {
        /// Dataset identifier
        #[arg(short, long)]
        dataset: String,

        /// Directory holding the per-algorithm run directories
        #[arg(long, default_value = "runs")]
        runs_root: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            dataset,
            runs_root,
            splits_root,
            charts_dir,
            config,
        } => {
            run_analysis(&dataset, &runs_root, &splits_root, &charts_dir, &config)?;
        }

        Commands::List { dataset, runs_root } => {
            list_runs(&dataset, &runs_root)?;
        }
    }

    Ok(())
}

fn run_analysis(
    dataset: &str,
    runs_root: &Path,
    splits_root: &Path,
    charts_dir: &Path,
    config_path: &Path,
) -> Result<()> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              RECOMMENDER EVALUATION ANALYSIS                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let config = if config_path.exists() {
        println!("Loading config from {:?}...", config_path);
        AnalysisConfig::load(config_path)?
    } else {
        println!("Using default config...");
        AnalysisConfig::default()
    };

    // Load everything up front; any unreadable input aborts the run
    eprintln!("\nDiscovering runs for '{dataset}' under {:?}...", runs_root);
    let runs = discover_runs(runs_root, dataset)?;
    let algorithms: Vec<&str> = runs.iter().map(|r| r.id.algorithm.as_str()).collect();
    eprintln!("  Found {} runs: {}", runs.len(), algorithms.join(", "));

    let recs = load_recommendations(&runs)?;
    let preds = load_predictions(&runs)?;
    let truth = load_ground_truth(splits_root, dataset)?;
    eprintln!(
        "  Loaded: {} recommendation rows, {} prediction rows, {} test rows",
        recs.len(),
        preds.len(),
        truth.len()
    );

    let metrics = default_metrics();
    let results = eval::evaluate(&recs, &truth, &metrics)?;
    let rmse = eval::rmse_by_user(&preds, &truth);

    report::print_metric_summary(&results);
    report::print_rmse_summary(&rmse);

    // Significance outcomes are computed for every metric before any chart
    // is rendered, so a failed metric aborts with nothing half-drawn
    let mut outcomes: Vec<(String, SignificanceReport)> = Vec::new();
    for metric in &results.metric_names {
        let aligned = results.aligned_scores(metric)?;
        let outcome = compare_algorithms(&aligned, config.alpha)?;
        outcomes.push((metric.clone(), outcome));
    }

    for (metric, outcome) in &outcomes {
        report::print_significance(metric, outcome, config.alpha);
    }

    std::fs::create_dir_all(charts_dir)?;
    let metrics_chart = charts_dir.join("metrics.png");
    report::render_metric_chart(&metrics_chart, &results.to_long(), &config.charts)
        .map_err(|e| anyhow!("failed to render {:?}: {e}", metrics_chart))?;
    println!("\nChart saved to {:?}", metrics_chart);

    if rmse.is_empty() {
        tracing::warn!("no prediction rows overlap the ground truth, skipping RMSE chart");
    } else {
        let rmse_chart = charts_dir.join("rmse.png");
        report::render_rmse_chart(&rmse_chart, &rmse, &config.charts)
            .map_err(|e| anyhow!("failed to render {:?}: {e}", rmse_chart))?;
        println!("Chart saved to {:?}", rmse_chart);
    }

    Ok(())
}

fn list_runs(dataset: &str, runs_root: &Path) -> Result<()> {
    let runs = discover_runs(runs_root, dataset)?;

    println!("{:20} {:30} {:>10} {:>10}", "Algorithm", "Directory", "recs", "pred");
    println!("{}", "─".repeat(74));
    for run in &runs {
        let dir_name = run
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?");
        println!(
            "{:20} {:30} {:>10} {:>10}",
            run.id.algorithm,
            dir_name,
            count_files(&run.path, REC_FILE_PREFIX),
            count_files(&run.path, PRED_FILE_PREFIX),
        );
    }
    Ok(())
}

fn count_files(dir: &Path, prefix: &'static str) -> usize {
    data_files(dir, prefix).map(|files| files.len()).unwrap_or(0)
}
