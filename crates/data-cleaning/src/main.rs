//! CLI entry point for the data cleaning pipeline.

use anyhow::Result;
use clap::Parser;
use data_cleaning::{
    CleaningConfig, CleaningConfigBuilder, DataManager, ReportGenerator, RunReport, StageReport,
};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Clean a delimited employee dataset: sentinel normalization, imputation,
/// type conversion and text cleanup.
#[derive(Parser, Debug)]
#[command(name = "data-cleaning", version, about, long_about = None)]
struct Args {
    /// Path to the CSV file to clean
    ///
    /// Defaults to ../data/raw/data_employes_to_clean.csv
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Field separator of the input file
    #[arg(long)]
    sep: Option<char>,

    /// Output directory for the cleaned dataset (created if absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file name; .csv or .xlsx
    #[arg(long)]
    output_name: Option<String>,

    /// JSON configuration file; flags given on the command line win
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of neighbors for KNN imputation
    #[arg(long)]
    knn_neighbors: Option<usize>,

    /// Seed for the observation row sample
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only warnings and the final summary)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run report as JSON to stdout instead of the summary
    ///
    /// Disables all logs. Useful for piping: `... --json | jq .errors`
    #[arg(long)]
    json: bool,

    /// Write the run report to <output>/<input_name>_report.json
    #[arg(short = 'r', long)]
    report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<CleaningConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            CleaningConfig::from_json_file(path)?
        }
        None => CleaningConfig::default(),
    };

    let mut builder = CleaningConfigBuilder::from_config(base);
    if let Some(input) = &args.input {
        builder = builder.input_path(input);
    }
    if let Some(sep) = args.sep {
        builder = builder.separator(sep);
    }
    if let Some(output) = &args.output {
        builder = builder.output_dir(output);
    }
    if let Some(name) = &args.output_name {
        builder = builder.output_name(name);
    }
    if let Some(k) = args.knn_neighbors {
        builder = builder.knn_neighbors(k);
    }
    if let Some(seed) = args.seed {
        builder = builder.sample_seed(seed);
    }

    Ok(builder.build()?)
}

/// Record a fallible stage; returns false when the run cannot go on.
fn record(report: &mut RunReport, outcome: data_cleaning::Result<StageReport>) -> bool {
    match outcome {
        Ok(stage) => {
            report.push_stage(stage);
            true
        }
        Err(e) => {
            error!("{} ({})", e, e.error_code());
            report.push_error(&e);
            e.is_recoverable()
        }
    }
}

fn run(manager: &mut DataManager, report: &mut RunReport) {
    let load = manager.load();
    let loaded = !load.skipped;
    report.push_stage(load);
    if !loaded {
        warn!("Nothing to clean; remaining stages skipped");
        return;
    }

    report.observation = manager.observe_data();
    report.missing_before = manager.missing_summary();
    report.push_stage(manager.identify_missing_values());

    if !record(report, manager.handle_missing_values()) {
        return;
    }
    if !record(report, manager.convert_datatypes()) {
        return;
    }

    let text_column = manager.config().columns.location.clone();
    report.push_stage(manager.clean_text_column(&text_column));

    report.push_stage(manager.save_data());
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    let config = build_config(&args)?;
    let output_dir = config.output_dir.clone();
    let input_path = config.input_path.clone();

    let mut report = RunReport::new(&input_path);
    let mut manager = DataManager::new(config);

    run(&mut manager, &mut report);

    report.output_file = manager.saved_path().map(|p| p.display().to_string());
    report.missing_after = manager.missing_summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    if args.report {
        let stem = input_stem(&input_path);
        let generator = ReportGenerator::new(&output_dir);
        if let Err(e) = generator.write_report_to_file(&report, &stem) {
            error!("Failed to write the run report: {}", e);
        }
    }

    if report.is_clean() {
        info!("Cleaning completed successfully");
    } else {
        warn!(
            "Cleaning completed with {} warnings and {} errors",
            report.warning_count(),
            report.errors.len()
        );
    }
    Ok(())
}

fn input_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data")
        .to_string()
}
