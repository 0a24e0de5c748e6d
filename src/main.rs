//! CLI entry point for the flight-delay report tool.
//!
//! Discovers the extracted Kaggle CSV files, streams them through the
//! aggregator, and writes the finalized summary as JSON.

use anyhow::Result;
use clap::Parser;
use flight_delay_report::discover::{collect_csv_files, limit_files};
use flight_delay_report::output::write_summary;
use flight_delay_report::report::aggregate::{AggregateContext, DEFAULT_CHUNKSIZE};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "flight-delay-report")]
#[command(about = "Aggregate flight punctuality statistics from the Kaggle delay dataset", long_about = None)]
struct Cli {
    /// Directory containing the downloaded dataset CSV files
    #[arg(short, long, default_value = "data/flight-delay-dataset-2018-2024")]
    data_dir: PathBuf,

    /// Path the summary JSON is written to
    #[arg(short, long, default_value = "analysis/flight_delay_summary.json")]
    output: PathBuf,

    /// Rows to read per batch when streaming large CSV files
    #[arg(short, long, default_value_t = DEFAULT_CHUNKSIZE)]
    chunksize: usize,

    /// Optional cap on how many CSV files to process (smoke tests)
    #[arg(short, long)]
    limit_files: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/flight_delay_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("flight_delay_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let files = limit_files(collect_csv_files(&cli.data_dir), cli.limit_files);
    if files.is_empty() {
        anyhow::bail!(
            "no CSV files found in {} (extract the Kaggle archive there first)",
            cli.data_dir.display()
        );
    }
    info!(
        file_count = files.len(),
        chunksize = cli.chunksize,
        "Starting aggregation"
    );

    let mut ctx = AggregateContext::new();
    for path in &files {
        ctx.process_file(path, cli.chunksize);
    }

    let quality = ctx.quality().clone();
    if quality.files_unreadable > 0 || quality.files_bad_schema > 0 {
        warn!(
            unreadable = quality.files_unreadable,
            bad_schema = quality.files_bad_schema,
            "Some input files were skipped"
        );
    }
    if quality.rows_skipped > 0 {
        warn!(rows_skipped = quality.rows_skipped, "Some rows failed to parse");
    }

    let summary = ctx.finalize();
    info!(
        flights = summary.overall.flights,
        months = summary.monthly.len(),
        carriers = summary.carriers.len(),
        "Aggregation complete"
    );

    write_summary(&cli.output, &summary)?;
    info!(output = %cli.output.display(), "Summary written");

    Ok(())
}
