//! Sleepline CLI
//!
//! Commands:
//! - analyze: full report (counts, medians, ranked correlations)
//! - correlate: ranked correlations against the smartwatch score
//! - charts: emit all chart models as JSON for a renderer
//! - validate: structural check of a log file, per-row issue listing

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

use sleepline::charts;
use sleepline::normalizer::Normalizer;
use sleepline::{ingest, SleepAnalyzer, SleepError, SLEEPLINE_VERSION};

/// Sleepline - turn a personal sleep log into charts and correlations
#[derive(Parser)]
#[command(name = "sleepline")]
#[command(version = SLEEPLINE_VERSION)]
#[command(about = "Analyze a personal sleep-tracking CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce the full analysis report
    Analyze {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Emit the report as pretty JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print ranked correlations against the smartwatch score
    Correlate {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Emit all chart models as JSON
    Charts {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Poor/fair duration boundary in hours
        #[arg(long, default_value = "6.5")]
        ry: f64,

        /// Fair/good duration boundary in hours
        #[arg(long, default_value = "7.5")]
        yg: f64,
    },

    /// Check a log file's structure and list per-row issues
    Validate {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output the validation summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Sleep(#[from] SleepError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation found {0} rows with issues")]
    ValidationFailed(usize),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sleepline: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Analyze { input, json } => cmd_analyze(&input, json),
        Commands::Correlate { input } => cmd_correlate(&input),
        Commands::Charts { input, ry, yg } => cmd_charts(&input, ry, yg),
        Commands::Validate { input, json } => cmd_validate(&input, json),
    }
}

fn read_input(path: &Path) -> Result<String, CliError> {
    if path.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("sleepline: reading CSV from terminal input, end with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn cmd_analyze(input: &Path, json: bool) -> Result<(), CliError> {
    let data = read_input(input)?;
    let report = SleepAnalyzer::new().analyze(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Sleepline Report");
    println!("================");
    println!("Rows:        {}", report.total_rows);
    println!("With timing: {}", report.rows_with_timing);

    println!("\nMedian start time by day of week:");
    for entry in &report.median_start_by_day {
        match entry.median_start_hr {
            Some(hr) => println!("  {}  {}", entry.day.as_str(), clock_label(hr)),
            None => println!("  {}  (no data)", entry.day.as_str()),
        }
    }

    println!("\nCorrelations with score_smartwatch:");
    for entry in &report.correlations {
        println!("  {:<32} {:+.3}", entry.feature, entry.r);
    }

    if !report.flag_counts.is_empty() {
        println!("\nData issues:");
        for fc in &report.flag_counts {
            println!("  {:?}: {} rows", fc.flag, fc.count);
        }
    }

    Ok(())
}

fn cmd_correlate(input: &Path) -> Result<(), CliError> {
    let data = read_input(input)?;
    let report = SleepAnalyzer::new().analyze(&data)?;

    for entry in &report.correlations {
        println!("{:<32} {:+.3}", entry.feature, entry.r);
    }
    Ok(())
}

fn cmd_charts(input: &Path, ry: f64, yg: f64) -> Result<(), CliError> {
    let data = read_input(input)?;
    let analyzer = SleepAnalyzer::with_duration_thresholds(ry, yg)?;
    let records = analyzer.normalize_csv(&data)?;
    let thresholds = analyzer.duration_thresholds();

    let models = serde_json::json!({
        "duration_series": charts::duration_series(&records, thresholds),
        "start_time_series": charts::start_time_series(&records),
        "duration_histogram": charts::duration_histogram(&records, thresholds),
        "session_spans": charts::session_spans(&records, thresholds),
        "duration_by_day_of_week": charts::duration_by_day_of_week(&records),
        "start_time_by_day_of_week": charts::start_time_by_day_of_week(&records),
        "calculated_vs_watch": charts::calculated_vs_watch(&records),
    });
    println!("{}", serde_json::to_string_pretty(&models)?);
    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), CliError> {
    let data = read_input(input)?;
    let raw = ingest::read_records_from_str(&data)?;
    let records = Normalizer::normalize(&raw)?;

    let flagged: Vec<(usize, Vec<String>)> = records
        .iter()
        .enumerate()
        .filter(|(_, rec)| !rec.quality_flags.is_empty())
        .map(|(i, rec)| {
            let flags = rec
                .quality_flags
                .iter()
                .map(|f| format!("{f:?}"))
                .collect();
            (i, flags)
        })
        .collect();

    if json {
        let summary = serde_json::json!({
            "rows": records.len(),
            "rows_with_issues": flagged.len(),
            "issues": flagged
                .iter()
                .map(|(i, flags)| serde_json::json!({ "row": i, "flags": flags }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} rows, {} with issues", records.len(), flagged.len());
        for (i, flags) in &flagged {
            println!("  row {}: {}", i, flags.join(", "));
        }
    }

    if flagged.is_empty() {
        Ok(())
    } else {
        Err(CliError::ValidationFailed(flagged.len()))
    }
}

/// Render a shifted-timeline hour as a clock label, e.g. -1.5 -> "10:30pm"
fn clock_label(hr: f64) -> String {
    let civil = (hr + 24.0).rem_euclid(24.0);
    let total_minutes = (civil * 60.0).round() as i64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let (display_hour, suffix) = match hours % 24 {
        0 => (12, "am"),
        h @ 1..=11 => (h, "am"),
        12 => (12, "pm"),
        h => (h - 12, "pm"),
    };
    format!("{display_hour}:{minutes:02}{suffix}")
}
