//! Error types for sleepline

use thiserror::Error;

/// Errors that can occur during ingestion or analysis.
///
/// File-level problems (unreadable CSV, absent required column) are fatal.
/// Row-level problems degrade to missing fields plus a quality flag and are
/// never surfaced through this type.
#[derive(Debug, Error)]
pub enum SleepError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Date parse error: {0}")]
    DateParse(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid thresholds: ry ({ry}) must be below yg ({yg})")]
    InvalidThresholds { ry: f64, yg: f64 },

    #[error("Empty feature table: {0}")]
    EmptyTable(String),
}
