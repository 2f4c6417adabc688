//! Pipeline orchestration
//!
//! Public entry points composing the stages: CSV ingestion -> time
//! normalization -> report assembly, with the chart consumers and the
//! feature table available against the normalized table. Data flows one
//! direction; no stage writes back.

use crate::bucket::{Thresholds, DURATION_THRESHOLDS, SCORE_THRESHOLDS};
use crate::error::SleepError;
use crate::ingest;
use crate::normalizer::Normalizer;
use crate::report::{AnalysisReport, ReportBuilder};
use crate::types::NormalizedSleepRecord;
use std::path::Path;

/// Analyze an in-memory CSV log in one shot.
///
/// # Example
/// ```ignore
/// let report = analyze_csv(&std::fs::read_to_string("sleep.csv")?)?;
/// println!("{} rows", report.total_rows);
/// ```
pub fn analyze_csv(data: &str) -> Result<AnalysisReport, SleepError> {
    SleepAnalyzer::new().analyze(data)
}

/// Configured analyzer holding the bucket thresholds chart consumers use.
///
/// Each invocation recomputes from the input; the analyzer carries no state
/// across runs beyond its configuration.
pub struct SleepAnalyzer {
    duration_thresholds: Thresholds,
    score_thresholds: Thresholds,
    builder: ReportBuilder,
}

impl Default for SleepAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SleepAnalyzer {
    /// Create an analyzer with the standard thresholds
    pub fn new() -> Self {
        Self {
            duration_thresholds: DURATION_THRESHOLDS,
            score_thresholds: SCORE_THRESHOLDS,
            builder: ReportBuilder::new(),
        }
    }

    /// Create an analyzer with custom duration thresholds
    pub fn with_duration_thresholds(ry: f64, yg: f64) -> Result<Self, SleepError> {
        Ok(Self {
            duration_thresholds: Thresholds::new(ry, yg)?,
            score_thresholds: SCORE_THRESHOLDS,
            builder: ReportBuilder::new(),
        })
    }

    pub fn duration_thresholds(&self) -> Thresholds {
        self.duration_thresholds
    }

    pub fn score_thresholds(&self) -> Thresholds {
        self.score_thresholds
    }

    /// Ingest and normalize a CSV string
    pub fn normalize_csv(&self, data: &str) -> Result<Vec<NormalizedSleepRecord>, SleepError> {
        let raw = ingest::read_records_from_str(data)?;
        Normalizer::normalize(&raw)
    }

    /// Ingest and normalize a CSV file
    pub fn normalize_path(&self, path: &Path) -> Result<Vec<NormalizedSleepRecord>, SleepError> {
        let raw = ingest::read_records_from_path(path)?;
        Normalizer::normalize(&raw)
    }

    /// Full pipeline: CSV string to analysis report
    pub fn analyze(&self, data: &str) -> Result<AnalysisReport, SleepError> {
        let records = self.normalize_csv(data)?;
        self.builder.build(&records)
    }
}
