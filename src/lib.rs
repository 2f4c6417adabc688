//! Sleepline - normalization and analysis engine for personal sleep logs
//!
//! Sleepline turns a hand-kept sleep-tracking CSV into an analysis-ready
//! table through a deterministic pipeline: CSV ingestion -> time
//! normalization -> {chart models, feature table, report}.
//!
//! The core is the time normalization: date-relative clock strings that
//! cross midnight are anchored onto one continuous numeric timeline
//! (evening starts negative, morning stops positive) so sessions sort,
//! subtract, and plot without wraparound special cases.
//!
//! ## Modules
//!
//! - **ingest**: CSV rows into raw records, lenient on optional columns
//! - **normalizer**: the shifted-timeline math and per-row quality flags
//! - **bucket**: poor/fair/good threshold policy shared by all consumers
//! - **features**: numeric feature table and Pearson correlations
//! - **charts**: render-ready chart models, one per output image
//! - **report**: per-run analysis report with provenance

pub mod bucket;
pub mod charts;
pub mod error;
pub mod features;
pub mod ingest;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod types;

pub use bucket::{Band, Bucket, Thresholds, DURATION_THRESHOLDS, SCORE_THRESHOLDS};
pub use error::SleepError;
pub use features::{to_feature_table, CorrelationMatrix, FeatureTable};
pub use normalizer::Normalizer;
pub use pipeline::{analyze_csv, SleepAnalyzer};
pub use report::{AnalysisReport, ReportBuilder};
pub use types::{DayOfWeek, NormalizedSleepRecord, QualityFlag, Rating, RawSleepRecord};

/// Sleepline version embedded in every report
pub const SLEEPLINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report provenance
pub const PRODUCER_NAME: &str = "sleepline";
