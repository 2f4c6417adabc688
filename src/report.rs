//! Report assembly
//!
//! Builds the per-run analysis report: provenance metadata, row counts,
//! median start times per day of week, the ranked correlation list, and a
//! tally of row-scoped quality flags. The report is the console/JSON output
//! surface; chart models are produced separately by the chart consumers.

use crate::error::SleepError;
use crate::features::{to_feature_table, TARGET_FEATURE};
use crate::types::{DayOfWeek, NormalizedSleepRecord, QualityFlag};
use crate::{PRODUCER_NAME, SLEEPLINE_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub report_id: String,
}

/// Median start time for one day of week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMedian {
    pub day: DayOfWeek,
    pub median_start_hr: Option<f64>,
}

/// One entry of the ranked correlation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub feature: String,
    pub r: f64,
}

/// Count of one quality flag across the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagCount {
    pub flag: QualityFlag,
    pub count: usize,
}

/// Complete analysis report for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub producer: Producer,
    pub generated_at_utc: String,
    pub total_rows: usize,
    pub rows_with_timing: usize,
    /// Always seven entries, Sun..Sat
    pub median_start_by_day: Vec<DayMedian>,
    /// Correlations against the smartwatch score, descending; empty when no
    /// row carries a complete feature set
    pub correlations: Vec<CorrelationEntry>,
    pub flag_counts: Vec<FlagCount>,
}

/// Report builder holding a per-run id
pub struct ReportBuilder {
    report_id: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    /// Create a builder with a fresh report id
    pub fn new() -> Self {
        Self {
            report_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a builder with a fixed report id
    pub fn with_report_id(report_id: String) -> Self {
        Self { report_id }
    }

    /// Assemble the report from the normalized table
    pub fn build(&self, rows: &[NormalizedSleepRecord]) -> Result<AnalysisReport, SleepError> {
        let correlations = match to_feature_table(rows) {
            Ok(table) => table
                .correlation_matrix()
                .ranked_against(TARGET_FEATURE)?
                .into_iter()
                .map(|(feature, r)| CorrelationEntry { feature, r })
                .collect(),
            // No usable rows is a degraded report, not a failed run
            Err(SleepError::EmptyTable(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let median_start_by_day = crate::charts::median_start_by_day_of_week(rows)
            .into_iter()
            .map(|(day, median_start_hr)| DayMedian {
                day,
                median_start_hr,
            })
            .collect();

        Ok(AnalysisReport {
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: SLEEPLINE_VERSION.to_string(),
                report_id: self.report_id.clone(),
            },
            generated_at_utc: Utc::now().to_rfc3339(),
            total_rows: rows.len(),
            rows_with_timing: rows.iter().filter(|r| r.has_timing()).count(),
            median_start_by_day,
            correlations,
            flag_counts: tally_flags(rows),
        })
    }

    /// Assemble and serialize to pretty JSON
    pub fn build_json(&self, rows: &[NormalizedSleepRecord]) -> Result<String, SleepError> {
        let report = self.build(rows)?;
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

fn tally_flags(rows: &[NormalizedSleepRecord]) -> Vec<FlagCount> {
    const ALL_FLAGS: [QualityFlag; 8] = [
        QualityFlag::MissingStartTime,
        QualityFlag::MissingStopTime,
        QualityFlag::UnparseableScore,
        QualityFlag::UnparseableRating,
        QualityFlag::UnparseableMelatonin,
        QualityFlag::UnparseableEatingHour,
        QualityFlag::UnparseableScreenHour,
        QualityFlag::DayOfWeekDerived,
    ];

    ALL_FLAGS
        .iter()
        .filter_map(|&flag| {
            let count = rows
                .iter()
                .filter(|r| r.quality_flags.contains(&flag))
                .count();
            (count > 0).then_some(FlagCount { flag, count })
        })
        .collect()
}
