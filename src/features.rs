//! Feature table and correlation
//!
//! This module turns the normalized table into a purely numeric matrix for
//! correlation analysis:
//! - rows missing any required field are excluded whole (no imputation)
//! - day-of-week expands to indicator columns with Sun as the dropped
//!   reference category
//! - the smartwatch "H:MM" duration converts to total minutes
//! - eat/screen gaps re-anchor the shifted start time to the evening clock
//!   basis the covariate hours are recorded in (re-adding the 12-hour shift)

use crate::error::SleepError;
use crate::types::{DayOfWeek, NormalizedSleepRecord};
use serde::{Deserialize, Serialize};

/// Target metric for the ranked correlation report
pub const TARGET_FEATURE: &str = "score_smartwatch";

/// Parse a smartwatch "H:MM" duration into total minutes.
///
/// Returns `None` for empty or malformed strings so callers can tell
/// "unknown" apart from a genuine zero-minute reading. The feature matrix
/// itself maps `None` to 0, matching the source analysis.
pub fn parse_watch_minutes(raw: &str) -> Option<u32> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Minutes-conversion policy inherited from the source: unknown reads as 0
pub fn watch_minutes_or_zero(raw: Option<&str>) -> f64 {
    raw.and_then(parse_watch_minutes).unwrap_or(0) as f64
}

/// A purely numeric matrix with labeled columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    features: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Extract one column by feature name
    pub fn column(&self, feature: &str) -> Option<Vec<f64>> {
        let index = self.features.iter().position(|f| f == feature)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Pairwise Pearson correlation over all columns
    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let n = self.features.len();
        let columns: Vec<Vec<f64>> = (0..n)
            .map(|i| self.rows.iter().map(|row| row[i]).collect())
            .collect();

        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            features: self.features.clone(),
            values,
        }
    }
}

/// Square Pearson correlation matrix labeled by feature name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    features: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.features.iter().position(|f| f == a)?;
        let j = self.features.iter().position(|f| f == b)?;
        Some(self.values[i][j])
    }

    /// Correlations of every other feature against `target`, sorted
    /// descending by signed value. Zero-variance columns produce NaN and
    /// sort last rather than disappearing.
    pub fn ranked_against(&self, target: &str) -> Result<Vec<(String, f64)>, SleepError> {
        let target_index = self
            .features
            .iter()
            .position(|f| f == target)
            .ok_or_else(|| SleepError::EmptyTable(format!("no feature named {target:?}")))?;

        let mut ranked: Vec<(String, f64)> = self
            .features
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_index)
            .map(|(i, f)| (f.clone(), self.values[i][target_index]))
            .collect();

        ranked.sort_by(|(_, a), (_, b)| match (a.is_nan(), b.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal),
        });
        Ok(ranked)
    }
}

/// Build the numeric feature table from the normalized records.
///
/// Rows lacking any of: timing fields, score, rating, melatonin, or either
/// covariate hour are excluded (explicit dropna, never imputed). Fails only
/// when no usable rows remain.
pub fn to_feature_table(rows: &[NormalizedSleepRecord]) -> Result<FeatureTable, SleepError> {
    let mut features = vec![
        TARGET_FEATURE.to_string(),
        "start_time_hr".to_string(),
        "stop_time_hr".to_string(),
        "duration".to_string(),
        "duration_minutes".to_string(),
        "hours_between_eat_and_sleep".to_string(),
        "hours_between_screen_and_sleep".to_string(),
    ];
    // Drop-first one-hot: Sun is the reference category
    for day in &DayOfWeek::ALL[1..] {
        features.push(format!("day_of_week_{}", day.as_str()));
    }

    let mut matrix = Vec::new();
    for rec in rows {
        let (start_hr, stop_hr, duration, score, eat, screen) = match (
            rec.start_time_hr,
            rec.stop_time_hr,
            rec.duration,
            rec.score_smartwatch,
            rec.hour_finished_eating_by,
            rec.hour_finished_screen_time_by,
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) => (a, b, c, d, e, f),
            _ => continue,
        };
        if rec.rating_smartwatch.is_none() || rec.melatonin.is_none() {
            continue;
        }

        let mut row = vec![
            score,
            start_hr,
            stop_hr,
            duration,
            watch_minutes_or_zero(rec.duration_smartwatch.as_deref()),
            12.0 + start_hr - eat,
            12.0 + start_hr - screen,
        ];
        for day in &DayOfWeek::ALL[1..] {
            row.push(if rec.day_of_week == *day { 1.0 } else { 0.0 });
        }
        matrix.push(row);
    }

    if matrix.is_empty() {
        return Err(SleepError::EmptyTable(
            "no rows with a complete feature set".to_string(),
        ));
    }

    Ok(FeatureTable {
        features,
        rows: matrix,
    })
}

/// Pearson correlation coefficient; NaN when either column has no variance
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;
    use crate::types::RawSleepRecord;
    use pretty_assertions::assert_eq;

    fn make_raw(date: &str, start: &str, stop: &str, score: &str) -> RawSleepRecord {
        RawSleepRecord {
            date: date.to_string(),
            start_raw: Some(start.to_string()),
            stop_raw: Some(stop.to_string()),
            duration_smartwatch: Some("7:45".to_string()),
            score_smartwatch: Some(score.to_string()),
            rating_smartwatch: Some("Good".to_string()),
            day_of_week: None,
            melatonin: Some("No".to_string()),
            hour_finished_eating_by: Some("7.5".to_string()),
            hour_finished_screen_time_by: Some("10".to_string()),
        }
    }

    fn sample_records() -> Vec<crate::types::NormalizedSleepRecord> {
        let rows = vec![
            make_raw("2024-09-01", "10:30", "6:15", "70"),
            make_raw("2024-09-02", "11:00", "7:00", "80"),
            make_raw("2024-09-03", "11:30", "7:15", "86"),
            make_raw("2024-09-04", "10:00", "5:45", "65"),
        ];
        Normalizer::normalize(&rows).unwrap()
    }

    #[test]
    fn watch_minutes_conversion() {
        assert_eq!(parse_watch_minutes("7:45"), Some(465));
        assert_eq!(parse_watch_minutes("0:00"), Some(0));
        assert_eq!(parse_watch_minutes(""), None);
        assert_eq!(parse_watch_minutes("7:75"), None);
        assert_eq!(parse_watch_minutes("seven"), None);

        assert_eq!(watch_minutes_or_zero(Some("7:45")), 465.0);
        assert_eq!(watch_minutes_or_zero(Some("")), 0.0);
        assert_eq!(watch_minutes_or_zero(None), 0.0);
    }

    #[test]
    fn feature_table_shape() {
        let table = to_feature_table(&sample_records()).unwrap();
        // 7 numeric columns + 6 day indicators (Sun dropped)
        assert_eq!(table.features().len(), 13);
        assert_eq!(table.rows().len(), 4);
        assert!(table.features().iter().all(|f| f != "day_of_week_Sun"));
    }

    #[test]
    fn one_hot_marks_single_day() {
        let table = to_feature_table(&sample_records()).unwrap();
        // 2024-09-03 was a Tuesday
        let tue = table.column("day_of_week_Tue").unwrap();
        assert_eq!(tue, vec![0.0, 0.0, 1.0, 0.0]);
        // 2024-09-01 was a Sunday: all indicators zero (reference category)
        let first_row = &table.rows()[0];
        assert!(first_row[7..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn interval_features_reanchor_to_evening_clock() {
        let table = to_feature_table(&sample_records()).unwrap();
        let gaps = table.column("hours_between_eat_and_sleep").unwrap();
        // Row 3: start 11:30pm -> start_time_hr -0.5, evening clock 11.5;
        // finished eating at 7:30pm (7.5) -> 4 hours before sleep
        assert!((gaps[2] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn incomplete_rows_dropped_whole() {
        let mut records = sample_records();
        records[1].score_smartwatch = None;
        records[3].start_time_hr = None;
        let table = to_feature_table(&records).unwrap();
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn empty_table_is_an_error() {
        let mut records = sample_records();
        for rec in &mut records {
            rec.score_smartwatch = None;
        }
        assert!(matches!(
            to_feature_table(&records),
            Err(SleepError::EmptyTable(_))
        ));
    }

    #[test]
    fn pearson_sanity() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &up) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down) + 1.0).abs() < 1e-12);
        let flat = [5.0; 4];
        assert!(pearson(&x, &flat).is_nan());
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let table = to_feature_table(&sample_records()).unwrap();
        let matrix = table.correlation_matrix();
        let r_ab = matrix.get(TARGET_FEATURE, "duration").unwrap();
        let r_ba = matrix.get("duration", TARGET_FEATURE).unwrap();
        assert_eq!(r_ab, r_ba);
        let self_r = matrix.get("duration", "duration").unwrap();
        assert!((self_r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ranking_excludes_target_and_sorts_descending() {
        let table = to_feature_table(&sample_records()).unwrap();
        let matrix = table.correlation_matrix();
        let ranked = matrix.ranked_against(TARGET_FEATURE).unwrap();

        assert!(ranked.iter().all(|(f, _)| f != TARGET_FEATURE));
        let finite: Vec<f64> = ranked
            .iter()
            .map(|(_, r)| *r)
            .filter(|r| !r.is_nan())
            .collect();
        assert!(finite.windows(2).all(|w| w[0] >= w[1]));
        // In the sample, later starts track higher scores almost perfectly
        let start = ranked.iter().find(|(f, _)| f == "start_time_hr").unwrap();
        assert!(start.1 > 0.9);
        // Constant columns (e.g. duration_minutes, unobserved day indicators)
        // are NaN and sort after every finite correlation
        let first_nan = ranked.iter().position(|(_, r)| r.is_nan()).unwrap();
        assert!(ranked[first_nan..].iter().all(|(_, r)| r.is_nan()));
        assert!(ranked[first_nan..]
            .iter()
            .any(|(f, _)| f == "duration_minutes"));
    }
}
