//! Time normalization
//!
//! This module anchors each cross-midnight sleep session to a single numeric
//! timeline. Raw clock times are date-relative and ambiguous: the log's
//! convention is that start times are entered as AM clock values for an
//! evening event, and stop times belong to the following morning. The fix is
//! a 12-hour shift on the start and a one-day shift on the stop, both
//! measured against midnight of the `date` column:
//!
//! - `start_time_hr = (start + 12h - midnight) in hours - 24`, ~[-24, 0)
//! - `stop_time_hr  = (stop + 1d - midnight) in hours - 24`, ~[0, 24)
//!
//! so "11:30" entered on 2024-09-03 becomes -0.5 (half an hour before the
//! anchor midnight) and a "07:15" stop becomes 7.25.

use crate::error::SleepError;
use crate::types::{DayOfWeek, NormalizedSleepRecord, QualityFlag, Rating, RawSleepRecord};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const CLOCK_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Normalizer for converting raw log rows to the shifted timeline
pub struct Normalizer;

impl Normalizer {
    /// Normalize raw rows, one output per input, order preserved.
    ///
    /// A malformed `date` is fatal; every other field degrades to `None`
    /// plus a quality flag on the affected row.
    pub fn normalize(rows: &[RawSleepRecord]) -> Result<Vec<NormalizedSleepRecord>, SleepError> {
        rows.iter()
            .enumerate()
            .map(|(index, raw)| normalize_row(index, raw))
            .collect()
    }
}

fn normalize_row(index: usize, raw: &RawSleepRecord) -> Result<NormalizedSleepRecord, SleepError> {
    let date = parse_log_date(&raw.date)
        .ok_or_else(|| SleepError::DateParse(format!("row {}: {:?}", index, raw.date)))?;
    let midnight = date.and_time(NaiveTime::MIN);

    let mut quality_flags = Vec::new();

    let start_ts = match parse_clock(raw.start_raw.as_deref()) {
        Some(t) => Some(date.and_time(t) + Duration::hours(12)),
        None => {
            quality_flags.push(QualityFlag::MissingStartTime);
            None
        }
    };
    let stop_ts = match parse_clock(raw.stop_raw.as_deref()) {
        Some(t) => Some(date.and_time(t) + Duration::days(1)),
        None => {
            quality_flags.push(QualityFlag::MissingStopTime);
            None
        }
    };

    let start_time_hr = start_ts.map(|ts| hours_since(ts, midnight) - 24.0);
    let stop_time_hr = stop_ts.map(|ts| hours_since(ts, midnight) - 24.0);
    let duration = match (start_ts, stop_ts) {
        (Some(start), Some(stop)) => Some(hours_since(stop, start)),
        _ => None,
    };

    let day_of_week = match raw.day_of_week.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => match DayOfWeek::parse(value) {
            Some(day) => day,
            None => {
                quality_flags.push(QualityFlag::DayOfWeekDerived);
                DayOfWeek::from_date(date)
            }
        },
        _ => DayOfWeek::from_date(date),
    };

    let score_smartwatch = parse_optional(
        raw.score_smartwatch.as_deref(),
        |s| s.parse::<f64>().ok().filter(|v| (0.0..=100.0).contains(v)),
        QualityFlag::UnparseableScore,
        &mut quality_flags,
    );
    let rating_smartwatch = parse_optional(
        raw.rating_smartwatch.as_deref(),
        Rating::parse,
        QualityFlag::UnparseableRating,
        &mut quality_flags,
    );
    let melatonin = parse_optional(
        raw.melatonin.as_deref(),
        parse_flag,
        QualityFlag::UnparseableMelatonin,
        &mut quality_flags,
    );
    let hour_finished_eating_by = parse_optional(
        raw.hour_finished_eating_by.as_deref(),
        |s| s.parse::<f64>().ok(),
        QualityFlag::UnparseableEatingHour,
        &mut quality_flags,
    );
    let hour_finished_screen_time_by = parse_optional(
        raw.hour_finished_screen_time_by.as_deref(),
        |s| s.parse::<f64>().ok(),
        QualityFlag::UnparseableScreenHour,
        &mut quality_flags,
    );

    Ok(NormalizedSleepRecord {
        date,
        start_raw: raw.start_raw.clone(),
        stop_raw: raw.stop_raw.clone(),
        start_ts,
        stop_ts,
        start_time_hr,
        stop_time_hr,
        duration,
        day_of_week,
        duration_smartwatch: raw.duration_smartwatch.clone(),
        score_smartwatch,
        rating_smartwatch,
        melatonin,
        hour_finished_eating_by,
        hour_finished_screen_time_by,
        quality_flags,
    })
}

/// Parse an optional cell: empty is silently absent, a non-empty value that
/// fails to parse is absent plus the given flag.
fn parse_optional<T>(
    cell: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    flag: QualityFlag,
    quality_flags: &mut Vec<QualityFlag>,
) -> Option<T> {
    let value = cell.map(str::trim).filter(|s| !s.is_empty())?;
    match parse(value) {
        Some(parsed) => Some(parsed),
        None => {
            quality_flags.push(flag);
            None
        }
    }
}

fn parse_log_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn parse_clock(value: Option<&str>) -> Option<NaiveTime> {
    let value = value.map(str::trim).filter(|s| !s.is_empty())?;
    CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn hours_since(later: NaiveDateTime, earlier: NaiveDateTime) -> f64 {
    (later - earlier).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_raw(date: &str, start: &str, stop: &str) -> RawSleepRecord {
        RawSleepRecord {
            date: date.to_string(),
            start_raw: Some(start.to_string()),
            stop_raw: Some(stop.to_string()),
            duration_smartwatch: None,
            score_smartwatch: None,
            rating_smartwatch: None,
            day_of_week: None,
            melatonin: None,
            hour_finished_eating_by: None,
            hour_finished_screen_time_by: None,
        }
    }

    #[test]
    fn evening_start_crosses_midnight() {
        let rows = vec![make_raw("2024-09-03", "11:30", "7:15")];
        let normalized = Normalizer::normalize(&rows).unwrap();
        let rec = &normalized[0];

        assert!((rec.start_time_hr.unwrap() - (-0.5)).abs() < 1e-9);
        assert!((rec.stop_time_hr.unwrap() - 7.25).abs() < 1e-9);
        assert!((rec.duration.unwrap() - 7.75).abs() < 1e-9);
    }

    #[test]
    fn duration_matches_hour_offsets() {
        let rows = vec![
            make_raw("2024-09-03", "10:00", "6:00"),
            make_raw("2024-09-04", "12:00", "8:30"),
            make_raw("2024-09-05", "9:45", "5:15"),
        ];
        for rec in Normalizer::normalize(&rows).unwrap() {
            let span = rec.stop_time_hr.unwrap() - rec.start_time_hr.unwrap();
            assert!((span - rec.duration.unwrap()).abs() < 1e-9);
            assert!(rec.duration.unwrap() >= 0.0);
            assert!(rec.start_time_hr.unwrap() < rec.stop_time_hr.unwrap());
        }
    }

    #[test]
    fn midnight_and_noon_entries() {
        // Start entered as exactly midnight: shifted to noon, -12 on the axis
        let rows = vec![make_raw("2024-09-03", "0:00", "8:00")];
        let rec = &Normalizer::normalize(&rows).unwrap()[0];
        assert!((rec.start_time_hr.unwrap() - (-12.0)).abs() < 1e-9);
        assert!((rec.duration.unwrap() - 20.0).abs() < 1e-9);

        // Start entered as noon: shifted to the anchor midnight itself
        let rows = vec![make_raw("2024-09-03", "12:00", "0:00")];
        let rec = &Normalizer::normalize(&rows).unwrap()[0];
        assert!((rec.start_time_hr.unwrap()).abs() < 1e-9);
        assert!((rec.stop_time_hr.unwrap()).abs() < 1e-9);
        assert!((rec.duration.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn missing_times_degrade_not_abort() {
        let mut raw = make_raw("2024-09-03", "11:30", "7:15");
        raw.stop_raw = Some(String::new());
        let rows = vec![raw, make_raw("2024-09-04", "11:00", "6:45")];
        let normalized = Normalizer::normalize(&rows).unwrap();

        let broken = &normalized[0];
        assert!(broken.start_time_hr.is_some());
        assert!(broken.stop_time_hr.is_none());
        assert!(broken.duration.is_none());
        assert!(broken.quality_flags.contains(&QualityFlag::MissingStopTime));

        // The neighboring row is untouched
        let ok = &normalized[1];
        assert!(ok.has_timing());
        assert!(ok.quality_flags.is_empty());
    }

    #[test]
    fn malformed_date_is_fatal() {
        let rows = vec![make_raw("not-a-date", "11:30", "7:15")];
        assert!(matches!(
            Normalizer::normalize(&rows),
            Err(SleepError::DateParse(_))
        ));
    }

    #[test]
    fn date_fallback_format() {
        let rows = vec![make_raw("9/3/2024", "11:30", "7:15")];
        let rec = &Normalizer::normalize(&rows).unwrap()[0];
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 9, 3).unwrap());
    }

    #[test]
    fn day_of_week_column_wins_when_parseable() {
        let mut raw = make_raw("2024-09-03", "11:30", "7:15");
        raw.day_of_week = Some("Mon".to_string());
        let rec = &Normalizer::normalize(&[raw]).unwrap()[0];
        assert_eq!(rec.day_of_week, DayOfWeek::Mon);
        assert!(rec.quality_flags.is_empty());
    }

    #[test]
    fn day_of_week_derived_when_unparseable() {
        let mut raw = make_raw("2024-09-03", "11:30", "7:15");
        raw.day_of_week = Some("???".to_string());
        let rec = &Normalizer::normalize(&[raw]).unwrap()[0];
        // 2024-09-03 was a Tuesday
        assert_eq!(rec.day_of_week, DayOfWeek::Tue);
        assert!(rec.quality_flags.contains(&QualityFlag::DayOfWeekDerived));
    }

    #[test]
    fn covariates_parse_and_degrade() {
        let mut raw = make_raw("2024-09-03", "11:30", "7:15");
        raw.score_smartwatch = Some("86".to_string());
        raw.rating_smartwatch = Some("Good".to_string());
        raw.melatonin = Some("Yes".to_string());
        raw.hour_finished_eating_by = Some("7.5".to_string());
        raw.hour_finished_screen_time_by = Some("pretty late".to_string());

        let rec = &Normalizer::normalize(&[raw]).unwrap()[0];
        assert_eq!(rec.score_smartwatch, Some(86.0));
        assert_eq!(rec.rating_smartwatch, Some(Rating::Good));
        assert_eq!(rec.melatonin, Some(true));
        assert_eq!(rec.hour_finished_eating_by, Some(7.5));
        assert_eq!(rec.hour_finished_screen_time_by, None);
        assert!(rec
            .quality_flags
            .contains(&QualityFlag::UnparseableScreenHour));
    }

    #[test]
    fn normalization_is_deterministic() {
        let rows = vec![
            make_raw("2024-09-03", "11:30", "7:15"),
            make_raw("2024-09-04", "10:05", "6:50"),
        ];
        let first = Normalizer::normalize(&rows).unwrap();
        let second = Normalizer::normalize(&rows).unwrap();
        assert_eq!(first, second);
    }
}
