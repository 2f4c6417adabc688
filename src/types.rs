//! Core types for the sleepline pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw log rows as entered, and normalized records on the shifted
//! numeric timeline.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Day of week as an ordinal categorical, canonical order Sun..Sat.
///
/// Grouped output always follows this order regardless of input row order;
/// the order is positional, never alphabetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    /// All days in canonical display order
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sun,
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Sun => "Sun",
            DayOfWeek::Mon => "Mon",
            DayOfWeek::Tue => "Tue",
            DayOfWeek::Wed => "Wed",
            DayOfWeek::Thu => "Thu",
            DayOfWeek::Fri => "Fri",
            DayOfWeek::Sat => "Sat",
        }
    }

    /// Parse an abbreviated or full day name, case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sun" | "sunday" => Some(DayOfWeek::Sun),
            "mon" | "monday" => Some(DayOfWeek::Mon),
            "tue" | "tues" | "tuesday" => Some(DayOfWeek::Tue),
            "wed" | "wednesday" => Some(DayOfWeek::Wed),
            "thu" | "thur" | "thurs" | "thursday" => Some(DayOfWeek::Thu),
            "fri" | "friday" => Some(DayOfWeek::Fri),
            "sat" | "saturday" => Some(DayOfWeek::Sat),
            _ => None,
        }
    }

    /// Day of week for a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sun => DayOfWeek::Sun,
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thu,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
        }
    }
}

/// Smartwatch-reported sleep rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Good,
    Fair,
    Poor,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Poor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "good" => Some(Rating::Good),
            "fair" => Some(Rating::Fair),
            "poor" => Some(Rating::Poor),
            _ => None,
        }
    }
}

/// Quality flag recording a row-scoped data issue.
///
/// Flags never abort a run; consumers that need the affected field filter the
/// row out explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    MissingStartTime,
    MissingStopTime,
    UnparseableScore,
    UnparseableRating,
    UnparseableMelatonin,
    UnparseableEatingHour,
    UnparseableScreenHour,
    DayOfWeekDerived,
}

/// One sleep-log row exactly as entered, prior to any parsing beyond the
/// CSV cell split. Empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSleepRecord {
    /// Calendar date of the evening the session began ("night of")
    pub date: String,
    /// Clock-time string for falling asleep, as entered
    pub start_raw: Option<String>,
    /// Clock-time string for waking up, as entered
    pub stop_raw: Option<String>,
    /// Smartwatch duration as "H:MM"
    pub duration_smartwatch: Option<String>,
    /// Smartwatch score, 0-100
    pub score_smartwatch: Option<String>,
    /// Smartwatch rating: Good / Fair / Poor
    pub rating_smartwatch: Option<String>,
    /// Day-of-week column, when the log supplies one
    pub day_of_week: Option<String>,
    /// Melatonin taken that evening
    pub melatonin: Option<String>,
    /// Evening clock hour the last meal ended (e.g. 7.5 for 7:30pm)
    pub hour_finished_eating_by: Option<String>,
    /// Evening clock hour screen use ended
    pub hour_finished_screen_time_by: Option<String>,
}

/// One sleep session on the shifted numeric timeline.
///
/// `start_time_hr` and `stop_time_hr` are hours offset from midnight of the
/// night after `date`: evening starts land in roughly [-24, 0), morning stops
/// in [0, 24), so a session crossing midnight sits on one continuous axis.
/// Rows with missing raw times keep `None` in every derived numeric field and
/// are retained for consumers that do not need them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSleepRecord {
    pub date: NaiveDate,
    pub start_raw: Option<String>,
    pub stop_raw: Option<String>,
    /// Shifted start timestamp (raw start + 12h)
    pub start_ts: Option<NaiveDateTime>,
    /// Shifted stop timestamp (raw stop + 1 day)
    pub stop_ts: Option<NaiveDateTime>,
    /// Hours from the anchor midnight, negative for evening starts
    pub start_time_hr: Option<f64>,
    /// Hours from the anchor midnight into the following morning
    pub stop_time_hr: Option<f64>,
    /// Session length in hours, always >= 0 when present
    pub duration: Option<f64>,
    pub day_of_week: DayOfWeek,
    /// Smartwatch duration string, converted on demand by the feature table
    pub duration_smartwatch: Option<String>,
    pub score_smartwatch: Option<f64>,
    pub rating_smartwatch: Option<Rating>,
    pub melatonin: Option<bool>,
    pub hour_finished_eating_by: Option<f64>,
    pub hour_finished_screen_time_by: Option<f64>,
    /// Row-scoped data issues found during normalization
    pub quality_flags: Vec<QualityFlag>,
}

impl NormalizedSleepRecord {
    /// True when both shifted timestamps derived from parseable raw times
    pub fn has_timing(&self) -> bool {
        self.start_ts.is_some() && self.stop_ts.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_of_week_canonical_order() {
        let names: Vec<&str> = DayOfWeek::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
    }

    #[test]
    fn day_of_week_parse_variants() {
        assert_eq!(DayOfWeek::parse("Sun"), Some(DayOfWeek::Sun));
        assert_eq!(DayOfWeek::parse("tuesday"), Some(DayOfWeek::Tue));
        assert_eq!(DayOfWeek::parse(" Thurs "), Some(DayOfWeek::Thu));
        assert_eq!(DayOfWeek::parse("Funday"), None);
    }

    #[test]
    fn day_of_week_from_date() {
        // 2024-09-03 was a Tuesday
        let date = NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
        assert_eq!(DayOfWeek::from_date(date), DayOfWeek::Tue);
    }

    #[test]
    fn rating_parse_is_case_insensitive() {
        assert_eq!(Rating::parse("good"), Some(Rating::Good));
        assert_eq!(Rating::parse("POOR"), Some(Rating::Poor));
        assert_eq!(Rating::parse("meh"), None);
    }
}
