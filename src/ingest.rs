//! CSV ingestion
//!
//! Reads a sleep-log CSV (UTF-8, header row required) into raw records.
//! Required columns are `date`, `start`, and `stop`; the rest are optional
//! and unrecognized columns pass through untouched. A missing required column
//! is a file-level failure before any row is produced.

use crate::error::SleepError;
use crate::types::RawSleepRecord;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;

/// Columns that must be present in the header row
pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "start", "stop"];

/// Optional columns recognized by the normalizer
pub const OPTIONAL_COLUMNS: [&str; 7] = [
    "duration_smartwatch",
    "score_smartwatch",
    "rating_smartwatch",
    "day_of_week",
    "melatonin",
    "hour_finished_eating_by",
    "hour_finished_screen_time_by",
];

/// Header positions resolved once per file
struct ColumnIndex {
    date: usize,
    start: usize,
    stop: usize,
    duration_smartwatch: Option<usize>,
    score_smartwatch: Option<usize>,
    rating_smartwatch: Option<usize>,
    day_of_week: Option<usize>,
    melatonin: Option<usize>,
    hour_finished_eating_by: Option<usize>,
    hour_finished_screen_time_by: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, SleepError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| SleepError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            date: require("date")?,
            start: require("start")?,
            stop: require("stop")?,
            duration_smartwatch: find("duration_smartwatch"),
            score_smartwatch: find("score_smartwatch"),
            rating_smartwatch: find("rating_smartwatch"),
            day_of_week: find("day_of_week"),
            melatonin: find("melatonin"),
            hour_finished_eating_by: find("hour_finished_eating_by"),
            hour_finished_screen_time_by: find("hour_finished_screen_time_by"),
        })
    }
}

/// Read raw records from any reader
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawSleepRecord>, SleepError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnIndex::resolve(csv_reader.headers()?)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        records.push(to_raw_record(&row, &columns));
    }
    Ok(records)
}

/// Read raw records from an in-memory CSV string
pub fn read_records_from_str(data: &str) -> Result<Vec<RawSleepRecord>, SleepError> {
    read_records(data.as_bytes())
}

/// Read raw records from a file path
pub fn read_records_from_path(path: &Path) -> Result<Vec<RawSleepRecord>, SleepError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns = ColumnIndex::resolve(csv_reader.headers()?)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        records.push(to_raw_record(&row, &columns));
    }
    Ok(records)
}

fn to_raw_record(row: &StringRecord, columns: &ColumnIndex) -> RawSleepRecord {
    RawSleepRecord {
        date: row.get(columns.date).unwrap_or_default().trim().to_string(),
        start_raw: cell(row, Some(columns.start)),
        stop_raw: cell(row, Some(columns.stop)),
        duration_smartwatch: cell(row, columns.duration_smartwatch),
        score_smartwatch: cell(row, columns.score_smartwatch),
        rating_smartwatch: cell(row, columns.rating_smartwatch),
        day_of_week: cell(row, columns.day_of_week),
        melatonin: cell(row, columns.melatonin),
        hour_finished_eating_by: cell(row, columns.hour_finished_eating_by),
        hour_finished_screen_time_by: cell(row, columns.hour_finished_screen_time_by),
    }
}

/// Extract a cell by optional column position; empty cells become `None`
fn cell(row: &StringRecord, index: Option<usize>) -> Option<String> {
    let value = row.get(index?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
date,start,stop,duration_smartwatch,score_smartwatch,rating_smartwatch,day_of_week,melatonin,hour_finished_eating_by,hour_finished_screen_time_by
2024-09-03,11:30,7:15,7:45,86,Good,Tue,Yes,19.5,22
2024-09-04,10:45,6:30,,74,Fair,Wed,No,20,21.5
";

    #[test]
    fn reads_all_columns() {
        let records = read_records_from_str(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.date, "2024-09-03");
        assert_eq!(first.start_raw.as_deref(), Some("11:30"));
        assert_eq!(first.stop_raw.as_deref(), Some("7:15"));
        assert_eq!(first.duration_smartwatch.as_deref(), Some("7:45"));
        assert_eq!(first.score_smartwatch.as_deref(), Some("86"));
        assert_eq!(first.day_of_week.as_deref(), Some("Tue"));
    }

    #[test]
    fn empty_cells_become_none() {
        let records = read_records_from_str(SAMPLE).unwrap();
        assert_eq!(records[1].duration_smartwatch, None);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let data = "date,start\n2024-09-03,11:30\n";
        match read_records_from_str(data) {
            Err(SleepError::MissingColumn(name)) => assert_eq!(name, "stop"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn missing_optional_columns_tolerated() {
        let data = "date,start,stop\n2024-09-03,11:30,7:15\n";
        let records = read_records_from_str(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score_smartwatch, None);
        assert_eq!(records[0].day_of_week, None);
    }

    #[test]
    fn unrecognized_columns_pass_through() {
        let data = "date,start,stop,notes\n2024-09-03,11:30,7:15,slept fine\n";
        let records = read_records_from_str(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "2024-09-03");
    }

    #[test]
    fn short_rows_degrade_to_missing() {
        let data = "date,start,stop,score_smartwatch\n2024-09-03,11:30,7:15\n";
        let records = read_records_from_str(data).unwrap();
        assert_eq!(records[0].score_smartwatch, None);
    }
}
