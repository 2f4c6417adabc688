//! Chart consumers
//!
//! Each chart is a pure function of the normalized table (plus thresholds
//! where coloring depends on them) producing a render-ready model that
//! carries its output filename. Rendering to an image is a collaborator
//! concern; nothing here touches the filesystem or mutates the shared table.
//!
//! Every consumer filters the rows it needs explicitly rather than relying
//! on an upfront drop, so a row missing its stop time still contributes to
//! charts that only need the score or the day of week.

use crate::bucket::{Band, Bucket, Thresholds};
use crate::types::{DayOfWeek, NormalizedSleepRecord, Rating};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DURATION_SERIES_FILE: &str = "sleep_duration_over_time.png";
pub const DURATION_HISTOGRAM_FILE: &str = "sleep_duration_histogram.png";
pub const SESSION_SPANS_FILE: &str = "sleep_times_each_day.png";
pub const DURATION_BY_DAY_FILE: &str = "sleep_duration_by_day_of_week.png";
pub const START_TIME_SERIES_FILE: &str = "sleep_start_time.png";
pub const START_TIME_BY_DAY_FILE: &str = "sleep_start_time_by_day_of_week.png";
pub const WATCH_COMPARISON_FILE: &str = "calculated_vs_smartwatch_duration.png";

/// Smoothing factor for the trend overlays
pub const SMOOTHING_ALPHA: f64 = 0.05;

/// Histogram bin width in hours
pub const HISTOGRAM_BIN_WIDTH: f64 = 0.25;

/// One dated value in a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A dated series with its smoothed overlay and optional background bands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub points: Vec<SeriesPoint>,
    pub smoothed: Vec<SeriesPoint>,
    pub bands: Vec<Band>,
    pub filename: &'static str,
}

/// One histogram bin [lo, hi) with its bucket color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramChart {
    pub bins: Vec<HistogramBin>,
    pub bin_width: f64,
    pub filename: &'static str,
}

/// One session drawn as a horizontal span on the shifted timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSpan {
    pub date: NaiveDate,
    pub start_time_hr: f64,
    pub stop_time_hr: f64,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionChart {
    pub spans: Vec<SessionSpan>,
    pub filename: &'static str,
}

/// Five-number summary for one day's box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub day: DayOfWeek,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

/// Box plots per day of week, always in Sun..Sat order; days with no data
/// are omitted but never reordered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotChart {
    pub boxes: Vec<BoxStats>,
    pub filename: &'static str,
}

/// One point comparing calculated hours against the watch's decimal hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchComparisonPoint {
    pub calculated_hours: f64,
    pub watch_hours: f64,
    pub rating: Option<Rating>,
    /// The most recent comparable session, drawn with a halo
    pub most_recent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchComparisonChart {
    pub points: Vec<WatchComparisonPoint>,
    pub filename: &'static str,
}

/// Duration over time with threshold bands behind the series
pub fn duration_series(rows: &[NormalizedSleepRecord], thresholds: Thresholds) -> TrendChart {
    let points: Vec<SeriesPoint> = rows
        .iter()
        .filter_map(|rec| {
            rec.duration.map(|value| SeriesPoint {
                date: rec.date,
                value,
            })
        })
        .collect();

    let bands = match value_range(&points) {
        Some((lo, hi)) => thresholds.bands(lo, hi),
        None => Vec::new(),
    };

    TrendChart {
        smoothed: smooth(&points),
        points,
        bands,
        filename: DURATION_SERIES_FILE,
    }
}

/// Start time over time; no bands, the axis is the shifted timeline
pub fn start_time_series(rows: &[NormalizedSleepRecord]) -> TrendChart {
    let points: Vec<SeriesPoint> = rows
        .iter()
        .filter_map(|rec| {
            rec.start_time_hr.map(|value| SeriesPoint {
                date: rec.date,
                value,
            })
        })
        .collect();

    TrendChart {
        smoothed: smooth(&points),
        points,
        bands: Vec::new(),
        filename: START_TIME_SERIES_FILE,
    }
}

/// Duration histogram on bin-width-aligned edges with bucket coloring
pub fn duration_histogram(
    rows: &[NormalizedSleepRecord],
    thresholds: Thresholds,
) -> HistogramChart {
    let durations: Vec<f64> = rows.iter().filter_map(|rec| rec.duration).collect();

    let mut bins = Vec::new();
    if let (Some(min), Some(max)) = (
        durations.iter().cloned().reduce(f64::min),
        durations.iter().cloned().reduce(f64::max),
    ) {
        let width = HISTOGRAM_BIN_WIDTH;
        let lo_edge = (min / width).floor() * width;
        let hi_edge = (max / width).ceil() * width;
        let bin_count = (((hi_edge - lo_edge) / width).round() as usize).max(1);

        for i in 0..bin_count {
            let lo = lo_edge + width * i as f64;
            let hi = lo + width;
            // Last bin absorbs the upper edge so the max value is counted
            let count = durations
                .iter()
                .filter(|&&d| d >= lo && (d < hi || (i == bin_count - 1 && d <= hi)))
                .count();
            bins.push(HistogramBin {
                lo,
                hi,
                count,
                bucket: thresholds.bin_bucket(lo, hi),
            });
        }
    }

    HistogramChart {
        bins,
        bin_width: HISTOGRAM_BIN_WIDTH,
        filename: DURATION_HISTOGRAM_FILE,
    }
}

/// One colored span per session on the shifted timeline
pub fn session_spans(rows: &[NormalizedSleepRecord], thresholds: Thresholds) -> SessionChart {
    let spans = rows
        .iter()
        .filter_map(|rec| {
            let (start, stop, duration) = match (rec.start_time_hr, rec.stop_time_hr, rec.duration)
            {
                (Some(a), Some(b), Some(d)) => (a, b, d),
                _ => return None,
            };
            Some(SessionSpan {
                date: rec.date,
                start_time_hr: start,
                stop_time_hr: stop,
                bucket: thresholds.bucket(duration),
            })
        })
        .collect();

    SessionChart {
        spans,
        filename: SESSION_SPANS_FILE,
    }
}

/// Duration box plots grouped by day of week
pub fn duration_by_day_of_week(rows: &[NormalizedSleepRecord]) -> BoxPlotChart {
    BoxPlotChart {
        boxes: boxes_by_day(rows, |rec| rec.duration),
        filename: DURATION_BY_DAY_FILE,
    }
}

/// Start-time box plots grouped by day of week
pub fn start_time_by_day_of_week(rows: &[NormalizedSleepRecord]) -> BoxPlotChart {
    BoxPlotChart {
        boxes: boxes_by_day(rows, |rec| rec.start_time_hr),
        filename: START_TIME_BY_DAY_FILE,
    }
}

/// Calculated vs smartwatch duration for rows where both are known
pub fn calculated_vs_watch(rows: &[NormalizedSleepRecord]) -> WatchComparisonChart {
    let mut points: Vec<WatchComparisonPoint> = rows
        .iter()
        .filter_map(|rec| {
            let calculated = rec.duration?;
            let watch = rec.duration_smartwatch.as_deref()?;
            let minutes = crate::features::parse_watch_minutes(watch)?;
            Some(WatchComparisonPoint {
                calculated_hours: calculated,
                watch_hours: minutes as f64 / 60.0,
                rating: rec.rating_smartwatch,
                most_recent: false,
            })
        })
        .collect();

    if let Some(last) = points.last_mut() {
        last.most_recent = true;
    }

    WatchComparisonChart {
        points,
        filename: WATCH_COMPARISON_FILE,
    }
}

/// Median start time per day of week, Sun..Sat; `None` for days without data
pub fn median_start_by_day_of_week(
    rows: &[NormalizedSleepRecord],
) -> Vec<(DayOfWeek, Option<f64>)> {
    DayOfWeek::ALL
        .iter()
        .map(|&day| {
            let mut values: Vec<f64> = rows
                .iter()
                .filter(|rec| rec.day_of_week == day)
                .filter_map(|rec| rec.start_time_hr)
                .collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            (day, median_sorted(&values))
        })
        .collect()
}

fn boxes_by_day(
    rows: &[NormalizedSleepRecord],
    metric: impl Fn(&NormalizedSleepRecord) -> Option<f64>,
) -> Vec<BoxStats> {
    DayOfWeek::ALL
        .iter()
        .filter_map(|&day| {
            let mut values: Vec<f64> = rows
                .iter()
                .filter(|rec| rec.day_of_week == day)
                .filter_map(&metric)
                .collect();
            if values.is_empty() {
                return None;
            }
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            Some(BoxStats {
                day,
                min: values[0],
                q1: quantile_sorted(&values, 0.25),
                median: quantile_sorted(&values, 0.5),
                q3: quantile_sorted(&values, 0.75),
                max: values[values.len() - 1],
                count: values.len(),
            })
        })
        .collect()
}

/// Exponentially weighted moving average, non-adjusted: the first value
/// seeds the series and each step blends with factor alpha.
fn smooth(points: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let mut smoothed = Vec::with_capacity(points.len());
    let mut state: Option<f64> = None;
    for point in points {
        let next = match state {
            Some(prev) => SMOOTHING_ALPHA * point.value + (1.0 - SMOOTHING_ALPHA) * prev,
            None => point.value,
        };
        state = Some(next);
        smoothed.push(SeriesPoint {
            date: point.date,
            value: next,
        });
    }
    smoothed
}

/// Linear-interpolation quantile over a sorted slice
fn quantile_sorted(values: &[f64], q: f64) -> f64 {
    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        values[lower]
    } else {
        let weight = position - lower as f64;
        values[lower] * (1.0 - weight) + values[upper] * weight
    }
}

fn median_sorted(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(quantile_sorted(values, 0.5))
    }
}

fn value_range(points: &[SeriesPoint]) -> Option<(f64, f64)> {
    let min = points.iter().map(|p| p.value).reduce(f64::min)?;
    let max = points.iter().map(|p| p.value).reduce(f64::max)?;
    Some((min, max))
}
