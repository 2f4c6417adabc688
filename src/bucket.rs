//! Threshold policy
//!
//! A continuous metric is classified into one of three ordered buckets by two
//! cut points: `ry` (poor/fair boundary) and `yg` (fair/good boundary). The
//! same policy serves per-record coloring, axis background banding, and
//! histogram bin coloring.

use crate::error::SleepError;
use serde::{Deserialize, Serialize};

/// Ternary classification of a metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Poor,
    Fair,
    Good,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Poor => "poor",
            Bucket::Fair => "fair",
            Bucket::Good => "good",
        }
    }

    /// Render color associated with the bucket
    pub fn color(&self) -> &'static str {
        match self {
            Bucket::Poor => "red",
            Bucket::Fair => "yellow",
            Bucket::Good => "green",
        }
    }
}

/// One contiguous sub-interval of an axis range assigned to a bucket.
///
/// `lo` is inclusive; `hi` is exclusive except for the last band of a range,
/// which absorbs the range's upper endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub bucket: Bucket,
    pub lo: f64,
    pub hi: f64,
}

/// A pair of bucket cut points, `ry < yg`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Poor/fair boundary
    pub ry: f64,
    /// Fair/good boundary
    pub yg: f64,
}

/// Sleep duration thresholds in hours
pub const DURATION_THRESHOLDS: Thresholds = Thresholds { ry: 6.5, yg: 7.5 };

/// Smartwatch score thresholds on the 0-100 scale
pub const SCORE_THRESHOLDS: Thresholds = Thresholds { ry: 60.0, yg: 80.0 };

impl Thresholds {
    pub fn new(ry: f64, yg: f64) -> Result<Self, SleepError> {
        if ry < yg {
            Ok(Self { ry, yg })
        } else {
            Err(SleepError::InvalidThresholds { ry, yg })
        }
    }

    /// Classify a single value. Total over the reals: `>= yg` is Good,
    /// `>= ry` is Fair, anything below is Poor.
    pub fn bucket(&self, value: f64) -> Bucket {
        if value >= self.yg {
            Bucket::Good
        } else if value >= self.ry {
            Bucket::Fair
        } else {
            Bucket::Poor
        }
    }

    /// Split an axis range [lo, hi] into up to three bucket bands, clipped to
    /// the range. Empty bands are omitted.
    pub fn bands(&self, lo: f64, hi: f64) -> Vec<Band> {
        let mut bands = Vec::with_capacity(3);
        let edges = [
            (Bucket::Poor, lo, hi.min(self.ry)),
            (Bucket::Fair, lo.max(self.ry), hi.min(self.yg)),
            (Bucket::Good, lo.max(self.yg), hi),
        ];
        for (bucket, band_lo, band_hi) in edges {
            if band_lo < band_hi {
                bands.push(Band {
                    bucket,
                    lo: band_lo,
                    hi: band_hi,
                });
            }
        }
        bands
    }

    /// Classify a histogram bin [lo, hi). A bin is Poor only when it lies
    /// entirely at or below `ry`, Good only when entirely at or above `yg`;
    /// a bin straddling either cut point is Fair.
    pub fn bin_bucket(&self, lo: f64, hi: f64) -> Bucket {
        if hi <= self.ry {
            Bucket::Poor
        } else if lo >= self.yg {
            Bucket::Good
        } else {
            Bucket::Fair
        }
    }
}
