//! When is a region's result list too large to trust?
//!
//! The source shows at most [`MAX_RESULT_PAGES`] pages of
//! [`RESULTS_PER_PAGE`] listings for any map area, so a region reporting
//! more than that has listings we can never see from this zoom level.

use std::fmt;

/// Unique or reported count at which a region is split into quadrants.
pub const SATURATION_THRESHOLD: u64 = 250;

pub const MAX_RESULT_PAGES: u32 = 15;
pub const RESULTS_PER_PAGE: u64 = 18;

/// Most listings the result pages can ever show for one region.
pub const VISIBLE_RESULT_CEILING: u64 = MAX_RESULT_PAGES as u64 * RESULTS_PER_PAGE;

pub fn needs_split(unique_count: u64, reported_total: u64) -> bool {
    needs_split_at(unique_count, reported_total, SATURATION_THRESHOLD)
}

pub fn needs_split_at(unique_count: u64, reported_total: u64, threshold: u64) -> bool {
    unique_count >= threshold || reported_total >= threshold
}

/// How much of the visible result list a region fetch actually got.
///
/// Informational only; splitting is decided by [`needs_split`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionDiagnostics {
    pub unique_count: u64,
    pub reported_total: u64,
    pub base: u64,
    /// Visible listings that were not collected; negative when the pages
    /// held more unique listings than the heading reported
    pub failed_count: i64,
    pub failed_rate: Option<f64>,
}

impl CollectionDiagnostics {
    pub fn new(unique_count: u64, reported_total: u64) -> Self {
        let base = reported_total.min(VISIBLE_RESULT_CEILING);
        let failed_count = base as i64 - unique_count as i64;
        let failed_rate = (base > 0).then(|| failed_count as f64 / base as f64);

        Self {
            unique_count,
            reported_total,
            base,
            failed_count,
            failed_rate,
        }
    }
}

impl fmt::Display for CollectionDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unique={} reported={} base={} failed={}",
            self.unique_count, self.reported_total, self.base, self.failed_count
        )?;
        match self.failed_rate {
            Some(rate) => write!(f, " failed_rate={:.1}%", rate * 100.0),
            None => write!(f, " failed_rate=n/a"),
        }
    }
}
