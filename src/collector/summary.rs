use std::fmt;

use tracing::info;

/// Counters for one collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub regions_visited: u64,
    pub splits: u64,
    /// Saturated regions not split because of depth or size limits
    pub depth_limited: u64,
    /// Regions whose pagination ended on a session error
    pub aborted_regions: u64,
    pub failed_pages: u64,
    pub refs_seen: u64,
    pub persisted: u64,
    pub skipped_cached: u64,
    pub skipped_existing: u64,
    pub conflicts: u64,
    pub detail_failures: u64,
    pub field_failures: u64,
    pub store_errors: u64,
}

impl RunSummary {
    pub fn log(&self) {
        info!("Collection finished: {}", self);
        if self.depth_limited > 0 {
            info!(
                "{} saturated regions could not be split further; their listings may be incomplete",
                self.depth_limited
            );
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} regions ({} splits, {} aborted), {} listings seen, {} persisted, \
             {} skipped ({} cached, {} already stored), {} conflicts, \
             {} detail failures, {} field failures, {} failed pages, {} store errors",
            self.regions_visited,
            self.splits,
            self.aborted_regions,
            self.refs_seen,
            self.persisted,
            self.skipped_cached + self.skipped_existing,
            self.skipped_cached,
            self.skipped_existing,
            self.conflicts,
            self.detail_failures,
            self.field_failures,
            self.failed_pages,
            self.store_errors
        )
    }
}
