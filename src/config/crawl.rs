use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::collector::saturation::{MAX_RESULT_PAGES, SATURATION_THRESHOLD};

/// Pacing and limits for one crawl.
///
/// The delays exist to stay under the source's anti-scraping radar; none of
/// them is needed for correctness and all can be zero in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlPolicy {
    /// Pause before each region fetch, in milliseconds (default: 3000)
    pub region_delay_ms: u64,

    /// Pause after each result page, in milliseconds (default: 3000)
    pub page_delay_ms: u64,

    /// How long to wait for the structured search response, in milliseconds (default: 8000)
    pub capture_timeout_ms: u64,

    /// Result pages read per region before giving up on "next" (default: 15)
    pub max_pages: u32,

    /// Unique or reported listing count at which a region is split (default: 250)
    pub saturation_threshold: u64,

    /// Deepest quadrant level explored below the requested region (default: 16)
    pub max_depth: u32,

    /// Regions narrower than this many degrees on either axis are not split further
    pub min_region_span: f64,

    /// Upper bound on scroll rounds while expanding a review list (default: 50)
    pub max_review_scrolls: u32,

    /// Settle time after each review scroll, in milliseconds (default: 1500)
    pub review_settle_ms: u64,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            region_delay_ms: 3000,
            page_delay_ms: 3000,
            capture_timeout_ms: 8000,
            max_pages: MAX_RESULT_PAGES,
            saturation_threshold: SATURATION_THRESHOLD,
            max_depth: 16,
            min_region_span: 0.0001,
            max_review_scrolls: 50,
            review_settle_ms: 1500,
        }
    }
}

impl CrawlPolicy {
    pub fn region_delay(&self) -> Duration {
        Duration::from_millis(self.region_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn review_settle(&self) -> Duration {
        Duration::from_millis(self.review_settle_ms)
    }

    /// No pauses at all; used by tests and dry runs against fixtures.
    pub fn without_delays() -> Self {
        Self {
            region_delay_ms: 0,
            page_delay_ms: 0,
            review_settle_ms: 0,
            ..Default::default()
        }
    }
}
