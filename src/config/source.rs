use serde::{Deserialize, Serialize};

/// Where listings come from and how their pages are laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site root used for search and detail URLs
    pub base_url: String,

    /// Map zoom level sent with every search
    pub zoom: u32,

    /// Days from today to the searched check-in date (check-out is one day later)
    pub checkin_offset_days: u64,

    /// Substring identifying the structured search response on the network
    pub search_response_pattern: String,

    /// Control that advances the result list by one page
    pub next_page_selector: String,

    /// Text in a calendar cell's aria-label marking the day as not bookable
    pub unavailable_marker: String,

    /// Button opening the full review list on a detail page
    pub show_all_reviews_selector: String,

    /// Scrollable container holding the expanded review list
    pub review_container_selector: String,

    /// Element holding one review's body text
    pub review_text_selector: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.airbnb.co.kr".to_string(),
            zoom: 12,
            checkin_offset_days: 7,
            search_response_pattern: "StaysSearch".to_string(),
            next_page_selector: "[aria-label='다음']".to_string(),
            unavailable_marker: "예약 불가능합니다".to_string(),
            show_all_reviews_selector: "button[data-testid='pdp-show-all-reviews-button']"
                .to_string(),
            review_container_selector:
                "[data-testid='pdp-reviews-modal-scrollable-panel']".to_string(),
            review_text_selector: "[data-review-id] span[class] > span".to_string(),
        }
    }
}
