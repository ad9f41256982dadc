//! Pure extraction from page content.
//!
//! Everything here works on HTML strings or JSON values captured by a
//! [`PageSession`](crate::session::PageSession) and never touches the
//! browser, so each field can be tested on a fixture.
//!
//! Extraction is best-effort: functions return [`ExtractError`] and the
//! callers in [`fetcher`](crate::fetcher) decide which sentinel to substitute.

pub mod detail;
pub mod review;
pub mod search;

pub use detail::{DetailExtraction, DetailField};
pub use review::{count_foreign_reviews, is_local_script};
pub use search::{extract_listing_refs, reported_total};

use scraper::Selector;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("no element matches `{0}`")]
    MissingElement(String),

    #[error("element `{selector}` has no attribute `{attribute}`")]
    MissingAttribute {
        selector: String,
        attribute: &'static str,
    },

    #[error("could not parse {field} from {value:?}")]
    Parse { field: &'static str, value: String },

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("malformed structured data: {0}")]
    Malformed(String),
}

pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::InvalidSelector(format!("{}: {:?}", css, e)))
}

/// First run of ASCII digits in `s`, ignoring `,` thousands separators.
pub(crate) fn first_number(s: &str) -> Option<u64> {
    let cleaned = s.replace(',', "");
    let digits: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
