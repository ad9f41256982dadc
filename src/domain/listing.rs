use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::region::Coordinate;

/// A listing id and map position as found on a search result page.
///
/// Identity is the id alone; two refs with different coordinates but the
/// same id are the same listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRef {
    pub id: String,
    pub coordinate: Coordinate,
}

impl ListingRef {
    pub fn new(id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            coordinate,
        }
    }
}

impl PartialEq for ListingRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ListingRef {}

impl Hash for ListingRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub const RATING_UNKNOWN: f64 = -1.0;
pub const COUNT_UNKNOWN: i64 = -1;

/// Attributes scraped from a listing's detail page.
///
/// Fields that could not be extracted hold the sentinels
/// [`RATING_UNKNOWN`] / [`COUNT_UNKNOWN`], an empty title or an empty
/// option list. A sentinel means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDetail {
    pub title: String,
    pub rating: f64,
    pub review_count: i64,
    pub foreigner_review_count: i64,
    pub option_list: BTreeSet<String>,
    pub reserved_count: i64,
}

impl ListingDetail {
    pub fn failed() -> Self {
        Self {
            title: String::new(),
            rating: RATING_UNKNOWN,
            review_count: COUNT_UNKNOWN,
            foreigner_review_count: COUNT_UNKNOWN,
            option_list: BTreeSet::new(),
            reserved_count: COUNT_UNKNOWN,
        }
    }
}

/// One listing snapshot for one collection day. Keyed by `(id, collect_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub collect_date: NaiveDate,
    pub region_name: String,
    pub coordinate: Coordinate,
    pub title: String,
    pub rating: f64,
    pub review_count: i64,
    pub foreigner_review_count: i64,
    pub option_list: BTreeSet<String>,
    pub reserved_count: i64,
    pub collect_count: i64,
}

impl ListingRecord {
    pub fn from_detail(
        listing: &ListingRef,
        region_name: &str,
        collect_date: NaiveDate,
        detail: ListingDetail,
    ) -> Self {
        Self {
            id: listing.id.clone(),
            collect_date,
            region_name: region_name.to_string(),
            coordinate: listing.coordinate,
            title: detail.title,
            rating: detail.rating,
            review_count: detail.review_count,
            foreigner_review_count: detail.foreigner_review_count,
            option_list: detail.option_list,
            reserved_count: detail.reserved_count,
            collect_count: 0,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
