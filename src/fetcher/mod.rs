//! Browser-driven fetchers.
//!
//! Both fetchers borrow the crawl's single [`PageSession`](crate::session::PageSession)
//! per call and hand the page content to [`extractor`](crate::extractor).

pub mod detail;
pub mod listing_list;

pub use detail::DetailFetcher;
pub use listing_list::{ListingListFetcher, RegionListing};
