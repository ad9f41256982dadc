pub mod listing;
pub mod query;
pub mod region;

pub use listing::{ListingDetail, ListingRecord, ListingRef, COUNT_UNKNOWN, RATING_UNKNOWN};
pub use query::{CollectRequest, ListingQuery, SearchUrlBuilder};
pub use region::{Coordinate, GeoRegion};
