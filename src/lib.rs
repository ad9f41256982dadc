//! # stayscan
//!
//! Collects short-term rental listings for a map region by driving a
//! browser through the listing site's search and detail pages.
//!
//! ## Architecture
//!
//! ```text
//! CollectRequest → Collector ─┬→ ListingListFetcher ─┐
//!                   (region   └→ DetailFetcher ──────┼→ PageSession (Chrome)
//!                    stack)          │               │
//!                                    ▼               ▼
//!                              ListingStore     extractor
//! ```
//!
//! A search only ever shows a bounded number of results, so a region whose
//! result list looks saturated is split into four quadrants and each one is
//! searched again, depth first.
//!
//! ## Quick Start
//!
//! ```bash
//! # Collect a region
//! stayscan collect --request '{"sido": "대전광역시", "ne_lat": 36.49,
//!     "ne_lng": 127.56, "sw_lat": 36.19, "sw_lng": 127.25}'
//!
//! # Show what was collected today
//! stayscan list
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the loaded
/// configuration and the store.
pub mod app;

/// Command-line interface using clap.
///
/// - `collect --request <json>` - Collect every listing in a region
/// - `list [--date YYYY-MM-DD]` - Show listings collected on a day
pub mod cli;

/// Region-splitting collection controller, dedup cache and run summary.
pub mod collector;

/// Configuration loaded from `~/.config/stayscan/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`GeoRegion`](domain::GeoRegion): Bounding box with quadrant splitting
/// - [`ListingQuery`](domain::ListingQuery): One region search for one night
/// - [`ListingRecord`](domain::ListingRecord): A listing snapshot for one day
pub mod domain;

/// Field extraction from captured page content.
pub mod extractor;

/// Result-page and detail-page fetchers.
pub mod fetcher;

/// Browser page session.
///
/// - [`PageSession`](session::PageSession): Async trait the fetchers drive
/// - [`ChromeSession`](session::ChromeSession): chromiumoxide implementation
pub mod session;

/// SQLite persistence layer.
///
/// - [`ListingStore`](store::ListingStore): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
