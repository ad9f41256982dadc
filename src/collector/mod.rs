//! Region-splitting collection controller.
//!
//! A search over a map area only ever shows a bounded number of listings.
//! [`Collector::run`] fetches a region, persists every new listing it
//! found, and when the region looks saturated splits it into quadrants and
//! fetches those too, depth first, until each area fits in one result list.

pub mod cache;
pub mod saturation;
pub mod summary;

pub use cache::DedupCache;
pub use summary::RunSummary;

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::config::{CrawlPolicy, SourceConfig};
use crate::domain::{ListingDetail, ListingQuery, ListingRecord, ListingRef, SearchUrlBuilder};
use crate::fetcher::{DetailFetcher, ListingListFetcher, RegionListing};
use crate::session::PageSession;
use crate::store::{InsertOutcome, ListingStore};

use saturation::needs_split_at;

/// Source of the collection day, read once per listing so a run that
/// crosses midnight files later listings under the new day.
pub type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// A region waiting on the work stack, `depth` splits below the request.
#[derive(Debug, Clone)]
struct RegionTask {
    query: ListingQuery,
    depth: u32,
}

pub struct Collector<S: ListingStore> {
    store: Arc<S>,
    lists: ListingListFetcher,
    details: DetailFetcher,
    policy: CrawlPolicy,
    clock: Clock,
    cache: DedupCache,
}

impl<S: ListingStore> Collector<S> {
    pub fn new(
        store: Arc<S>,
        urls: SearchUrlBuilder,
        source: SourceConfig,
        policy: CrawlPolicy,
        clock: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            lists: ListingListFetcher::new(urls.clone(), source.clone(), policy.clone()),
            details: DetailFetcher::new(urls, source, policy.clone()),
            policy,
            clock: Box::new(clock),
            cache: DedupCache::new(),
        }
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    /// Collect every listing in `query`'s region.
    ///
    /// Regions are processed from an explicit stack. Quadrants are pushed
    /// in reverse so they pop in NE, NW, SW, SE order and each subtree is
    /// finished before its next sibling starts.
    pub async fn run(&mut self, session: &dyn PageSession, query: ListingQuery) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut stack = vec![RegionTask { query, depth: 0 }];

        while let Some(task) = stack.pop() {
            summary.regions_visited += 1;
            tokio::time::sleep(self.policy.region_delay()).await;

            info!("Collecting region {} (depth {})", task.query.region, task.depth);
            let listing = match self.lists.fetch(session, &task.query).await {
                Ok(listing) => listing,
                Err(e) => {
                    error!("Skipping region {}: {}", task.query.region, e);
                    continue;
                }
            };

            summary.failed_pages += u64::from(listing.failed_pages);
            if listing.aborted {
                summary.aborted_regions += 1;
            }
            info!("Region {}: {}", task.query.region, listing.diagnostics());

            self.persist_region(session, &task.query, &listing, &mut summary)
                .await;

            let saturated = needs_split_at(
                listing.unique_count(),
                listing.reported_total,
                self.policy.saturation_threshold,
            );
            if !saturated {
                continue;
            }

            if task.depth >= self.policy.max_depth
                || task.query.region.is_degenerate(self.policy.min_region_span)
            {
                warn!(
                    "Region {} is saturated but will not be split (depth {})",
                    task.query.region, task.depth
                );
                summary.depth_limited += 1;
                continue;
            }

            debug!("Splitting region {}", task.query.region);
            summary.splits += 1;
            for quadrant in task.query.region.quadrants().into_iter().rev() {
                stack.push(RegionTask {
                    query: task.query.with_region(quadrant),
                    depth: task.depth + 1,
                });
            }
        }

        summary
    }

    async fn persist_region(
        &mut self,
        session: &dyn PageSession,
        query: &ListingQuery,
        listing: &RegionListing,
        summary: &mut RunSummary,
    ) {
        let mut refs: Vec<&ListingRef> = listing.refs.iter().collect();
        refs.sort_by(|a, b| a.id.cmp(&b.id));

        for listing_ref in refs {
            summary.refs_seen += 1;
            self.persist_listing(session, query, listing_ref, summary).await;
        }
    }

    async fn persist_listing(
        &mut self,
        session: &dyn PageSession,
        query: &ListingQuery,
        listing_ref: &ListingRef,
        summary: &mut RunSummary,
    ) {
        let id = listing_ref.id.as_str();
        let collect_date = (self.clock)();

        if self.cache.contains(id) {
            summary.skipped_cached += 1;
            return;
        }

        match self.store.exists(id, collect_date) {
            Ok(true) => {
                debug!("Listing {} already collected on {}", id, collect_date);
                summary.skipped_existing += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                error!("Failed to look up listing {}: {}", id, e);
                summary.store_errors += 1;
                return;
            }
        }

        // An unreachable page is stored with every field unknown
        let detail = match self.details.fetch(session, id, collect_date).await {
            Ok(extraction) => {
                summary.field_failures += extraction.failed_fields.len() as u64;
                extraction.detail
            }
            Err(e) => {
                warn!("Failed to fetch listing {}, storing it without details: {}", id, e);
                summary.detail_failures += 1;
                ListingDetail::failed()
            }
        };

        let record = ListingRecord::from_detail(listing_ref, &query.sido, collect_date, detail);

        match self.store.insert(&record) {
            Ok(InsertOutcome::Inserted) => {
                debug!("Stored listing {} ({})", id, record.display_title());
                self.cache.insert(id);
                summary.persisted += 1;
            }
            Ok(InsertOutcome::Conflict) => {
                debug!("Listing {} was stored concurrently, keeping the existing row", id);
                summary.conflicts += 1;
            }
            Err(e) => {
                error!("Failed to store listing {}: {}", id, e);
                summary.store_errors += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::{CollectRequest, GeoRegion, COUNT_UNKNOWN, RATING_UNKNOWN};
    use crate::session::mock::{detail_html, listings_in, paged, MockDetail, MockSearch, MockSession};
    use crate::store::SqliteStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 18).unwrap()
    }

    fn root_query() -> ListingQuery {
        let request = CollectRequest::from_json(
            r#"{"sido": "부산광역시", "ne_lat": 35.4, "ne_lng": 129.4,
                "sw_lat": 35.0, "sw_lng": 128.8}"#,
        )
        .unwrap();
        ListingQuery::with_base_date(&request, today(), 7).unwrap()
    }

    fn urls() -> SearchUrlBuilder {
        SearchUrlBuilder::new("https://www.airbnb.co.kr", 12).unwrap()
    }

    fn search_url(query: &ListingQuery) -> String {
        urls().search_url(query).unwrap().to_string()
    }

    fn detail_url(id: &str) -> String {
        urls().detail_url(id).unwrap().to_string()
    }

    fn collector(store: Arc<SqliteStore>, policy: CrawlPolicy) -> Collector<SqliteStore> {
        Collector::new(store, urls(), SourceConfig::default(), policy, today)
    }

    /// Script a region's result pages plus a detail page for each listing.
    fn scripted(
        session: MockSession,
        query: &ListingQuery,
        listings: &[(String, f64, f64)],
        reported_total: u64,
    ) -> MockSession {
        let mut session = session.with_search(
            search_url(query),
            MockSearch {
                pages: paged(listings, 18),
                reported_total,
                deferred: None,
            },
        );
        for (id, _, _) in listings {
            session = session.with_detail(
                detail_url(id),
                MockDetail {
                    html: detail_html(&format!("숙소 {}", id), 4.8, &["Clean", "깨끗해요"]),
                    review_button: false,
                },
            );
        }
        session
    }

    fn searched_regions(session: &MockSession) -> Vec<String> {
        session
            .navigations()
            .into_iter()
            .filter(|url| url.contains("/s/"))
            .collect()
    }

    fn quadrant_query(query: &ListingQuery, index: usize) -> ListingQuery {
        query.with_region(query.region.quadrants()[index])
    }

    #[tokio::test]
    async fn test_unsaturated_region_is_not_split() {
        let query = root_query();
        let listings = listings_in(&query.region, "room", 12);
        let session = scripted(MockSession::new(), &query, &listings, 12);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let summary = collector(store.clone(), CrawlPolicy::without_delays())
            .run(&session, query)
            .await;

        assert_eq!(summary.regions_visited, 1);
        assert_eq!(summary.splits, 0);
        assert_eq!(summary.persisted, 12);
        assert_eq!(store.list_by_date(today()).unwrap().len(), 12);

        let stored = store.get("room-0", today()).unwrap().unwrap();
        assert_eq!(stored.title, "숙소 room-0");
        assert_eq!(stored.region_name, "부산광역시");
        assert_eq!(stored.foreigner_review_count, 1);
    }

    #[tokio::test]
    async fn test_saturated_region_splits_once() {
        let query = root_query();
        let listings = listings_in(&query.region, "room", 20);
        // 300 matches reported while only 20 were visible
        let session = scripted(MockSession::new(), &query, &listings, 300);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let summary = collector(store, CrawlPolicy::without_delays())
            .run(&session, query.clone())
            .await;

        assert_eq!(summary.regions_visited, 5);
        assert_eq!(summary.splits, 1);
        assert_eq!(summary.persisted, 20);

        let expected: Vec<String> = std::iter::once(search_url(&query))
            .chain((0..4).map(|i| search_url(&quadrant_query(&query, i))))
            .collect();
        assert_eq!(searched_regions(&session), expected);
    }

    #[tokio::test]
    async fn test_quadrants_are_reevaluated_depth_first() {
        let query = root_query();
        let ne = quadrant_query(&query, 0);
        let root_listings = listings_in(&query.region, "root", 5);
        let ne_listings = listings_in(&ne.region, "ne", 5);

        let session = scripted(MockSession::new(), &query, &root_listings, 400);
        let session = scripted(session, &ne, &ne_listings, 260);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let summary = collector(store, CrawlPolicy::without_delays())
            .run(&session, query.clone())
            .await;

        assert_eq!(summary.splits, 2);
        assert_eq!(summary.regions_visited, 9);
        assert_eq!(summary.persisted, 10);

        let mut expected = vec![search_url(&query), search_url(&ne)];
        expected.extend((0..4).map(|i| search_url(&quadrant_query(&ne, i))));
        expected.extend((1..4).map(|i| search_url(&quadrant_query(&query, i))));
        assert_eq!(searched_regions(&session), expected);
    }

    #[tokio::test]
    async fn test_cache_prevents_second_detail_fetch() {
        let query = root_query();
        let ne = quadrant_query(&query, 0);
        let shared = listings_in(&ne.region, "shared", 1);

        let session = scripted(MockSession::new(), &query, &shared, 300);
        let session = scripted(session, &ne, &shared, 1);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let mut collector = collector(store, CrawlPolicy::without_delays());
        let summary = collector.run(&session, query).await;

        assert_eq!(session.visits("/rooms/shared-0"), 1);
        assert_eq!(summary.persisted, 1);
        assert_eq!(summary.skipped_cached, 1);
        assert!(collector.cache().contains("shared-0"));
    }

    #[tokio::test]
    async fn test_listing_already_stored_today_is_skipped() {
        let query = root_query();
        let listings = listings_in(&query.region, "room", 2);
        let session = scripted(MockSession::new(), &query, &listings, 2);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let (id, lat, lng) = &listings[0];
        let existing = ListingRecord::from_detail(
            &ListingRef::new(id.clone(), crate::domain::Coordinate::new(*lat, *lng)),
            "부산광역시",
            today(),
            crate::domain::ListingDetail::failed(),
        );
        assert_eq!(store.insert(&existing).unwrap(), InsertOutcome::Inserted);

        let summary = collector(store.clone(), CrawlPolicy::without_delays())
            .run(&session, query)
            .await;

        assert_eq!(summary.skipped_existing, 1);
        assert_eq!(summary.persisted, 1);
        assert_eq!(session.visits("/rooms/room-0"), 0);
        assert_eq!(store.get("room-0", today()).unwrap().unwrap().title, "");
    }

    #[tokio::test]
    async fn test_unreachable_detail_is_stored_with_sentinels() {
        let query = root_query();
        let listings = listings_in(&query.region, "room", 3);
        let mut missing = listings.clone();
        missing.push(("gone".to_string(), 35.2, 129.0));

        let session = scripted(MockSession::new(), &query, &listings, 4).with_search(
            search_url(&query),
            MockSearch {
                pages: paged(&missing, 18),
                reported_total: 4,
                deferred: None,
            },
        );
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let summary = collector(store.clone(), CrawlPolicy::without_delays())
            .run(&session, query)
            .await;

        assert_eq!(summary.refs_seen, 4);
        assert_eq!(summary.detail_failures, 1);
        assert_eq!(summary.persisted, 4);

        let gone = store.get("gone", today()).unwrap().unwrap();
        assert_eq!(gone.title, "");
        assert_eq!(gone.rating, RATING_UNKNOWN);
        assert_eq!(gone.review_count, COUNT_UNKNOWN);
        assert_eq!(gone.reserved_count, COUNT_UNKNOWN);
        assert_eq!(gone.foreigner_review_count, COUNT_UNKNOWN);
        assert!(gone.option_list.is_empty());
        assert_eq!(store.get("room-0", today()).unwrap().unwrap().rating, 4.8);
    }

    #[tokio::test]
    async fn test_run_past_midnight_uses_new_day() {
        let query = root_query();
        let listings = listings_in(&query.region, "room", 3);
        let session = scripted(MockSession::new(), &query, &listings, 3);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let next_day = today().succ_opt().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let clock = move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                today()
            } else {
                next_day
            }
        };

        let summary = Collector::new(
            store.clone(),
            urls(),
            SourceConfig::default(),
            CrawlPolicy::without_delays(),
            clock,
        )
        .run(&session, query)
        .await;

        assert_eq!(summary.persisted, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.list_by_date(today()).unwrap().len(), 1);
        assert_eq!(store.list_by_date(next_day).unwrap().len(), 2);
        assert!(store.get("room-0", today()).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_result_list_splits_without_reported_total() {
        let query = root_query();
        // 15 full pages while the heading reports no total
        let listings = listings_in(&query.region, "room", 260);
        let session = scripted(MockSession::new(), &query, &listings, 0);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let summary = collector(store.clone(), CrawlPolicy::without_delays())
            .run(&session, query.clone())
            .await;

        assert_eq!(summary.refs_seen, 260);
        assert_eq!(summary.persisted, 260);
        assert_eq!(summary.splits, 1);
        assert_eq!(summary.regions_visited, 5);
        assert_eq!(store.list_by_date(today()).unwrap().len(), 260);

        let searched = searched_regions(&session);
        assert_eq!(searched.len(), 5);
        assert_eq!(searched[1], search_url(&quadrant_query(&query, 0)));
    }

    #[tokio::test]
    async fn test_depth_limit_stops_splitting() {
        let query = root_query();
        let listings = listings_in(&query.region, "room", 3);
        let session = scripted(MockSession::new(), &query, &listings, 500);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let policy = CrawlPolicy {
            max_depth: 0,
            ..CrawlPolicy::without_delays()
        };
        let summary = collector(store, policy).run(&session, query).await;

        assert_eq!(summary.regions_visited, 1);
        assert_eq!(summary.splits, 0);
        assert_eq!(summary.depth_limited, 1);
    }

    #[tokio::test]
    async fn test_degenerate_region_is_not_split() {
        let ne = crate::domain::Coordinate::new(35.10005, 129.10005);
        let sw = crate::domain::Coordinate::new(35.1, 129.1);
        let query = root_query().with_region(GeoRegion::new(ne, sw).unwrap());
        let session = scripted(MockSession::new(), &query, &[], 300);
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let summary = collector(store, CrawlPolicy::without_delays())
            .run(&session, query)
            .await;

        assert_eq!(summary.regions_visited, 1);
        assert_eq!(summary.depth_limited, 1);
    }
}
