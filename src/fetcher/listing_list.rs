use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::collector::saturation::CollectionDiagnostics;
use crate::config::{CrawlPolicy, SourceConfig};
use crate::domain::{ListingQuery, ListingRef, SearchUrlBuilder};
use crate::extractor::search::{stays_search_from_html, stays_search_from_response};
use crate::extractor::{extract_listing_refs, reported_total};
use crate::session::{CaptureTrigger, ElementState, PageSession};

/// Everything one region's result pages yielded.
#[derive(Debug, Clone, Default)]
pub struct RegionListing {
    pub refs: HashSet<ListingRef>,
    /// Count from the result heading, `0` when unreadable
    pub reported_total: u64,
    pub pages_fetched: u32,
    /// Pages visited whose listing data could not be captured
    pub failed_pages: u32,
    /// Pagination was cut short by a session error
    pub aborted: bool,
}

impl RegionListing {
    pub fn unique_count(&self) -> u64 {
        self.refs.len() as u64
    }

    pub fn diagnostics(&self) -> CollectionDiagnostics {
        CollectionDiagnostics::new(self.unique_count(), self.reported_total)
    }

    fn absorb(&mut self, stays_search: Option<Value>) {
        self.pages_fetched += 1;
        match stays_search {
            Some(stays_search) => self.refs.extend(extract_listing_refs(&stays_search)),
            None => self.failed_pages += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageCursor {
    FirstPage,
    NextPage,
    Exhausted,
}

/// Walks a region's result pages from the first one until "next" runs out.
pub struct ListingListFetcher {
    urls: SearchUrlBuilder,
    source: SourceConfig,
    policy: CrawlPolicy,
}

impl ListingListFetcher {
    pub fn new(urls: SearchUrlBuilder, source: SourceConfig, policy: CrawlPolicy) -> Self {
        Self {
            urls,
            source,
            policy,
        }
    }

    /// Collect every listing ref visible for `query`.
    ///
    /// Session failures never escape: they end pagination and mark the
    /// result as aborted, keeping what was gathered so far.
    pub async fn fetch(&self, session: &dyn PageSession, query: &ListingQuery) -> Result<RegionListing> {
        let url = self.urls.search_url(query)?;
        let mut listing = RegionListing::default();
        let mut cursor = PageCursor::FirstPage;

        while cursor != PageCursor::Exhausted {
            cursor = match cursor {
                PageCursor::FirstPage => match self.first_page(session, url.as_str()).await {
                    Ok(stays_search) => {
                        listing.absorb(stays_search);
                        PageCursor::NextPage
                    }
                    Err(e) => {
                        warn!("Failed to load first result page for {}: {}", query.region, e);
                        listing.aborted = true;
                        PageCursor::Exhausted
                    }
                },
                PageCursor::NextPage if listing.pages_fetched >= self.policy.max_pages => {
                    debug!("Reached the {} page limit for {}", self.policy.max_pages, query.region);
                    PageCursor::Exhausted
                }
                PageCursor::NextPage => match self.next_page(session).await {
                    Ok(Some(stays_search)) => {
                        listing.absorb(stays_search);
                        PageCursor::NextPage
                    }
                    Ok(None) => PageCursor::Exhausted,
                    Err(e) => {
                        warn!(
                            "Pagination stopped after page {} for {}: {}",
                            listing.pages_fetched, query.region, e
                        );
                        listing.aborted = true;
                        PageCursor::Exhausted
                    }
                },
                PageCursor::Exhausted => PageCursor::Exhausted,
            };
        }

        listing.reported_total = match session.content().await {
            Ok(html) => reported_total(&html),
            Err(e) => {
                warn!("Could not read result heading for {}: {}", query.region, e);
                0
            }
        };

        info!(
            "Region {}: {} listings over {} pages ({} failed)",
            query.region,
            listing.unique_count(),
            listing.pages_fetched,
            listing.failed_pages
        );

        Ok(listing)
    }

    async fn first_page(&self, session: &dyn PageSession, url: &str) -> Result<Option<Value>> {
        let captured = session
            .capture_response(
                &self.source.search_response_pattern,
                self.policy.capture_timeout(),
                CaptureTrigger::Navigate(url.to_string()),
            )
            .await?;

        if let Some(stays_search) = captured.as_ref().and_then(stays_search_from_response) {
            return Ok(Some(stays_search.clone()));
        }

        // The first page also ships its results inline
        let html = session.content().await?;
        match stays_search_from_html(&html) {
            Ok(stays_search) => {
                debug!("Using deferred page state for the first result page");
                Ok(Some(stays_search))
            }
            Err(e) => {
                warn!("First result page has no listing data: {}", e);
                Ok(None)
            }
        }
    }

    /// `Ok(None)` when there is no next page; `Ok(Some(None))` when the
    /// page turned but its data was not captured.
    async fn next_page(&self, session: &dyn PageSession) -> Result<Option<Option<Value>>> {
        let next = &self.source.next_page_selector;
        match session.element_state(next).await? {
            ElementState::Enabled => {}
            state => {
                debug!("Next page control is {:?}", state);
                return Ok(None);
            }
        }

        tokio::time::sleep(self.policy.page_delay()).await;

        let captured = session
            .capture_response(
                &self.source.search_response_pattern,
                self.policy.capture_timeout(),
                CaptureTrigger::Click(next.clone()),
            )
            .await?;

        let stays_search = captured
            .as_ref()
            .and_then(stays_search_from_response)
            .cloned();
        if stays_search.is_none() {
            warn!("No listing data captured for result page");
        }

        Ok(Some(stays_search))
    }
}
