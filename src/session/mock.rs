//! Scripted in-memory [`PageSession`] for fetcher and collector tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::{Result, StayscanError};
use crate::config::SourceConfig;
use crate::domain::GeoRegion;
use crate::session::{CaptureTrigger, ElementState, PageSession};

/// One search result list as the mock serves it.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockSearch {
    /// Captured response per page; `None` simulates a capture timeout
    pub pages: Vec<Option<Value>>,
    pub reported_total: u64,
    /// `staysSearch` object embedded in the first page's deferred state
    pub deferred: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockDetail {
    pub html: String,
    pub review_button: bool,
}

#[derive(Debug, Clone)]
enum Current {
    Blank,
    Search { url: String, page: usize },
    Detail { url: String },
}

#[derive(Debug)]
struct MockState {
    searches: HashMap<String, MockSearch>,
    details: HashMap<String, MockDetail>,
    review_heights: VecDeque<f64>,
    current: Current,
    navigations: Vec<String>,
    clicks: Vec<String>,
    scrolls: usize,
    fail_clicks: bool,
    fail_scrolls: bool,
    closed: bool,
}

pub(crate) struct MockSession {
    source: SourceConfig,
    state: Mutex<MockState>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            source: SourceConfig::default(),
            state: Mutex::new(MockState {
                searches: HashMap::new(),
                details: HashMap::new(),
                review_heights: VecDeque::new(),
                current: Current::Blank,
                navigations: Vec::new(),
                clicks: Vec::new(),
                scrolls: 0,
                fail_clicks: false,
                fail_scrolls: false,
                closed: false,
            }),
        }
    }

    pub fn with_search(self, url: impl Into<String>, search: MockSearch) -> Self {
        self.state.lock().unwrap().searches.insert(url.into(), search);
        self
    }

    pub fn with_detail(self, url: impl Into<String>, detail: MockDetail) -> Self {
        self.state.lock().unwrap().details.insert(url.into(), detail);
        self
    }

    /// Successive `scrollHeight` readings; the last one repeats forever
    pub fn with_review_heights(self, heights: &[f64]) -> Self {
        self.state.lock().unwrap().review_heights = heights.iter().copied().collect();
        self
    }

    pub fn failing_clicks(self) -> Self {
        self.state.lock().unwrap().fail_clicks = true;
        self
    }

    pub fn failing_scrolls(self) -> Self {
        self.state.lock().unwrap().fail_scrolls = true;
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    /// Navigations whose URL contains `fragment`
    pub fn visits(&self, fragment: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .navigations
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn scrolls(&self) -> usize {
        self.state.lock().unwrap().scrolls
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn current_page(state: &MockState) -> Option<(&MockSearch, usize)> {
        match &state.current {
            Current::Search { url, page } => state.searches.get(url).map(|s| (s, *page)),
            _ => None,
        }
    }
}

#[async_trait]
impl PageSession for MockSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());

        if state.details.contains_key(url) {
            state.current = Current::Detail { url: url.to_string() };
        } else if url.contains("/s/") {
            // Unscripted searches behave like an empty area
            state.searches.entry(url.to_string()).or_insert_with(|| MockSearch {
                pages: vec![Some(stays_search_response(&[]))],
                ..Default::default()
            });
            state.current = Current::Search {
                url: url.to_string(),
                page: 0,
            };
        } else {
            return Err(StayscanError::Browser(format!("Navigation failed: {}", url)));
        }
        Ok(())
    }

    async fn wait_until_network_idle(&self) -> Result<()> {
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        match &state.current {
            Current::Blank => Ok("<html></html>".to_string()),
            Current::Detail { url } => Ok(state.details[url].html.clone()),
            Current::Search { url, .. } => {
                let search = &state.searches[url];
                Ok(search_page_html(search.reported_total, search.deferred.as_ref()))
            }
        }
    }

    async fn capture_response(
        &self,
        _url_pattern: &str,
        _timeout: Duration,
        trigger: CaptureTrigger,
    ) -> Result<Option<Value>> {
        match trigger {
            CaptureTrigger::Navigate(url) => self.navigate(&url).await?,
            CaptureTrigger::Click(selector) => self.click(&selector).await?,
        }

        let state = self.state.lock().unwrap();
        Ok(Self::current_page(&state).and_then(|(search, page)| search.pages.get(page).cloned().flatten()))
    }

    async fn element_state(&self, selector: &str) -> Result<ElementState> {
        let state = self.state.lock().unwrap();

        if selector == self.source.next_page_selector {
            return Ok(match Self::current_page(&state) {
                Some((search, page)) if page + 1 < search.pages.len() => ElementState::Enabled,
                Some(_) => ElementState::Disabled,
                None => ElementState::Missing,
            });
        }

        if selector == self.source.show_all_reviews_selector {
            if let Current::Detail { url } = &state.current {
                if state.details[url].review_button {
                    return Ok(ElementState::Enabled);
                }
            }
        }

        Ok(ElementState::Missing)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(selector.to_string());

        if state.fail_clicks {
            return Err(StayscanError::Browser(format!("Click failed: {}", selector)));
        }

        if selector == self.source.next_page_selector {
            if let Current::Search { page, .. } = &mut state.current {
                *page += 1;
                return Ok(());
            }
        }

        if selector == self.source.show_all_reviews_selector {
            if let Current::Detail { .. } = state.current {
                return Ok(());
            }
        }

        Err(StayscanError::Browser(format!("Element not found: {}", selector)))
    }

    async fn scroll_height(&self, _selector: &str) -> Result<Option<f64>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_scrolls {
            return Err(StayscanError::Browser("Script execution failed".into()));
        }
        let height = if state.review_heights.len() > 1 {
            state.review_heights.pop_front()
        } else {
            state.review_heights.front().copied()
        };
        Ok(height)
    }

    async fn scroll_to_bottom(&self, _selector: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.scrolls += 1;
        Ok(true)
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// A `staysSearch` object listing `listings` as `(id, lat, lng)` search results.
pub(crate) fn stays_search(listings: &[(String, f64, f64)]) -> Value {
    let results: Vec<Value> = listings
        .iter()
        .map(|(id, lat, lng)| {
            json!({ "listing": { "id": id, "coordinate": { "latitude": lat, "longitude": lng } } })
        })
        .collect();
    json!({ "results": { "searchResults": results } })
}

/// A full captured search response wrapping [`stays_search`].
pub(crate) fn stays_search_response(listings: &[(String, f64, f64)]) -> Value {
    json!({ "data": { "presentation": { "staysSearch": stays_search(listings) } } })
}

/// `count` listings spread along the diagonal of `region`, ids `{prefix}-{n}`.
pub(crate) fn listings_in(region: &GeoRegion, prefix: &str, count: usize) -> Vec<(String, f64, f64)> {
    let sw = region.sw();
    (0..count)
        .map(|n| {
            let t = (n as f64 + 0.5) / count as f64;
            (
                format!("{}-{}", prefix, n),
                sw.lat + region.lat_span() * t,
                sw.lng + region.lng_span() * t,
            )
        })
        .collect()
}

/// Split `listings` into result pages of `per_page` captured responses.
pub(crate) fn paged(listings: &[(String, f64, f64)], per_page: usize) -> Vec<Option<Value>> {
    if listings.is_empty() {
        return vec![Some(stays_search_response(&[]))];
    }
    listings
        .chunks(per_page)
        .map(|chunk| Some(stays_search_response(chunk)))
        .collect()
}

pub(crate) fn search_page_html(reported_total: u64, deferred: Option<&Value>) -> String {
    let script = deferred
        .map(|stays| {
            let state = json!({
                "niobeMinimalClientData": [[
                    "StaysSearch",
                    { "data": { "presentation": { "staysSearch": stays } } }
                ]]
            });
            format!(
                r#"<script id="data-deferred-state-0" type="application/json">{}</script>"#,
                state
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><body><h1 data-testid="stays-page-heading">숙소 {}개</h1>{}</body></html>"#,
        reported_total, script
    )
}

/// A detail page with a title, rating, review count and the given reviews.
pub(crate) fn detail_html(title: &str, rating: f64, reviews: &[&str]) -> String {
    let count = reviews.len();
    let reviews: String = reviews
        .iter()
        .enumerate()
        .map(|(n, text)| {
            format!(
                r#"<div data-review-id="{}"><span class="r"><span>{}</span></span></div>"#,
                n, text
            )
        })
        .collect();

    format!(
        r#"<html><body>
            <div data-section-id="TITLE_DEFAULT"><h1>{title}</h1></div>
            <div data-testid="pdp-reviews-highlight-banner-host-rating"><div>{rating}</div></div>
            <div data-testid="pdp-reviews-highlight-banner-host-review"><div>{count}<span>후기</span></div></div>
            <div data-section-id="AMENITIES_DEFAULT"><section>
                <div><h2>편의시설</h2></div>
                <div><div><div><div>무선 인터넷</div></div></div></div>
            </section></div>
            <div data-testid="pdp-reviews-modal-scrollable-panel">{reviews}</div>
        </body></html>"#,
        title = title,
        rating = rating,
        count = count,
        reviews = reviews
    )
}
