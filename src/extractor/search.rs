use std::collections::HashSet;

use scraper::Html;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{Coordinate, ListingRef};
use crate::extractor::{selector, ExtractError};

const RESPONSE_STAYS_SEARCH: &str = "/data/presentation/staysSearch";
const DEFERRED_STAYS_SEARCH: &str = "/niobeMinimalClientData/0/1/data/presentation/staysSearch";
const MAP_RESULTS: &str = "/mapResults/mapSearchResults";
const SEARCH_RESULTS: &str = "/results/searchResults";

/// The `staysSearch` object inside a captured search response.
pub fn stays_search_from_response(response: &Value) -> Option<&Value> {
    response.pointer(RESPONSE_STAYS_SEARCH)
}

/// The `staysSearch` object embedded in the first result page's
/// `data-deferred-state-0` script, for when no response was captured.
pub fn stays_search_from_html(html: &str) -> Result<Value, ExtractError> {
    let document = Html::parse_document(html);
    let script_selector = selector("script#data-deferred-state-0")?;
    let script = document
        .select(&script_selector)
        .next()
        .ok_or_else(|| ExtractError::MissingElement("script#data-deferred-state-0".into()))?;

    let text = script.text().collect::<String>();
    let state: Value =
        serde_json::from_str(&text).map_err(|e| ExtractError::Malformed(e.to_string()))?;

    state
        .pointer(DEFERRED_STAYS_SEARCH)
        .cloned()
        .ok_or_else(|| ExtractError::Malformed("deferred state has no staysSearch".into()))
}

/// Listing refs from both the map results and the list results of a
/// `staysSearch` object, deduplicated by id.
///
/// Entries without an id or coordinate are skipped; one bad entry never
/// costs the rest of the page.
pub fn extract_listing_refs(stays_search: &Value) -> HashSet<ListingRef> {
    let empty = Vec::new();
    let map_results = stays_search
        .pointer(MAP_RESULTS)
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let search_results = stays_search
        .pointer(SEARCH_RESULTS)
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut refs = HashSet::new();
    let mut skipped = 0;

    for entry in map_results.iter().chain(search_results) {
        match listing_ref_from_result(entry) {
            Ok(listing) => {
                refs.insert(listing);
            }
            Err(e) => {
                skipped += 1;
                debug!("Skipping search result without listing data: {}", e);
            }
        }
    }

    if skipped > 0 {
        info!(
            "Skipped {} of {} search results with missing listing data",
            skipped,
            map_results.len() + search_results.len()
        );
    }

    refs
}

fn listing_ref_from_result(entry: &Value) -> Result<ListingRef, ExtractError> {
    let listing = entry
        .get("listing")
        .ok_or_else(|| ExtractError::Malformed("result has no `listing`".into()))?;

    let id = match listing.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ExtractError::Malformed("listing has no `id`".into())),
    };

    let coordinate = listing
        .get("coordinate")
        .ok_or_else(|| ExtractError::Malformed(format!("listing {} has no `coordinate`", id)))?;
    let lat = coordinate.get("latitude").and_then(Value::as_f64);
    let lng = coordinate.get("longitude").and_then(Value::as_f64);

    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(ListingRef::new(id, Coordinate::new(lat, lng))),
        _ => Err(ExtractError::Malformed(format!(
            "listing {} has an incomplete coordinate",
            id
        ))),
    }
}

/// Total match count from the "N stays" heading of a result page; `0` if
/// the heading is missing or has no digits.
pub fn reported_total(html: &str) -> u64 {
    let document = Html::parse_document(html);
    let Ok(heading_selector) = selector("[data-testid='stays-page-heading']") else {
        return 0;
    };

    let Some(heading) = document.select(&heading_selector).next() else {
        debug!("Result page has no stays heading");
        return 0;
    };

    let digits: String = heading
        .text()
        .collect::<String>()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    match digits.parse() {
        Ok(total) => total,
        Err(_) => {
            if !digits.is_empty() {
                warn!("Stays heading count {} does not fit in u64", digits);
            }
            0
        }
    }
}
