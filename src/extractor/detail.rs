//! Field extractors for a listing detail page.
//!
//! Each field has its own function so one broken section of the page only
//! costs that field. Rating and review count have a second, alternate
//! location that is tried only when the primary one fails.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDate};
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::domain::{ListingDetail, COUNT_UNKNOWN, RATING_UNKNOWN};
use crate::extractor::{first_number, selector, ExtractError};

const TITLE: &str = "[data-section-id='TITLE_DEFAULT'] h1";
const RATING_PRIMARY: &str = "[data-testid='pdp-reviews-highlight-banner-host-rating'] div";
const REVIEW_COUNT_PRIMARY: &str = "[data-testid='pdp-reviews-highlight-banner-host-review'] div";
const RATING_REVIEW_FALLBACK: &str = "h2 > [dir='ltr'] > span";
const AMENITIES_SECTION: &str = "[data-section-id='AMENITIES_DEFAULT'] section";
const CALENDAR_DAY: &str = "[data-testid^='calendar-day-']";
const CALENDAR_DAY_PREFIX: &str = "calendar-day-";

/// Days after the base date still counted as near-term reservations.
pub const RESERVATION_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Title,
    Rating,
    ReviewCount,
    OptionList,
    ReservedCount,
    ForeignerReviewCount,
}

impl fmt::Display for DetailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetailField::Title => "title",
            DetailField::Rating => "rating",
            DetailField::ReviewCount => "review_count",
            DetailField::OptionList => "option_list",
            DetailField::ReservedCount => "reserved_count",
            DetailField::ForeignerReviewCount => "foreigner_review_count",
        };
        f.write_str(name)
    }
}

/// A detail record with sentinels in place of every field that failed.
#[derive(Debug, Clone)]
pub struct DetailExtraction {
    pub detail: ListingDetail,
    pub failed_fields: Vec<DetailField>,
}

impl DetailExtraction {
    /// Run every field extractor over `html`.
    ///
    /// `foreigner_review_count` is left unknown; it needs the expanded review
    /// list, which only the browser can produce.
    pub fn from_html(html: &str, base_date: NaiveDate, unavailable_marker: &str) -> Self {
        let document = Html::parse_document(html);
        let mut failed_fields = Vec::new();

        let title = settle(
            DetailField::Title,
            extract_title(&document),
            String::new(),
            &mut failed_fields,
        );
        let reserved_count = settle(
            DetailField::ReservedCount,
            extract_reserved_count(&document, base_date, unavailable_marker),
            COUNT_UNKNOWN,
            &mut failed_fields,
        );
        let rating = settle(
            DetailField::Rating,
            extract_rating(&document),
            RATING_UNKNOWN,
            &mut failed_fields,
        );
        let review_count = settle(
            DetailField::ReviewCount,
            extract_review_count(&document),
            COUNT_UNKNOWN,
            &mut failed_fields,
        );
        let option_list = settle(
            DetailField::OptionList,
            extract_option_list(&document),
            BTreeSet::new(),
            &mut failed_fields,
        );

        Self {
            detail: ListingDetail {
                title,
                rating,
                review_count,
                foreigner_review_count: COUNT_UNKNOWN,
                option_list,
                reserved_count,
            },
            failed_fields,
        }
    }
}

fn settle<T>(
    field: DetailField,
    result: Result<T, ExtractError>,
    sentinel: T,
    failed_fields: &mut Vec<DetailField>,
) -> T {
    result.unwrap_or_else(|e| {
        warn!("Failed to extract {}: {}", field, e);
        failed_fields.push(field);
        sentinel
    })
}

fn first_element<'a>(document: &'a Html, css: &str) -> Result<ElementRef<'a>, ExtractError> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .ok_or_else(|| ExtractError::MissingElement(css.to_string()))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn direct_divs<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "div")
}

pub fn extract_title(document: &Html) -> Result<String, ExtractError> {
    first_element(document, TITLE).map(element_text)
}

/// Host rating from the review highlight banner, falling back to the
/// "4.85 · 120 reviews" line under the reviews heading.
pub fn extract_rating(document: &Html) -> Result<f64, ExtractError> {
    rating_primary(document).or_else(|e| {
        debug!("Primary rating location failed ({}), trying fallback", e);
        rating_fallback(document)
    })
}

fn rating_primary(document: &Html) -> Result<f64, ExtractError> {
    let text = first_element(document, RATING_PRIMARY).map(element_text)?;
    parse_rating(&text)
}

fn rating_fallback(document: &Html) -> Result<f64, ExtractError> {
    let text = first_element(document, RATING_REVIEW_FALLBACK).map(element_text)?;
    let rating_part = text.split('·').next().unwrap_or_default();
    parse_rating(rating_part.trim())
}

fn parse_rating(text: &str) -> Result<f64, ExtractError> {
    text.parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .ok_or_else(|| ExtractError::Parse {
            field: "rating",
            value: text.to_string(),
        })
}

/// Review count from the highlight banner, falling back to the second half
/// of the "4.85 · 120 reviews" line.
pub fn extract_review_count(document: &Html) -> Result<i64, ExtractError> {
    review_count_primary(document).or_else(|e| {
        debug!("Primary review count location failed ({}), trying fallback", e);
        review_count_fallback(document)
    })
}

fn review_count_primary(document: &Html) -> Result<i64, ExtractError> {
    let container = first_element(document, REVIEW_COUNT_PRIMARY)?;

    // Only the leading text node holds the number; the label follows in a
    // child element.
    let first_text = container
        .children()
        .next()
        .and_then(|node| node.value().as_text().map(|t| t.trim().replace(',', "")))
        .ok_or_else(|| ExtractError::MissingElement(format!("{} text", REVIEW_COUNT_PRIMARY)))?;

    first_text.parse::<i64>().map_err(|_| ExtractError::Parse {
        field: "review_count",
        value: first_text.clone(),
    })
}

fn review_count_fallback(document: &Html) -> Result<i64, ExtractError> {
    let text = first_element(document, RATING_REVIEW_FALLBACK).map(element_text)?;
    let count_part = text.split('·').nth(1).ok_or_else(|| ExtractError::Parse {
        field: "review_count",
        value: text.clone(),
    })?;

    first_number(count_part)
        .and_then(|n| i64::try_from(n).ok())
        .ok_or_else(|| ExtractError::Parse {
            field: "review_count",
            value: count_part.to_string(),
        })
}

/// Amenity names from the amenities section.
///
/// The section's second `div` holds one `div` per amenity; an amenity whose
/// label cannot be found is skipped.
pub fn extract_option_list(document: &Html) -> Result<BTreeSet<String>, ExtractError> {
    let section = first_element(document, AMENITIES_SECTION)?;
    let list = direct_divs(section)
        .nth(1)
        .ok_or_else(|| ExtractError::MissingElement(format!("{} > div:nth-child(2)", AMENITIES_SECTION)))?;

    let div = selector("div")?;
    let mut options = BTreeSet::new();

    for option in direct_divs(list) {
        let label = option
            .select(&div)
            .next()
            .and_then(|outer| outer.select(&div).next())
            .map(element_text);

        match label {
            Some(label) if !label.is_empty() => {
                options.insert(label);
            }
            _ => debug!("Skipping amenity entry without a label"),
        }
    }

    Ok(options)
}

/// Number of calendar days within `[base_date, base_date + 30]` whose
/// accessibility label contains `unavailable_marker`.
pub fn extract_reserved_count(
    document: &Html,
    base_date: NaiveDate,
    unavailable_marker: &str,
) -> Result<i64, ExtractError> {
    let cells = selector(CALENDAR_DAY)?;
    let window_end = base_date
        .checked_add_days(Days::new(RESERVATION_WINDOW_DAYS))
        .ok_or_else(|| ExtractError::Parse {
            field: "reserved_count",
            value: base_date.to_string(),
        })?;

    let mut reserved = 0;
    for cell in document.select(&cells) {
        let test_id = cell.value().attr("data-testid").unwrap_or_default();
        let date_text = test_id
            .trim_start_matches(CALENDAR_DAY_PREFIX)
            .trim_end_matches('.');
        let date = NaiveDate::parse_from_str(date_text, "%Y.%m.%d").map_err(|_| {
            ExtractError::Parse {
                field: "calendar day",
                value: test_id.to_string(),
            }
        })?;

        let label = cell
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.value().attr("aria-label"))
            .ok_or_else(|| ExtractError::MissingAttribute {
                selector: format!("parent of {}", test_id),
                attribute: "aria-label",
            })?;

        if (base_date..=window_end).contains(&date) && label.contains(unavailable_marker) {
            reserved += 1;
        }
    }

    Ok(reserved)
}
