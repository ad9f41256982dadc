use scraper::Html;

use crate::extractor::{selector, ExtractError};

/// Hangul syllables, jamo, compatibility jamo and the extended jamo blocks.
pub fn is_local_script(c: char) -> bool {
    matches!(
        c,
        '\u{AC00}'..='\u{D7A3}'
            | '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{A960}'..='\u{A97F}'
            | '\u{D7B0}'..='\u{D7FF}'
    )
}

/// A review is written by a foreign guest when it has no local-script
/// character at all.
pub fn is_foreign_review(text: &str) -> bool {
    !text.chars().any(is_local_script)
}

pub fn count_foreign_reviews<I, S>(reviews: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    reviews
        .into_iter()
        .filter(|review| is_foreign_review(review.as_ref()))
        .count()
}

/// Non-empty review bodies matched by `text_selector`.
pub fn extract_review_texts(html: &str, text_selector: &str) -> Result<Vec<String>, ExtractError> {
    let document = Html::parse_document(html);
    let sel = selector(text_selector)?;

    Ok(document
        .select(&sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect())
}
