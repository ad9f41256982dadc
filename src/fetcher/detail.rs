use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::app::{Result, StayscanError};
use crate::config::{CrawlPolicy, SourceConfig};
use crate::domain::SearchUrlBuilder;
use crate::extractor::review::extract_review_texts;
use crate::extractor::{count_foreign_reviews, DetailExtraction, DetailField};
use crate::session::{ElementState, PageSession};

/// Loads a listing's detail page and reads every field from it.
pub struct DetailFetcher {
    urls: SearchUrlBuilder,
    source: SourceConfig,
    policy: CrawlPolicy,
}

impl DetailFetcher {
    pub fn new(urls: SearchUrlBuilder, source: SourceConfig, policy: CrawlPolicy) -> Self {
        Self {
            urls,
            source,
            policy,
        }
    }

    /// Fetch and extract one listing.
    ///
    /// Only a failure to load the page is an error. Fields that cannot be
    /// read come back as sentinels and are listed in `failed_fields`.
    pub async fn fetch(
        &self,
        session: &dyn PageSession,
        listing_id: &str,
        base_date: NaiveDate,
    ) -> Result<DetailExtraction> {
        let url = self.urls.detail_url(listing_id)?;
        session.navigate(url.as_str()).await?;
        session.wait_until_network_idle().await?;

        let html = session.content().await?;
        let mut extraction =
            DetailExtraction::from_html(&html, base_date, &self.source.unavailable_marker);

        match self.foreign_review_count(session).await {
            Ok(count) => {
                extraction.detail.foreigner_review_count = count as i64;
            }
            Err(e) => {
                warn!("Failed to read reviews of listing {}: {}", listing_id, e);
                extraction.failed_fields.push(DetailField::ForeignerReviewCount);
            }
        }

        Ok(extraction)
    }

    async fn foreign_review_count(&self, session: &dyn PageSession) -> Result<usize> {
        let show_all = &self.source.show_all_reviews_selector;
        if session.element_state(show_all).await? == ElementState::Enabled {
            session.click(show_all).await?;
            tokio::time::sleep(self.policy.review_settle()).await;
            self.expand_reviews(session).await?;
        } else {
            debug!("No review list to expand, counting reviews shown inline");
        }

        let html = session.content().await?;
        let texts = extract_review_texts(&html, &self.source.review_text_selector)
            .map_err(|e| StayscanError::Other(e.to_string()))?;

        Ok(count_foreign_reviews(&texts))
    }

    /// Scroll the review panel until it stops growing, at most
    /// `max_review_scrolls` times.
    async fn expand_reviews(&self, session: &dyn PageSession) -> Result<()> {
        let container = &self.source.review_container_selector;
        let mut height = session.scroll_height(container).await?;

        for round in 1..=self.policy.max_review_scrolls {
            if !session.scroll_to_bottom(container).await? {
                debug!("Review panel disappeared after {} scrolls", round - 1);
                return Ok(());
            }
            tokio::time::sleep(self.policy.review_settle()).await;

            let grown = session.scroll_height(container).await?;
            match (height, grown) {
                (Some(before), Some(after)) if after > before => height = grown,
                _ => {
                    debug!("Review panel fully loaded after {} scrolls", round);
                    return Ok(());
                }
            }
        }

        warn!(
            "Review panel still growing after {} scrolls, counting what is loaded",
            self.policy.max_review_scrolls
        );
        Ok(())
    }
}
