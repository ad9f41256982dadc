use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use crate::app::{AppContext, Result};
use crate::collector::{Collector, RunSummary};
use crate::domain::{CollectRequest, ListingQuery, SearchUrlBuilder};
use crate::session::{ChromeSession, PageSession};
use crate::store::ListingStore;

/// Run one collection for `request_json`.
///
/// Only a browser that fails to start is returned as an error. Anything
/// else is logged and the command still completes.
pub async fn collect(ctx: &AppContext, request_json: &str, headed: bool) -> Result<()> {
    let (query, urls) = match prepare(ctx, request_json) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("Cannot start collection: {}", e);
            return Ok(());
        }
    };

    let browser = if headed {
        ctx.config.browser.clone().headed()
    } else {
        ctx.config.browser.clone()
    };
    let mut session = ChromeSession::launch(browser).await?;

    info!(
        "Collecting {} {} for {} to {}",
        query.country, query.sido, query.checkin, query.checkout
    );
    let summary = run_collection(ctx, &session, urls, query).await;

    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {}", e);
    }

    summary.log();
    Ok(())
}

fn prepare(ctx: &AppContext, request_json: &str) -> Result<(ListingQuery, SearchUrlBuilder)> {
    let request = CollectRequest::from_json(request_json)?;
    let query = ListingQuery::new(&request, ctx.config.source.checkin_offset_days)?;
    let urls = SearchUrlBuilder::new(&ctx.config.source.base_url, ctx.config.source.zoom)?;
    Ok((query, urls))
}

pub async fn run_collection(
    ctx: &AppContext,
    session: &dyn PageSession,
    urls: SearchUrlBuilder,
    query: ListingQuery,
) -> RunSummary {
    let mut collector = Collector::new(
        ctx.store.clone(),
        urls,
        ctx.config.source.clone(),
        ctx.config.crawl.clone(),
        || Local::now().date_naive(),
    );
    collector.run(session, query).await
}

pub fn list_listings(ctx: &AppContext, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let records = ctx.store.list_by_date(date)?;

    if records.is_empty() {
        println!("No listings collected on {}", date);
        return Ok(());
    }

    for record in &records {
        let rating = if record.rating < 0.0 {
            "-".to_string()
        } else {
            format!("{:.2}", record.rating)
        };

        println!(
            "{} {} [{}]\n  rating {} | {} reviews ({} foreign) | {} reserved | {} amenities | {}",
            record.id,
            record.display_title(),
            record.region_name,
            rating,
            record.review_count,
            record.foreigner_review_count,
            record.reserved_count,
            record.option_list.len(),
            record.coordinate
        );
    }

    println!("{} listings collected on {}", records.len(), date);
    Ok(())
}
