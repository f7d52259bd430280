//! Crawler module for the listing → detail fan-out
//!
//! This module contains the core crawling logic, including:
//! - Listing table extraction and per-bill dispatch
//! - The new-bill spider
//! - HTTP fetching with retry logic
//! - Request scheduling and rate limiting
//! - Overall crawl coordination

mod coordinator;
mod dispatch;
mod document;
mod fetcher;
mod listing;
mod scheduler;
mod spider;

pub use coordinator::{Coordinator, CrawlReport};
pub use dispatch::{page_request, record_from_response, requests_for_bill, requests_for_bills};
pub use document::{attr_of, text_of, Document, Row, RowRule};
pub use fetcher::{build_http_client, fetch_url, fetch_with_retry, FetchResult, RetryPolicy};
pub use listing::{bill_references, link_id_from_href, LISTING_COLUMNS};
pub use scheduler::Scheduler;
pub use spider::{NewBillSpider, Request, RequestMeta, Response, Spider, SpiderOutput};

use crate::config::Config;
use crate::output::build_outputs;
use crate::Result;
use chrono::NaiveDate;

/// Crawls the bills filed since `since` (today if `None`)
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the new-bill spider
/// 2. Open the configured outputs (starting a database run if one is configured)
/// 3. Fetch the listing and fan out to every bill's detail pages
/// 4. Finalize the outputs
///
/// # Example
///
/// ```no_run
/// use likms_crawler::config::load_config_with_hash;
/// use likms_crawler::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let report = crawl(&config, None, &hash).await?;
/// println!("{} pages fetched", report.pages_fetched);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: &Config,
    since: Option<NaiveDate>,
    config_hash: &str,
) -> Result<CrawlReport> {
    let spider = NewBillSpider::new(config, since)?;
    let outputs = build_outputs(&config.output, spider.since(), config_hash)?;

    tracing::info!(
        "Crawling bills filed since {} ({} output(s))",
        spider.since(),
        outputs.len()
    );

    Coordinator::new(config, spider, outputs)?.run().await
}
