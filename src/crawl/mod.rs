// src/crawl/mod.rs
// =============================================================================
// This module maps a website by crawling it breadth-first.
//
// Submodules (leaves first):
// - scope: which URLs are in bounds (same scheme/host/port, HTML extension)
// - fetch: HTTP GET with a concurrency limit and a timeout
// - extract: pull <a href> links out of a page
// - checkpoint: rewrite the sitemap file from the visited set
// - frontier: the BFS engine tying the others together
//
// Rust concepts:
// - Module trees: one directory, one file per concern
// - pub use: callers write `crawl::Crawler` instead of `crawl::frontier::Crawler`
// =============================================================================

mod checkpoint;
mod extract;
mod fetch;
mod frontier;
mod scope;

pub use fetch::{Fetcher, PageSource};
pub use frontier::{CrawlSummary, Crawler};
pub use scope::{HostScope, ScopeError};

use anyhow::Result;
use tracing::info;

use crate::config::CrawlConfig;

// Crawls a website over HTTP and writes its sitemap
//
// Parameters:
//   config: a validated CrawlConfig (see CrawlConfig::validate)
//
// Returns: the run summary; the sitemap itself is on disk at config.output
pub async fn crawl_website(config: &CrawlConfig) -> Result<CrawlSummary> {
    let fetcher = Fetcher::new(
        config.max_concurrent_fetches,
        config.fetch_timeout,
        &config.user_agent,
    )?;

    let scope = HostScope::from_seed(&config.seed_url)?;
    let mut crawler = Crawler::new(config, fetcher)?;
    info!(
        "Crawling {} within {} (max depth {}, {} URLs per batch, {} concurrent fetches)",
        config.seed_url,
        scope.as_str(),
        config.max_depth,
        config.max_urls_per_batch,
        config.max_concurrent_fetches
    );

    Ok(crawler.run().await)
}
