//! Crawler module for concurrent breadth-first crawling
//!
//! This module contains the core crawling logic, including:
//! - The [`Fetcher`] capability and its reqwest-backed implementation
//! - Link extraction from fetched pages
//! - The shared crawl frontier (queue, visited set, termination detection)
//! - The worker pool that drives a crawl to completion

mod fetcher;
mod frontier;
mod parser;
mod scheduler;

pub use fetcher::{build_http_client, Fetcher, HttpFetcher};
pub use frontier::{Frontier, FrontierEntry};
pub use parser::extract_links;
pub use scheduler::{CrawlFailure, CrawlResult, Crawler, StopHandle};

use crate::config::Config;
use url::Url;

/// Runs a complete crawl with the shipped HTTP fetcher
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the seed URL
/// 2. Build the HTTP client from the fetch configuration
/// 3. Crawl breadth-first up to the configured depth
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - The URL to start from
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Crawl ran to completion (individual page failures
///   are reported inside the result)
/// * `Err(SieveError)` - The seed URL or the client configuration was invalid
pub async fn crawl_url(config: &Config, seed: &str) -> crate::Result<CrawlResult> {
    Url::parse(seed)?;

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let crawler = Crawler::new(fetcher, config.crawler.clone());
    Ok(crawler.run(seed).await)
}
