//! Scheduler for running a breadth-first crawl over a pool of workers
//!
//! This module handles:
//! - Seeding the frontier and spawning worker tasks
//! - Depth bounding and visited-set deduplication per entry
//! - Recording successes and failures into a [`CrawlResult`]
//! - Cooperative cancellation through a [`StopHandle`]

use super::fetcher::Fetcher;
use super::frontier::{ActiveEntry, Frontier, FrontierEntry};
use super::parser::{extract_links, is_crawlable};
use crate::config::CrawlerConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::Notify;

/// A URL whose fetch failed during a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlFailure {
    pub url: String,
    pub depth: u32,
    pub error: String,
}

/// Outcome of a crawl run
///
/// `crawled` lists successfully fetched URLs in the order workers completed
/// them. With more than one worker that order varies from run to run; it is
/// not the discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlResult {
    pub crawled: Vec<String>,
    pub failed: Vec<CrawlFailure>,
}

impl CrawlResult {
    /// Successfully fetched URLs in completion order
    pub fn urls(&self) -> &[String] {
        &self.crawled
    }

    pub fn into_urls(self) -> Vec<String> {
        self.crawled
    }

    pub fn contains(&self, url: &str) -> bool {
        self.crawled.iter().any(|u| u == url)
    }

    /// Number of successfully fetched URLs
    pub fn len(&self) -> usize {
        self.crawled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crawled.is_empty()
    }
}

#[derive(Debug, Default)]
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

/// Requests that a running crawl stop early
///
/// Workers check the flag before taking each entry. Fetches already in
/// flight run to completion and are recorded; no new entries are started.
/// Once stopped, a handle stays stopped.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    signal: Arc<StopSignal>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.signal.stopped.store(true, Ordering::SeqCst);
        self.signal.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.signal.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once [`StopHandle::stop`] has been called
    pub async fn wait(&self) {
        loop {
            let notified = self.signal.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// Concurrent breadth-first crawler
///
/// # Example
///
/// ```no_run
/// use sumi_sieve::config::{CrawlerConfig, FetchConfig};
/// use sumi_sieve::{Crawler, HttpFetcher};
///
/// # async fn demo() -> Result<(), sumi_sieve::FetchError> {
/// let fetcher = HttpFetcher::new(&FetchConfig::default())?;
/// let crawler = Crawler::new(fetcher, CrawlerConfig::default());
/// let result = crawler.run("https://example.com/").await;
/// println!("crawled {} pages", result.len());
/// # Ok(())
/// # }
/// ```
pub struct Crawler<F> {
    fetcher: Arc<F>,
    config: CrawlerConfig,
    stop: StopHandle,
}

impl<F: Fetcher + 'static> Crawler<F> {
    /// Creates a crawler using `fetcher` for every page
    ///
    /// A `workers` value of zero is treated as one.
    pub fn new(fetcher: F, config: CrawlerConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            config,
            stop: StopHandle::new(),
        }
    }

    /// Handle that stops this crawler's runs
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls breadth-first from `seed` and returns once the frontier is
    /// exhausted with no page in flight, or after a stop request
    ///
    /// Fetch failures never abort the crawl; they are logged and collected
    /// in [`CrawlResult::failed`].
    pub async fn run(&self, seed: &str) -> CrawlResult {
        let workers = self.config.workers.max(1) as usize;
        tracing::info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            seed,
            self.config.max_depth,
            workers
        );

        let context = Arc::new(WorkerContext {
            fetcher: Arc::clone(&self.fetcher),
            frontier: Frontier::new(),
            max_depth: self.config.max_depth,
            stop: self.stop.clone(),
            result: Mutex::new(CrawlResult::default()),
            pages_processed: AtomicUsize::new(0),
            started: Instant::now(),
        });
        context.frontier.push(FrontierEntry::new(seed, 0));

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let context = Arc::clone(&context);
                tokio::spawn(async move { worker_loop(id, context).await })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Crawl worker terminated abnormally: {}", e);
            }
        }

        let result = context.take_result();
        if self.stop.is_stopped() {
            tracing::info!(
                "Crawl stopped: {} pages crawled, {} failed, {} left in frontier",
                result.crawled.len(),
                result.failed.len(),
                context.frontier.len()
            );
        } else {
            tracing::info!(
                "Crawl complete: {} pages crawled, {} failed in {:.2}s",
                result.crawled.len(),
                result.failed.len(),
                context.started.elapsed().as_secs_f64()
            );
        }
        result
    }
}

/// State shared by all workers of one run
struct WorkerContext<F> {
    fetcher: Arc<F>,
    frontier: Frontier,
    max_depth: u32,
    stop: StopHandle,
    result: Mutex<CrawlResult>,
    pages_processed: AtomicUsize,
    started: Instant,
}

impl<F: Fetcher> WorkerContext<F> {
    fn record<T>(&self, apply: impl FnOnce(&mut CrawlResult) -> T) -> T {
        let mut result = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut result)
    }

    fn take_result(&self) -> CrawlResult {
        self.record(std::mem::take)
    }

    /// Handles one entry already counted as active in the frontier
    async fn process(&self, entry: FrontierEntry) {
        if entry.depth > self.max_depth {
            tracing::debug!("Dropping {} (depth {} > {})", entry.url, entry.depth, self.max_depth);
            return;
        }

        if !self.frontier.mark_visited(&entry.url) {
            tracing::debug!("Skipping {} (already visited)", entry.url);
            return;
        }

        tracing::debug!("Fetching {} at depth {}", entry.url, entry.depth);
        let fetched = self.fetcher.fetch(&entry.url).await;
        match fetched {
            Ok(body) => {
                if entry.depth < self.max_depth {
                    let html = String::from_utf8_lossy(&body);
                    self.enqueue_links(&html, &entry);
                }
                self.record(|r| r.crawled.push(entry.url));
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", entry.url, e);
                self.record(|r| {
                    r.failed.push(CrawlFailure {
                        url: entry.url,
                        depth: entry.depth,
                        error: e.to_string(),
                    })
                });
            }
        }

        let processed = self.pages_processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % 10 == 0 {
            let rate = processed as f64 / self.started.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: {} pages processed, {} in frontier, {:.2} pages/sec",
                processed,
                self.frontier.len(),
                rate
            );
        }
    }

    fn enqueue_links(&self, html: &str, parent: &FrontierEntry) {
        let depth = parent.depth + 1;
        let links = extract_links(html, &parent.url);
        let found = links.len();

        let entries: Vec<FrontierEntry> = links
            .into_iter()
            .filter(|link| {
                let keep = is_crawlable(link);
                if !keep {
                    tracing::debug!("Not following {} (unsupported scheme)", link);
                }
                keep
            })
            .map(|link| FrontierEntry::new(link, depth))
            .collect();

        let added = self.frontier.extend(entries);
        tracing::debug!("{}: {} links found, {} queued", parent.url, found, added);
    }
}

async fn worker_loop<F: Fetcher>(id: usize, context: Arc<WorkerContext<F>>) {
    tracing::trace!("Worker {} started", id);

    loop {
        if context.stop.is_stopped() {
            break;
        }

        let entry = tokio::select! {
            entry = context.frontier.next_entry() => entry,
            _ = context.stop.wait() => None,
        };
        let Some(entry) = entry else {
            break;
        };

        let _active = ActiveEntry::new(&context.frontier);
        context.process(entry).await;
    }

    tracing::trace!("Worker {} finished", id);
}
