// src/crawl/frontier.rs
// =============================================================================
// This module implements the breadth-first crawl engine.
//
// How it works:
// 1. The seed URL goes into a FIFO queue at depth 1
// 2. Draw a batch: up to `max_urls_per_batch` unvisited entries, all at the
//    same depth. Each one is marked visited right here, before any fetch.
// 3. Fetch + extract every URL of the batch concurrently and wait for all
//    of them (the barrier). The Fetcher's semaphore limits real parallelism.
// 4. Merge: union the discovered links, drop visited ones, enqueue the rest
//    at depth + 1
// 5. Checkpoint the visited set to disk, log a summary, go back to 2
// 6. Stop when the queue is empty
//
// Only this coordinating loop ever mutates `visited` and `queue`, and only
// between batches. The concurrent fetch tasks borrow them read-only, so no
// locks are needed.
//
// Rust concepts:
// - VecDeque: FIFO queue for breadth-first traversal
// - HashSet: visited set with O(1) membership checks
// - futures::future::join_all: wait for a whole batch at once
// - Generics: Crawler<S: PageSource> runs against HTTP or an in-memory site
// =============================================================================

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use url::Url;

use super::checkpoint::ProgressWriter;
use super::extract::extract_links;
use super::fetch::{FetchError, PageSource};
use super::scope::{HostScope, ScopeError, UrlFilter};
use crate::config::CrawlConfig;

// One entry of the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
struct CrawlItem {
    url: String,
    depth: usize, // How many link hops from the seed (seed = 1)
}

// Per-kind failure counters for the run summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    pub timeouts: usize,
    pub bad_status: usize,
    pub network: usize,
    /// URLs that were visited but never requested (non-HTML extension)
    pub skipped: usize,
}

impl FailureCounts {
    fn record(&mut self, error: &FetchError) {
        match error {
            FetchError::Timeout(_) => self.timeouts += 1,
            FetchError::BadStatus { .. } => self.bad_status += 1,
            FetchError::Network(_) | FetchError::LimiterClosed => self.network += 1,
            FetchError::NonHtmlExtension(_) => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.timeouts + self.bad_status + self.network + self.skipped
    }
}

// What happened in one dispatch batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub depth: usize,
    /// URLs fetched concurrently in this batch
    pub dispatched: usize,
    /// New URLs enqueued at depth + 1
    pub discovered: usize,
    /// Size of the visited set after the batch
    pub total_visited: usize,
}

// Outcome of a whole crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub output: String,
    pub max_depth: usize,
    pub pages_visited: usize,
    pub pages_fetched: usize,
    pub failures: FailureCounts,
    pub batches: Vec<BatchReport>,
    pub checkpoint_failures: usize,
    pub duration_ms: u128,
}

// The BFS engine
//
// Owns the visited set and the queue outright; the page source, filter and
// writer are the collaborators it drives.
pub struct Crawler<S> {
    source: S,
    filter: UrlFilter,
    writer: ProgressWriter,
    seed: String,
    max_depth: usize,
    max_urls_per_batch: usize,
    visited: HashSet<String>,
    queue: VecDeque<CrawlItem>,
}

impl<S: PageSource> Crawler<S> {
    // Sets up a crawl from a validated config
    //
    // The seed is stored in url's serialized form ("https://example.com"
    // becomes "https://example.com/") so it compares equal to the links that
    // pages resolve back to it.
    pub fn new(config: &CrawlConfig, source: S) -> Result<Self, ScopeError> {
        let scope = HostScope::from_seed(&config.seed_url)?;
        let seed = Url::parse(config.seed_url.trim())
            .map_err(|e| ScopeError::MalformedUrl {
                url: config.seed_url.clone(),
                reason: e.to_string(),
            })?
            .to_string();

        let mut queue = VecDeque::new();
        queue.push_back(CrawlItem {
            url: seed.clone(),
            depth: 1,
        });

        Ok(Self {
            source,
            filter: UrlFilter::new(scope, config.accepted_extensions.iter().cloned()),
            writer: ProgressWriter::new(&config.output),
            seed,
            max_depth: config.max_depth,
            max_urls_per_batch: config.max_urls_per_batch,
            visited: HashSet::new(),
            queue,
        })
    }

    // Runs the crawl to frontier exhaustion
    //
    // Never fails: fetch errors are contained per URL and checkpoint errors
    // are logged and counted.
    pub async fn run(&mut self) -> CrawlSummary {
        let started = Instant::now();
        let mut pages_fetched = 0;
        let mut failures = FailureCounts::default();
        let mut batches = Vec::new();
        let mut checkpoint_failures = 0;

        loop {
            // Draw the next batch; an empty one means the frontier is exhausted
            let batch = self.next_batch();
            let Some(depth) = batch.first().map(|item| item.depth) else {
                break;
            };

            // Fetch everything in the batch and wait for all of it
            let results = self.dispatch(&batch).await;

            // Union the links from pages that worked, count the ones that didn't
            let mut found = BTreeSet::new();
            for result in results {
                match result {
                    Ok(links) => {
                        pages_fetched += 1;
                        found.extend(links);
                    }
                    Err(e) => failures.record(&e),
                }
            }

            // New links are one hop further from the seed
            let discovered = self.merge(found, depth + 1);

            // Save progress before the next batch starts
            if !self.checkpoint().await {
                checkpoint_failures += 1;
            }

            info!(
                "Depth {}: Processed {} URLs, discovered {}, Total URLs: {}",
                depth,
                batch.len(),
                discovered,
                self.visited.len()
            );

            // Record the batch for the summary
            batches.push(BatchReport {
                depth,
                dispatched: batch.len(),
                discovered,
                total_visited: self.visited.len(),
            });
        }

        // Final snapshot, even when the last batch's checkpoint failed
        if !self.checkpoint().await {
            checkpoint_failures += 1;
        }

        CrawlSummary {
            seed: self.seed.clone(),
            output: self.writer.path().display().to_string(),
            max_depth: self.max_depth,
            pages_visited: self.visited.len(),
            pages_fetched,
            failures,
            batches,
            checkpoint_failures,
            duration_ms: started.elapsed().as_millis(),
        }
    }

    // Draws the next depth-homogeneous batch from the front of the queue
    //
    // - Entries deeper than max_depth are dropped without being visited
    // - Entries already visited are skipped
    // - Everything drawn is marked visited immediately, so a URL can never
    //   be dispatched twice, even if it sits in the queue more than once
    // - Stops at the batch cap or when the next entry has a different depth;
    //   leftovers at the same depth form the next batch
    fn next_batch(&mut self) -> Vec<CrawlItem> {
        let mut batch: Vec<CrawlItem> = Vec::new();

        while batch.len() < self.max_urls_per_batch {
            // Peek first: an entry of another depth stays queued for later
            match (self.queue.front(), batch.first()) {
                (None, _) => break,
                (Some(next), Some(first)) if next.depth != first.depth => break,
                _ => {}
            }

            let Some(item) = self.queue.pop_front() else {
                break;
            };

            // Too deep: drop it, it never becomes visited
            if item.depth > self.max_depth {
                debug!("Discarding {} at depth {} (max {})", item.url, item.depth, self.max_depth);
                continue;
            }

            // Mark as visited (insert returns false if it already was)
            if !self.visited.insert(item.url.clone()) {
                continue;
            }

            // Claimed for this batch
            batch.push(item);
        }

        batch
    }

    // Fetches and extracts every URL of the batch concurrently
    //
    // join_all is the barrier: it resolves only once every task is done.
    // Results come back in batch order even though the fetches finish in
    // any order.
    async fn dispatch(&self, batch: &[CrawlItem]) -> Vec<Result<HashSet<String>, FetchError>> {
        join_all(batch.iter().map(|item| self.process(item))).await
    }

    async fn process(&self, item: &CrawlItem) -> Result<HashSet<String>, FetchError> {
        info!("Processing {} at depth {}", item.url, item.depth);

        // Only the seed can get here without passing the filter
        let accepted = Url::parse(&item.url)
            .map(|url| self.filter.has_accepted_extension(&url))
            .unwrap_or(false);
        if !accepted {
            return Err(FetchError::NonHtmlExtension(item.url.clone()));
        }

        let body = self.source.fetch(&item.url).await?;
        Ok(extract_links(&body, &item.url, &self.filter, &self.visited))
    }

    // Enqueues discovered URLs that are still unvisited, returns how many
    //
    // This is the authoritative visited check: the extractor's check ran
    // against the same snapshot, but two pages of one batch can both report
    // the same link. `found` is a set, so each URL is enqueued once here.
    fn merge(&mut self, found: BTreeSet<String>, depth: usize) -> usize {
        let mut enqueued = 0;
        for url in found {
            if !self.visited.contains(&url) {
                self.queue.push_back(CrawlItem { url, depth });
                enqueued += 1;
            }
        }
        enqueued
    }

    // Returns false when the snapshot could not be written
    async fn checkpoint(&self) -> bool {
        match self.writer.checkpoint(&self.visited).await {
            Ok(()) => true,
            Err(e) => {
                error!("Error saving progress: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    // An in-memory website: URL -> page body or failure
    #[derive(Default)]
    struct MockSite {
        pages: HashMap<String, Result<String, FetchError>>,
        fetched: Mutex<Vec<String>>,
    }

    impl MockSite {
        fn page(mut self, url: &str, links: &[&str]) -> Self {
            let body = links
                .iter()
                .map(|link| format!(r#"<a href="{}">link</a>"#, link))
                .collect::<Vec<_>>()
                .join("\n");
            self.pages
                .insert(url.to_string(), Ok(format!("<html><body>{}</body></html>", body)));
            self
        }

        fn failing(mut self, url: &str, error: FetchError) -> Self {
            self.pages.insert(url.to_string(), Err(error));
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl PageSource for MockSite {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            tokio::task::yield_now().await;
            self.pages
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::BadStatus { code: 404 }))
        }
    }

    fn config(dir: &TempDir, seed: &str) -> CrawlConfig {
        CrawlConfig::new(seed, dir.path().join("data").join("sitemap.txt"))
            .validate()
            .unwrap()
    }

    fn output_lines(config: &CrawlConfig) -> Vec<String> {
        std::fs::read_to_string(&config.output)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[tokio::test]
    async fn test_only_same_domain_links_are_enqueued() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "https://example.com/");
        let site = MockSite::default()
            .page(
                "https://example.com/",
                &["https://example.com/a.html", "https://other.com/b.html"],
            )
            .page("https://example.com/a.html", &[]);

        let mut crawler = Crawler::new(&config, site).unwrap();
        let summary = crawler.run().await;

        assert_eq!(
            crawler.source.fetched(),
            vec!["https://example.com/", "https://example.com/a.html"]
        );
        assert_eq!(summary.batches[0].discovered, 1);
        assert_eq!(summary.batches[1].depth, 2);
        assert!(!crawler.visited.contains("https://other.com/b.html"));
        assert_eq!(
            output_lines(&config),
            vec!["https://example.com/", "https://example.com/a.html"]
        );
    }

    #[tokio::test]
    async fn test_links_beyond_max_depth_are_never_fetched() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "https://example.com/").with_max_depth(2);
        let site = MockSite::default()
            .page("https://example.com/", &["/a.html"])
            .page("https://example.com/a.html", &["/c.html"])
            .page("https://example.com/c.html", &[]);

        let mut crawler = Crawler::new(&config, site).unwrap();
        let summary = crawler.run().await;

        assert!(!crawler
            .source
            .fetched()
            .contains(&"https://example.com/c.html".to_string()));
        assert!(summary.batches.iter().all(|b| b.depth <= 2));
        assert_eq!(
            output_lines(&config),
            vec!["https://example.com/", "https://example.com/a.html"]
        );
    }

    #[tokio::test]
    async fn test_timed_out_page_is_visited_but_contributes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "https://example.com/");
        let site = MockSite::default()
            .page("https://example.com/", &["/a.html"])
            .failing(
                "https://example.com/a.html",
                FetchError::Timeout(Duration::from_secs(30)),
            );

        let mut crawler = Crawler::new(&config, site).unwrap();
        let summary = crawler.run().await;

        assert_eq!(summary.failures.timeouts, 1);
        assert_eq!(summary.pages_fetched, 1);
        assert_eq!(
            output_lines(&config),
            vec!["https://example.com/", "https://example.com/a.html"]
        );
    }

    #[tokio::test]
    async fn test_each_url_is_fetched_at_most_once() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "https://example.com/");
        let site = MockSite::default()
            .page("https://example.com/", &["/a.html", "/b.html", "#top"])
            .page("https://example.com/a.html", &["/b.html", "/c.html", "/"])
            .page("https://example.com/b.html", &["/a.html", "/c.html"])
            .page("https://example.com/c.html", &["/", "/a.html", "/b.html"]);

        let mut crawler = Crawler::new(&config, site).unwrap();
        crawler.run().await;

        let mut fetched = crawler.source.fetched();
        let total = fetched.len();
        fetched.sort();
        fetched.dedup();
        assert_eq!(fetched.len(), total);
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_batches_respect_the_per_batch_cap() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "https://example.com/");

        let links: Vec<String> = (0..120).map(|i| format!("/p{}.html", i)).collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let mut site = MockSite::default().page("https://example.com/", &link_refs);
        for link in &links {
            site = site.page(&format!("https://example.com{}", link), &[]);
        }

        let mut crawler = Crawler::new(&config, site).unwrap();
        let summary = crawler.run().await;

        let shape: Vec<(usize, usize)> = summary
            .batches
            .iter()
            .map(|b| (b.depth, b.dispatched))
            .collect();
        assert_eq!(shape, vec![(1, 1), (2, 50), (2, 50), (2, 20)]);
        assert_eq!(summary.pages_visited, 121);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_urls() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "https://example.com/");
        let site = MockSite::default()
            .page("https://example.com/", &["/a.html", "/b.html", "/c.html"])
            .failing("https://example.com/a.html", FetchError::BadStatus { code: 500 })
            .failing(
                "https://example.com/b.html",
                FetchError::Network("connection reset".to_string()),
            )
            .page("https://example.com/c.html", &["/d.html"])
            .page("https://example.com/d.html", &[]);

        let mut crawler = Crawler::new(&config, site).unwrap();
        let summary = crawler.run().await;

        assert!(crawler
            .source
            .fetched()
            .contains(&"https://example.com/d.html".to_string()));
        assert_eq!(summary.failures.bad_status, 1);
        assert_eq!(summary.failures.network, 1);
        assert_eq!(summary.pages_visited, 5);
    }

    #[tokio::test]
    async fn test_seed_is_normalized_and_non_html_seed_is_skipped() {
        let dir = TempDir::new().unwrap();
        let pdf_seed = config(&dir, "https://example.com/report.pdf");
        let site = MockSite::default();

        let mut crawler = Crawler::new(&pdf_seed, site).unwrap();
        let summary = crawler.run().await;

        assert!(crawler.source.fetched().is_empty());
        assert_eq!(summary.failures.skipped, 1);
        assert_eq!(output_lines(&pdf_seed), vec!["https://example.com/report.pdf"]);

        let bare = config(&dir, "https://example.com");
        let crawler = Crawler::new(&bare, MockSite::default()).unwrap();
        assert_eq!(crawler.seed, "https://example.com/");
    }

    #[tokio::test]
    async fn test_checkpoint_failure_does_not_abort_crawl() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let config = CrawlConfig::new("https://example.com/", blocker.join("sitemap.txt"))
            .validate()
            .unwrap();
        let site = MockSite::default()
            .page("https://example.com/", &["/a.html"])
            .page("https://example.com/a.html", &[]);

        let mut crawler = Crawler::new(&config, site).unwrap();
        let summary = crawler.run().await;

        assert_eq!(summary.pages_fetched, 2);
        // One per batch plus the final snapshot
        assert_eq!(summary.checkpoint_failures, 3);
    }

    #[tokio::test]
    async fn test_crawl_over_http() {
        use crate::crawl::Fetcher;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="/a.html">A</a><a href="/logo.png">Logo</a>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/a.html")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="missing.html">Missing</a><a href="/">Home</a>"#)
            .create_async()
            .await;
        server
            .mock("GET", "/missing.html")
            .with_status(404)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let seed = format!("{}/", server.url());
        let config = config(&dir, &seed);
        let fetcher = Fetcher::new(
            config.max_concurrent_fetches,
            config.fetch_timeout,
            &config.user_agent,
        )
        .unwrap();

        let mut crawler = Crawler::new(&config, fetcher).unwrap();
        let summary = crawler.run().await;

        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.failures.bad_status, 1);
        assert_eq!(
            output_lines(&config),
            vec![
                format!("{}/", server.url()),
                format!("{}/a.html", server.url()),
                format!("{}/missing.html", server.url()),
            ]
        );
    }
}
