// src/crawl/fetch.rs
// =============================================================================
// This module downloads pages for the crawler.
//
// Key functionality:
// - A global concurrency limiter (tokio Semaphore) caps in-flight requests
// - A per-request timeout bounds how long any single fetch can take
// - Every outcome is a typed FetchError, never a panic or a crawl abort
//
// The crawler only talks to the PageSource trait, so tests can swap the
// network out for an in-memory website.
//
// Rust concepts:
// - Traits: PageSource is the seam between the crawler and the network
// - Semaphore permits: released automatically when dropped (RAII)
// - tokio::time::timeout: wraps any future with a deadline
// =============================================================================

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{error, warn};

// Why a single page could not be turned into HTML text
//
// None of these stop the crawl: the URL stays visited and contributes no links.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {code}")]
    BadStatus { code: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("not an HTML page: {0}")]
    NonHtmlExtension(String),

    #[error("concurrency limiter closed")]
    LimiterClosed,
}

// Anything that can turn a URL into a page body
//
// The production implementation is Fetcher (HTTP). Implementors must not
// touch crawler state: they only receive a URL and hand back text.
pub trait PageSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>>;
}

// HTTP page source with bounded concurrency
//
// One Fetcher is shared by every task in a batch (by reference), so the
// semaphore inside it is the one global limit on in-flight requests.
pub struct Fetcher {
    client: Client,
    limiter: Semaphore,
    timeout: Duration,
}

impl Fetcher {
    // Builds the HTTP client and the limiter
    //
    // Parameters:
    //   max_concurrent: how many requests may be in flight at once
    //   timeout: deadline for one request (measured after a slot is acquired)
    //   user_agent: sent with every request
    pub fn new(max_concurrent: usize, timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            limiter: Semaphore::new(max_concurrent),
            timeout,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_error(e, self.timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::BadStatus {
                code: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| categorize_error(e, self.timeout))
    }
}

impl PageSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        // The permit lives until the end of this function, whatever happens
        // below, so the slot is always handed back.
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| FetchError::LimiterClosed)?;

        let result = match tokio::time::timeout(self.timeout, self.get_text(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };

        match &result {
            Err(e @ FetchError::BadStatus { .. }) => warn!("Failed to fetch {}: {}", url, e),
            Err(e) => error!("Error fetching {}: {}", url, e),
            Ok(_) => {}
        }

        result
    }
}

// Maps a reqwest error onto our taxonomy
fn categorize_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Network(error.to_string())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is a Semaphore?
//    - A counter of "slots" shared between tasks
//    - acquire() waits until a slot is free and returns a permit
//    - Dropping the permit gives the slot back, even on early return via ?
//
// 2. Why is the timeout started after acquire()?
//    - Waiting for a slot is not the server's fault
//    - Only the request itself should count against the deadline
//
// 3. What is `e @ FetchError::BadStatus { .. }`?
//    - A binding pattern: match the variant AND keep a name for the whole value
//
// 4. Why `impl Future` in the trait?
//    - Lets implementors write a plain `async fn fetch(...)`
//    - No boxing, no extra crates
// -----------------------------------------------------------------------------
