// src/config.rs
// =============================================================================
// Crawl configuration: every knob the crawler reads, with the defaults the
// CLI falls back to.
//
// The config is built once at startup (from CLI flags) and validated before
// any network or disk I/O happens. After that it is read-only.
//
// Rust concepts:
// - const items: compile-time defaults shared by the CLI and the tests
// - thiserror: derive a typed error enum with readable messages
// - Builder-style methods that consume and return Self
// =============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::crawl::{HostScope, ScopeError};

/// Deepest level the crawler will fetch (the seed is depth 1)
pub const DEFAULT_MAX_DEPTH: usize = 3;
/// Most URLs drawn from the frontier into a single dispatch batch
pub const DEFAULT_MAX_URLS_PER_BATCH: usize = 50;
/// Most HTTP requests in flight at once
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 20;
/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Path extensions treated as HTML pages ("" = clean URLs and directories)
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["", ".htm", ".html"];
/// Where the sitemap lands when no --output is given
pub const DEFAULT_OUTPUT: &str = "data/sitemap.txt";

pub const DEFAULT_USER_AGENT: &str = concat!("site-mapper/", env!("CARGO_PKG_VERSION"));

// Errors caught by CrawlConfig::validate()
//
// These are the only fatal errors of a crawl: once the config is valid,
// every later failure is contained to a single URL or a single checkpoint.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid seed URL: {0}")]
    Seed(#[from] ScopeError),
}

// Everything the crawler needs to know before it starts
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Absolute URL the crawl starts from
    pub seed_url: String,
    /// Sitemap file rewritten after every batch
    pub output: PathBuf,
    pub max_depth: usize,
    pub max_urls_per_batch: usize,
    pub max_concurrent_fetches: usize,
    pub fetch_timeout: Duration,
    /// Lowercase extensions with a leading dot; "" means "no extension"
    pub accepted_extensions: Vec<String>,
    pub user_agent: String,
}

impl CrawlConfig {
    /// Creates a config with every knob at its default
    pub fn new(seed_url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            seed_url: seed_url.into(),
            output: output.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_urls_per_batch: DEFAULT_MAX_URLS_PER_BATCH,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_urls_per_batch(mut self, max_urls_per_batch: usize) -> Self {
        self.max_urls_per_batch = max_urls_per_batch;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, max_concurrent_fetches: usize) -> Self {
        self.max_concurrent_fetches = max_concurrent_fetches;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    // Checks every knob and normalizes the extension list
    //
    // Returns the config back so callers can write
    //   let config = CrawlConfig::new(...).validate()?;
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Zero("max depth"));
        }
        if self.max_urls_per_batch == 0 {
            return Err(ConfigError::Zero("max URLs per batch"));
        }
        // A semaphore with zero permits would block every fetch forever
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::Zero("max concurrent fetches"));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Zero("fetch timeout"));
        }

        // Fails with MalformedUrl before we ever touch the network
        HostScope::from_seed(&self.seed_url)?;

        self.accepted_extensions = normalize_extensions(&self.accepted_extensions);
        Ok(self)
    }
}

// Turns user input like "HTML", ".Htm", "" into ".html", ".htm", ""
//
// A BTreeSet both removes duplicates and gives a stable order for logging.
fn normalize_extensions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|ext| {
            let ext = ext.trim().to_lowercase();
            if ext.is_empty() || ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
