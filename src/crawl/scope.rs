// src/crawl/scope.rs
// =============================================================================
// This module decides which URLs the crawler is allowed to visit.
//
// Two pieces:
// - HostScope: "scheme://authority" of the seed URL, fixed for the whole crawl
// - UrlFilter: the shouldProcess predicate (same scope + accepted extension)
//
// Both are pure: no I/O, no shared state, so concurrent fetch tasks can read
// them freely.
//
// Rust concepts:
// - Newtype structs: HostScope wraps a String to give it meaning
// - HashSet: O(1) extension lookups
// - thiserror: typed errors for malformed URLs
// =============================================================================

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

// A URL that cannot serve as (or be compared against) a crawl scope
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("malformed URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("URL has no host: {0}")]
    NoHost(String),
}

// The same-domain boundary, derived once from the seed URL
//
// Example:
//   seed = "https://Example.com:443/blog/index.html"
//   scope = "https://example.com"   (url lowercases hosts, drops default ports)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostScope {
    prefix: String,
}

impl HostScope {
    pub fn from_seed(seed: &str) -> Result<Self, ScopeError> {
        let url = Url::parse(seed.trim()).map_err(|e| ScopeError::MalformedUrl {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;

        if !url.has_host() {
            return Err(ScopeError::NoHost(seed.to_string()));
        }

        Ok(Self {
            prefix: scope_of(&url),
        })
    }

    /// The "scheme://authority" string every in-scope URL shares
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// True when the URL's scheme and authority are exactly ours
    pub fn contains(&self, url: &Url) -> bool {
        url.as_str().starts_with(&self.prefix) && scope_of(url) == self.prefix
    }
}

fn scope_of(url: &Url) -> String {
    format!("{}://{}", url.scheme(), url.authority())
}

// The shouldProcess predicate
//
// Holds the scope and the accepted extension set. Cloning is cheap enough
// that every extractor call can borrow one without locking.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    scope: HostScope,
    extensions: HashSet<String>,
}

impl UrlFilter {
    // extensions are expected lowercase with a leading dot, "" for none
    // (CrawlConfig::validate() normalizes them)
    pub fn new<I, S>(scope: HostScope, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope,
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    // Decides whether a candidate URL is worth crawling
    //
    // Rejects:
    //   - empty strings and anything url::Url cannot parse
    //   - URLs on another scheme/host/port (https://other.com, http:// vs https://)
    //   - paths ending in an extension we don't accept (.png, .pdf, ...)
    pub fn should_process(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }

        let url = match Url::parse(candidate) {
            Ok(url) => url,
            Err(_) => return false,
        };

        self.scope.contains(&url) && self.has_accepted_extension(&url)
    }

    pub fn has_accepted_extension(&self, url: &Url) -> bool {
        self.extensions.contains(&path_extension(url.path()))
    }
}

// Returns the lowercase extension of the last path segment, with its dot
//
// Leading dots don't start an extension, so "/.hidden" has none.
//
// Examples:
//   "/docs/page.HTML" -> ".html"
//   "/docs/"          -> ""
//   "/v1.2/readme"    -> ""
//   "/archive.tar.gz" -> ".gz"
pub fn path_extension(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or("");
    let stem = name.trim_start_matches('.');

    match stem.rfind('.') {
        Some(idx) => stem[idx..].to_lowercase(),
        None => String::new(),
    }
}
