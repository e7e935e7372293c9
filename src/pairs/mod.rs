// src/pairs/mod.rs
// =============================================================================
// This module builds a Vietnamese/English parallel corpus from a sitemap.
//
// It is the downstream consumer of the crawler: it reads the sitemap file
// line by line, fetches every page, and writes out the sentence pairs found
// in each article.
//
// Output format (one pair per two lines):
//   * <vietnamese text>
//   + <english text>
//
// Submodules:
// - lang: Vietnamese/English classifier with an LRU memo
// - page: paragraph extraction and neighbour pairing for one page
// =============================================================================

mod lang;
mod page;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crawl::{Fetcher, PageSource};
use lang::LanguageDetector;
use page::{pair_paragraphs, paragraphs, Pair};

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_PAIRS_OUTPUT: &str = "data/bilingual_text.txt";

#[derive(Debug, Clone)]
pub struct PairsConfig {
    /// Sitemap written by the crawler
    pub sitemap: PathBuf,
    /// Corpus file, rewritten in full
    pub output: PathBuf,
    /// Pages fetched at once
    pub workers: usize,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairsSummary {
    pub sitemap: String,
    pub output: String,
    pub pages: usize,
    pub pages_with_pairs: usize,
    pub pairs: usize,
}

// Reads the sitemap, extracts pairs from every page, writes the corpus
pub async fn extract_bilingual_pairs(config: &PairsConfig) -> Result<PairsSummary> {
    let sitemap = tokio::fs::read_to_string(&config.sitemap)
        .await
        .with_context(|| format!("Failed to read sitemap {}", config.sitemap.display()))?;
    let urls = sitemap_urls(&sitemap);
    info!("Extracting bilingual text from {} page(s)", urls.len());

    let fetcher = Fetcher::new(config.workers.max(1), config.fetch_timeout, &config.user_agent)?;
    let detector = LanguageDetector::default();

    let per_page = collect_pairs(&fetcher, &detector, &urls, config.workers.max(1)).await;

    let pages_with_pairs = per_page.iter().filter(|pairs| !pairs.is_empty()).count();
    let all_pairs: Vec<Pair> = per_page.into_iter().flatten().collect();

    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&config.output, render(&all_pairs))
        .await
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    info!(
        "Wrote {} pair(s) from {} page(s) to {}",
        all_pairs.len(),
        pages_with_pairs,
        config.output.display()
    );

    Ok(PairsSummary {
        sitemap: config.sitemap.display().to_string(),
        output: config.output.display().to_string(),
        pages: urls.len(),
        pages_with_pairs,
        pairs: all_pairs.len(),
    })
}

// Non-blank, trimmed lines of the sitemap
fn sitemap_urls(sitemap: &str) -> Vec<String> {
    sitemap
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

// Fetches pages `workers` at a time
//
// buffered() (not buffer_unordered) keeps results in sitemap order, so the
// corpus comes out in the same order every run.
async fn collect_pairs<S: PageSource>(
    source: &S,
    detector: &LanguageDetector,
    urls: &[String],
    workers: usize,
) -> Vec<Vec<Pair>> {
    stream::iter(urls)
        .map(|url| page_pairs(source, detector, url))
        .buffered(workers)
        .collect()
        .await
}

async fn page_pairs<S: PageSource>(source: &S, detector: &LanguageDetector, url: &str) -> Vec<Pair> {
    match source.fetch(url).await {
        Ok(body) => {
            let pairs = pair_paragraphs(&paragraphs(&body), detector);
            debug!("{} pair(s) found on {}", pairs.len(), url);
            pairs
        }
        // Already logged by the fetcher
        Err(_) => Vec::new(),
    }
}

fn render(pairs: &[Pair]) -> String {
    pairs
        .iter()
        .map(|(vi, en)| format!("* {}\n+ {}\n", vi, en))
        .collect()
}
