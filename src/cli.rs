// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: map a website into a sitemap file
// - pairs: read that sitemap and extract Vietnamese/English sentence pairs
//
// Every default here comes from the constants in config.rs / pairs, so the
// CLI, the library defaults and the tests always agree.
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::{
    DEFAULT_EXTENSIONS, DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_URLS_PER_BATCH, DEFAULT_OUTPUT, DEFAULT_TIMEOUT_SECS,
};
use crate::pairs::{DEFAULT_PAIRS_OUTPUT, DEFAULT_WORKERS};

#[derive(Parser, Debug)]
#[command(
    name = "site-mapper",
    version,
    about = "Map every HTML page of a website into a sitemap file",
    long_about = "site-mapper crawls a website breadth-first from a seed URL, staying on the \
                  seed's scheme, host and port, and writes every page it finds to a sorted \
                  sitemap file after each batch."
)]
pub struct Cli {
    /// More logging (-v = debug, -vv = trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and write its sitemap
    ///
    /// Example: site-mapper crawl https://example.com --max-depth 2
    Crawl {
        /// Absolute URL to start from (e.g., https://example.com)
        seed_url: String,

        /// Sitemap file, rewritten after every batch
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Deepest link level to fetch (the seed is depth 1)
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Most URLs fetched together in one batch
        #[arg(long, default_value_t = DEFAULT_MAX_URLS_PER_BATCH)]
        max_urls_per_batch: usize,

        /// Most HTTP requests in flight at once
        #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_FETCHES)]
        max_concurrent: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Accepted path extension, repeatable (use "" for extensionless URLs)
        ///
        /// Defaults to "", ".htm" and ".html"
        #[arg(long = "extension", value_name = "EXT")]
        extensions: Vec<String>,

        /// Print the run summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Extract Vietnamese/English sentence pairs from the pages of a sitemap
    ///
    /// Example: site-mapper pairs --sitemap data/sitemap.txt
    Pairs {
        /// Sitemap written by `crawl`
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        sitemap: PathBuf,

        /// Corpus file ("* vietnamese" / "+ english" lines)
        #[arg(short, long, default_value = DEFAULT_PAIRS_OUTPUT)]
        output: PathBuf,

        /// Pages fetched at once
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

// Extensions from the command line, or the defaults when none were given
pub fn extensions_or_default(extensions: Vec<String>) -> Vec<String> {
    if extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        extensions
    }
}
