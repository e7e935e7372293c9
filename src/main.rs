// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing)
// 3. Dispatch to the appropriate subcommand handler
// 4. Print a summary and exit with a proper code (0 = done, 2 = error)
//
// A crawl with failed pages still exits 0: individual fetch failures are
// part of a normal run and show up in the summary.
// =============================================================================

mod cli;     // src/cli.rs - command-line parsing
mod config;  // src/config.rs - crawl knobs and their defaults
mod crawl;   // src/crawl/ - the breadth-first crawler
mod pairs;   // src/pairs/ - bilingual pair extraction from a sitemap

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::{CrawlConfig, DEFAULT_USER_AGENT};
use crawl::CrawlSummary;
use pairs::{PairsConfig, PairsSummary};

#[tokio::main]
async fn main() {
    // Parse command-line arguments (clap exits on --help or bad input)
    let cli = Cli::parse();

    // Logging goes to stderr so --json output on stdout stays clean
    init_logging(cli.verbose);

    // Run the command and turn the outcome into an exit code
    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Installs the tracing subscriber
//
// RUST_LOG wins when set; otherwise -v / -vv pick the level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Crawl {
            seed_url,
            output,
            max_depth,
            max_urls_per_batch,
            max_concurrent,
            timeout_secs,
            extensions,
            json,
        } => {
            // Build the config from the flags, then check it before any I/O
            let config = CrawlConfig::new(seed_url, output)
                .with_max_depth(max_depth)
                .with_max_urls_per_batch(max_urls_per_batch)
                .with_max_concurrent_fetches(max_concurrent)
                .with_fetch_timeout(Duration::from_secs(timeout_secs))
                .with_extensions(cli::extensions_or_default(extensions))
                .validate()?;

            // Crawl, then report
            let summary = crawl::crawl_website(&config).await?;
            print_crawl_summary(&summary, json)
        }
        Commands::Pairs {
            sitemap,
            output,
            workers,
            timeout_secs,
            json,
        } => {
            let config = PairsConfig {
                sitemap,
                output,
                workers,
                fetch_timeout: Duration::from_secs(timeout_secs),
                user_agent: DEFAULT_USER_AGENT.to_string(),
            };

            // Read the sitemap, extract pairs, then report
            let summary = pairs::extract_bilingual_pairs(&config).await?;
            print_pairs_summary(&summary, json)
        }
    }
}

fn print_crawl_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    // One row per batch
    println!("{:<8} {:<12} {:<12} {:<12}", "DEPTH", "DISPATCHED", "DISCOVERED", "TOTAL");
    println!("{}", "=".repeat(44));
    for batch in &summary.batches {
        println!(
            "{:<8} {:<12} {:<12} {:<12}",
            batch.depth, batch.dispatched, batch.discovered, batch.total_visited
        );
    }
    println!();

    // Totals
    println!("📊 Summary for {}:", summary.seed);
    println!("   📄 Pages visited: {}", summary.pages_visited);
    println!("   ✅ Pages fetched: {}", summary.pages_fetched);
    println!(
        "   ❌ Failed: {} (timeouts {}, bad status {}, network {}, skipped {})",
        summary.failures.total(),
        summary.failures.timeouts,
        summary.failures.bad_status,
        summary.failures.network,
        summary.failures.skipped
    );
    if summary.checkpoint_failures > 0 {
        println!("   ⚠️  Checkpoint failures: {}", summary.checkpoint_failures);
    }
    println!("   💾 Sitemap: {}", summary.output);
    println!("   ⏱️  Took {:.1}s", summary.duration_ms as f64 / 1000.0);

    Ok(())
}

fn print_pairs_summary(summary: &PairsSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("📊 Summary for {}:", summary.sitemap);
    println!("   📄 Pages read: {}", summary.pages);
    println!("   🌐 Pages with pairs: {}", summary.pages_with_pairs);
    println!("   🔤 Pairs written: {}", summary.pairs);
    println!("   💾 Corpus: {}", summary.output);

    Ok(())
}
