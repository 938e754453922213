//! # News Harvester
//!
//! A sitemap-driven article acquisition pipeline: discover candidate URLs
//! from a news publisher's sitemap, fetch and extract each article at a
//! polite pace, validate and deduplicate the results, and write the
//! dataset as CSV to a local file or an S3 bucket along with run
//! statistics.
//!
//! ## Usage
//!
//! ```sh
//! news_harvester -n 10 -d 1.0 -o ./articles.csv
//! news_harvester --s3-bucket news-datasets --s3-key-prefix english-news
//! ```
//!
//! ## Architecture
//!
//! One run flows strictly left to right:
//! 1. **Discovery**: fetch and parse the sitemap (once per run)
//! 2. **Selection**: dedup and bound the candidate URL set
//! 3. **Acquisition**: rate-limited fetch → extract → validate loop;
//!    per-URL failures are logged and skipped, never fatal
//! 4. **Output**: summary statistics, then the CSV sink write
//!
//! Only a missing candidate set or a failed sink write aborts a run. The
//! process prints a JSON outcome report on stdout and exits non-zero on
//! fatal failure.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod extractor;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod ratelimit;
mod sitemap;
mod stats;

use cli::Cli;
use config::{FileConfig, RunConfig};
use outputs::sink;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_harvester starting up");

    // Parse CLI and resolve configuration
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path).await?,
        None => FileConfig::default(),
    };
    let config = RunConfig::resolve(&args, file_config);
    info!(
        sitemap_url = %config.sitemap_url,
        max_articles = config.max_articles,
        delay_seconds = config.delay_seconds,
        destination = %config.destination,
        "Resolved configuration"
    );

    // Early check: ensure a local destination is writable before crawling
    if let Err(e) = sink::ensure_writable(&config.destination).await {
        error!(
            destination = %config.destination,
            error = %e,
            "Destination is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    match pipeline::run_pipeline(config).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                secs = elapsed.as_secs(),
                attempted = outcome.attempted,
                accepted = outcome.accepted,
                destination = %outcome.destination,
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                classification = e.classification(),
                error = %e,
                attempted_secs = start_time.elapsed().as_secs(),
                "Run failed"
            );
            Err(e.into())
        }
    }
}
