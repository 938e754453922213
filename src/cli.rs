//! Command-line interface definitions.
//!
//! All options are optional at the CLI layer; resolution against the
//! optional config file and the built-in defaults happens in
//! [`crate::config`]. Most options also accept an environment variable,
//! which is how scheduled/containerized invocations configure a run.

use clap::Parser;
use std::path::PathBuf;

/// Harvest a news publisher's sitemap into a CSV dataset.
///
/// # Examples
///
/// ```sh
/// # Ten articles from the default sitemap into ./articles.csv
/// news_harvester
///
/// # A gentler crawl into S3
/// news_harvester -n 25 -d 2.0 --s3-bucket news-datasets
///
/// # Defaults from a config file, target count overridden
/// news_harvester -c harvest.yaml -n 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Sitemap URL to harvest article links from
    #[arg(short = 's', long, env = "SITEMAP_URL")]
    pub sitemap_url: Option<String>,

    /// Stop after accepting this many articles
    #[arg(short = 'n', long, env = "MAX_ARTICLES")]
    pub max_articles: Option<usize>,

    /// Upper bound on candidate URLs taken from the sitemap
    #[arg(long)]
    pub max_candidates: Option<usize>,

    /// Minimum delay between extraction attempts, in seconds
    #[arg(short = 'd', long, env = "REQUEST_DELAY_SECONDS")]
    pub delay_seconds: Option<f64>,

    /// Reject articles whose body is shorter than this many characters
    #[arg(long)]
    pub min_body_chars: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Transient-failure retries per article fetch
    #[arg(long)]
    pub fetch_retries: Option<usize>,

    /// Language code recorded when a page does not declare one
    #[arg(long)]
    pub default_language: Option<String>,

    /// Stop attempting new candidates after this many seconds and write
    /// whatever was accepted
    #[arg(long, env = "TIME_BUDGET_SECS")]
    pub time_budget_secs: Option<u64>,

    /// Local CSV output path
    #[arg(short = 'o', long, conflicts_with = "s3_bucket")]
    pub output: Option<PathBuf>,

    /// S3 bucket to upload the CSV to (switches the sink to S3)
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Key prefix for S3 uploads; objects are date-partitioned beneath it
    #[arg(long, env = "S3_KEY_PREFIX", requires = "s3_bucket")]
    pub s3_key_prefix: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short = 'c', long, env = "NEWS_HARVESTER_CONFIG")]
    pub config: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_empty_invocation() {
        let cli = Cli::parse_from(["news_harvester"]);
        assert!(cli.sitemap_url.is_none());
        assert!(cli.max_articles.is_none());
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_harvester",
            "-n",
            "25",
            "-d",
            "2.0",
            "-o",
            "/tmp/articles.csv",
        ]);

        assert_eq!(cli.max_articles, Some(25));
        assert_eq!(cli.delay_seconds, Some(2.0));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/articles.csv")));
    }

    #[test]
    fn test_cli_rejects_output_with_s3_bucket() {
        let result = Cli::try_parse_from([
            "news_harvester",
            "-o",
            "out.csv",
            "--s3-bucket",
            "news-datasets",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_key_prefix_requires_bucket() {
        let result = Cli::try_parse_from(["news_harvester", "--s3-key-prefix", "english-news"]);
        assert!(result.is_err());
    }
}
