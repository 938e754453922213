//! Run configuration: defaults, optional YAML file, CLI overrides.
//!
//! Configuration is resolved exactly once, in `main`, into a [`RunConfig`]
//! value that is passed into the pipeline entry point. Core components
//! never read ambient process state (environment variables, global
//! clients), which keeps every one of them unit-testable with injected
//! values.
//!
//! Precedence, highest first: CLI flag (or its env fallback, handled by
//! clap) → config file value → built-in default.
//!
//! # Config File
//!
//! ```yaml
//! sitemap_url: https://www.theguardian.com/sitemaps/news.xml
//! max_articles: 10
//! delay_seconds: 1.0
//! destination:
//!   s3:
//!     bucket: news-datasets
//!     key_prefix: english-news
//! ```

use crate::cli::Cli;
use crate::outputs::sink::Destination;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const DEFAULT_SITEMAP_URL: &str = "https://www.theguardian.com/sitemaps/news.xml";
const DEFAULT_MAX_ARTICLES: usize = 10;
const DEFAULT_MAX_CANDIDATES: usize = 250;
const DEFAULT_DELAY_SECONDS: f64 = 1.0;
const DEFAULT_MIN_BODY_CHARS: usize = 200;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FETCH_RETRIES: usize = 2;
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_OUTPUT_PATH: &str = "articles.csv";
const DEFAULT_S3_KEY_PREFIX: &str = "english-news";

/// Configuration file problems. Fatal at startup, before any network work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Sitemap document to harvest article URLs from.
    pub sitemap_url: String,
    /// Stop once this many articles are accepted.
    pub max_articles: usize,
    /// Upper bound on candidate URLs taken from the sitemap.
    pub max_candidates: usize,
    /// Minimum spacing between extraction attempts, in seconds.
    pub delay_seconds: f64,
    /// Articles with a shorter body are rejected.
    pub min_body_chars: usize,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Transient-failure retries per fetch.
    pub fetch_retries: usize,
    /// Language code recorded when a page declares none.
    pub default_language: String,
    /// Optional wall-clock budget for the acquisition loop.
    pub time_budget_secs: Option<u64>,
    /// Where the dataset lands.
    pub destination: Destination,
}

impl RunConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_seconds.max(0.0))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs.map(Duration::from_secs)
    }

    /// Merge CLI arguments over file values over defaults.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Self {
        let destination = resolve_destination(cli, &file);
        Self {
            sitemap_url: cli
                .sitemap_url
                .clone()
                .or(file.sitemap_url)
                .unwrap_or_else(|| DEFAULT_SITEMAP_URL.to_string()),
            max_articles: cli
                .max_articles
                .or(file.max_articles)
                .unwrap_or(DEFAULT_MAX_ARTICLES),
            max_candidates: cli
                .max_candidates
                .or(file.max_candidates)
                .unwrap_or(DEFAULT_MAX_CANDIDATES),
            delay_seconds: cli
                .delay_seconds
                .or(file.delay_seconds)
                .unwrap_or(DEFAULT_DELAY_SECONDS),
            min_body_chars: cli
                .min_body_chars
                .or(file.min_body_chars)
                .unwrap_or(DEFAULT_MIN_BODY_CHARS),
            request_timeout_secs: cli
                .request_timeout_secs
                .or(file.request_timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            fetch_retries: cli
                .fetch_retries
                .or(file.fetch_retries)
                .unwrap_or(DEFAULT_FETCH_RETRIES),
            default_language: cli
                .default_language
                .clone()
                .or(file.default_language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            time_budget_secs: cli.time_budget_secs.or(file.time_budget_secs),
            destination,
        }
    }
}

fn resolve_destination(cli: &Cli, file: &FileConfig) -> Destination {
    if let Some(bucket) = &cli.s3_bucket {
        return Destination::S3 {
            bucket: bucket.clone(),
            key_prefix: cli
                .s3_key_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_S3_KEY_PREFIX.to_string()),
        };
    }
    if let Some(path) = &cli.output {
        return Destination::Local { path: path.clone() };
    }
    file.destination.clone().unwrap_or(Destination::Local {
        path: PathBuf::from(DEFAULT_OUTPUT_PATH),
    })
}

/// Values read from an optional YAML config file. Every field is optional;
/// unknown keys are rejected so typos surface instead of silently falling
/// back to defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub sitemap_url: Option<String>,
    pub max_articles: Option<usize>,
    pub max_candidates: Option<usize>,
    pub delay_seconds: Option<f64>,
    pub min_body_chars: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub fetch_retries: Option<usize>,
    pub default_language: Option<String>,
    pub time_budget_secs: Option<u64>,
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub destination: Option<Destination>,
}

impl FileConfig {
    /// Load and parse `path`.
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let parsed: FileConfig = serde_yaml::from_str(&raw)?;
        info!(%path, "Loaded configuration file");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["news_harvester"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_resolve_defaults() {
        let config = RunConfig::resolve(&cli(&[]), FileConfig::default());

        assert_eq!(config.sitemap_url, DEFAULT_SITEMAP_URL);
        assert_eq!(config.max_articles, 10);
        assert_eq!(config.delay_seconds, 1.0);
        assert_eq!(config.fetch_retries, 2);
        assert!(config.time_budget_secs.is_none());
        assert!(matches!(config.destination, Destination::Local { .. }));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            max_articles: Some(50),
            delay_seconds: Some(5.0),
            ..FileConfig::default()
        };
        let config = RunConfig::resolve(&cli(&["--max-articles", "3"]), file);

        assert_eq!(config.max_articles, 3);
        assert_eq!(config.delay_seconds, 5.0);
    }

    #[test]
    fn test_s3_flags_build_s3_destination() {
        let config = RunConfig::resolve(&cli(&["--s3-bucket", "news-data"]), FileConfig::default());
        match config.destination {
            Destination::S3 { bucket, key_prefix } => {
                assert_eq!(bucket, "news-data");
                assert_eq!(key_prefix, DEFAULT_S3_KEY_PREFIX);
            }
            other => panic!("expected S3 destination, got {other:?}"),
        }
    }

    #[test]
    fn test_file_destination_parses_yaml() {
        let yaml = r#"
max_articles: 7
destination:
  s3:
    bucket: news-datasets
    key_prefix: english-news
"#;
        let file: FileConfig = serde_yaml::from_str(yaml).unwrap();
        let config = RunConfig::resolve(&cli(&[]), file);

        assert_eq!(config.max_articles, 7);
        assert!(matches!(config.destination, Destination::S3 { .. }));
    }

    #[test]
    fn test_unknown_file_key_is_an_error() {
        let yaml = "max_articels: 7\n";
        assert!(serde_yaml::from_str::<FileConfig>(yaml).is_err());
    }

    #[test]
    fn test_negative_delay_clamps_to_zero() {
        let config = RunConfig::resolve(&cli(&["--delay-seconds=-2.5"]), FileConfig::default());
        assert_eq!(config.delay(), Duration::ZERO);
    }
}
