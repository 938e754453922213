//! Data models for the article acquisition pipeline.
//!
//! This module defines the core data structures that flow through a run:
//! - [`SitemapEntry`]: One `<url>` element discovered in a publisher sitemap
//! - [`Article`]: A fully extracted, validated news article
//! - [`RunResult`]: The accepted article set plus acquisition tallies
//! - [`RunStatistics`]: A read-only summary derived from a finished run
//! - [`RunOutcome`]: What a run reports back to its caller
//!
//! `SitemapEntry` values are transient: the URL selector consumes them and
//! only the chosen URLs survive. An [`Article`] is never mutated after
//! construction; the acquisition loop either appends it to the result
//! sequence or drops it.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// A single URL entry discovered in a sitemap document.
///
/// # Fields
///
/// * `url` - The article URL from the `<loc>` element
/// * `last_modified` - Parsed `<lastmod>` timestamp, if the sitemap carried
///   one and it was parseable
#[derive(Debug, Clone)]
pub struct SitemapEntry {
    /// The page URL listed by the publisher.
    pub url: String,
    /// Last-modified timestamp, best-effort.
    pub last_modified: Option<DateTime<FixedOffset>>,
}

/// An extracted news article, the canonical unit of output.
///
/// Constructed once by the extractor and immutable afterwards. Within a
/// single run the `url` field is unique across all accepted articles; the
/// acquisition loop enforces this even when the sitemap lists a URL twice.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    /// The article headline. Non-empty once validated.
    pub headline: String,
    /// The article body text. Validation enforces a minimum length.
    pub body: String,
    /// Author names in the order the page listed them. May be empty.
    pub authors: Vec<String>,
    /// Publication timestamp, if the page declared one.
    pub published_at: Option<DateTime<FixedOffset>>,
    /// Best-effort language code, e.g. `"en"`.
    pub language: String,
    /// Host portion of `url`, e.g. `"www.theguardian.com"`.
    pub source_domain: String,
    /// The URL the article was extracted from. Unique key within a run.
    pub url: String,
    /// UTC time at which extraction succeeded.
    pub scraped_at: DateTime<Utc>,
}

impl Article {
    /// Join the author list into the single tabular `author_name` field.
    ///
    /// Order is preserved and names are separated by `", "`, so the output
    /// is deterministic for a given article.
    pub fn author_name(&self) -> String {
        self.authors.join(", ")
    }
}

/// Derive the host portion of a URL, e.g. `"www.theguardian.com"`.
///
/// Returns `None` when the string does not parse as a URL or has no host
/// component (e.g. `mailto:` links).
pub fn source_domain_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.to_string()))
}

/// The terminal output of the acquisition loop.
///
/// `attempted` counts every candidate the loop spent a rate-limited attempt
/// on; `accepted + failed == attempted` always holds.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Accepted articles in acceptance order.
    pub articles: Vec<Article>,
    /// Candidate URLs the loop attempted.
    pub attempted: u32,
    /// Articles that passed extraction and validation.
    pub accepted: u32,
    /// Attempts that ended in a skip (fetch, extraction, or validation).
    pub failed: u32,
}

/// Summary statistics computed once over a finished run's accepted set.
///
/// An empty accepted set produces zero counts and `None` date bounds; the
/// computation never fails.
#[derive(Debug, Serialize, PartialEq)]
pub struct RunStatistics {
    /// Number of accepted articles.
    pub total_articles: usize,
    /// Number of distinct author names across all accepted articles.
    pub unique_authors: usize,
    /// Mean body length in characters, `0.0` for an empty set.
    pub avg_article_length: f64,
    /// Earliest `published_at` among articles that declared one.
    pub earliest_published: Option<DateTime<FixedOffset>>,
    /// Latest `published_at` among articles that declared one.
    pub latest_published: Option<DateTime<FixedOffset>>,
}

/// What one complete run reports back to the caller.
///
/// A run with zero accepted articles from a non-empty candidate set is a
/// successful run with a low yield, not an error; callers judging yield
/// quality must inspect `accepted`, not merely `success`.
#[derive(Debug, Serialize)]
pub struct RunOutcome {
    /// Whether the run completed through the sink write.
    pub success: bool,
    /// Candidate URLs the loop attempted.
    pub attempted: u32,
    /// Articles accepted into the dataset.
    pub accepted: u32,
    /// Identifier of the written dataset: a filesystem path or `s3://` URL.
    pub destination: String,
    /// Summary statistics over the accepted set.
    pub statistics: RunStatistics,
}
