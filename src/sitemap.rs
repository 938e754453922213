//! Sitemap discovery and candidate URL selection.
//!
//! The first phase of every run: fetch the publisher's sitemap once, parse
//! it into ordered [`SitemapEntry`] values, and narrow those down to the
//! working set of candidate URLs the acquisition loop will attempt.
//!
//! # Parsing
//!
//! Sitemaps are XML documents in the `sitemaps.org` schema:
//!
//! ```text
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/2026/article</loc>
//!     <lastmod>2026-08-06T10:00:00Z</lastmod>
//!   </url>
//! </urlset>
//! ```
//!
//! Publisher extensions (`news:news`, image elements, priorities) are
//! ignored. An entry without a `<loc>` is dropped; a `<lastmod>` that does
//! not parse becomes `None` rather than an error.

use crate::fetch::{FetchAsync, FetchError};
use crate::models::SitemapEntry;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Fatal failures while acquiring the candidate set.
///
/// Either variant aborts the run: without a parseable sitemap there are no
/// candidates to attempt.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// The sitemap document could not be fetched (transport failure or
    /// non-2xx status).
    #[error("sitemap unavailable: {0}")]
    Unavailable(#[from] FetchError),
    /// The response body is not well-formed sitemap XML.
    #[error("malformed sitemap: {0}")]
    Malformed(#[from] quick_xml::DeError),
    /// The sitemap parsed but yielded no candidate URLs to attempt.
    #[error("sitemap yielded no candidate URLs")]
    NoCandidates,
}

#[derive(Debug, Deserialize)]
struct Urlset {
    #[serde(rename = "url", default)]
    urls: Vec<UrlElement>,
}

#[derive(Debug, Deserialize)]
struct UrlElement {
    loc: Option<String>,
    lastmod: Option<String>,
}

/// Fetches and parses a publisher sitemap into an ordered entry sequence.
///
/// Generic over the fetch capability so tests can feed canned documents.
/// Called at most once per run; there is no pagination.
pub struct SitemapSource<F> {
    fetcher: F,
}

impl<F> SitemapSource<F>
where
    F: FetchAsync,
{
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Fetch `sitemap_url` and return its entries in document order.
    ///
    /// No filtering happens here; the selector decides which URLs become
    /// candidates.
    ///
    /// # Errors
    ///
    /// [`SitemapError::Unavailable`] on transport failure or non-2xx
    /// status, [`SitemapError::Malformed`] when the body does not parse as
    /// sitemap XML.
    #[instrument(level = "info", skip_all, fields(%sitemap_url))]
    pub async fn fetch_entries(&self, sitemap_url: &str) -> Result<Vec<SitemapEntry>, SitemapError> {
        let body = self.fetcher.fetch(sitemap_url).await?;
        let urlset: Urlset = quick_xml::de::from_str(&body)?;

        let entries: Vec<SitemapEntry> = urlset
            .urls
            .into_iter()
            .filter_map(|element| {
                let url = element.loc.map(|loc| loc.trim().to_string())?;
                if url.is_empty() {
                    return None;
                }
                Some(SitemapEntry {
                    url,
                    last_modified: element.lastmod.as_deref().and_then(parse_lastmod),
                })
            })
            .collect();

        info!(count = entries.len(), "Indexed sitemap URLs");
        debug!(urls = ?entries.iter().map(|e| &e.url).collect::<Vec<_>>(), "Sitemap URLs");
        Ok(entries)
    }
}

/// Parse a `<lastmod>` value: RFC 3339 first, then a bare `YYYY-MM-DD`
/// date, which becomes midnight UTC.
fn parse_lastmod(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}

/// Narrow sitemap entries to the candidate URL working set.
///
/// Deterministic: preserves document order, drops repeated URLs (first
/// occurrence wins, so a duplicate never costs a rate-limited attempt), and
/// truncates to `max_count`. A `max_count` of zero yields no candidates.
pub fn select_candidates(entries: &[SitemapEntry], max_count: usize) -> Vec<String> {
    let candidates: Vec<String> = entries
        .iter()
        .map(|entry| entry.url.clone())
        .unique()
        .take(max_count)
        .collect();

    debug!(
        total = entries.len(),
        selected = candidates.len(),
        max_count,
        "Selected candidate URLs"
    );
    candidates
}
