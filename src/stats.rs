//! Summary statistics over a finished run's accepted article set.
//!
//! A pure derivation step: the loop hands over its accepted sequence and
//! this module reduces it to counts, an average body length, and the
//! publication date range. Nothing here performs I/O or mutates the run.

use crate::models::{Article, RunStatistics};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Compute [`RunStatistics`] for the accepted article set.
///
/// `unique_authors` counts distinct individual author names across all
/// articles, so a byline pair shared by two stories is counted once per
/// name. The date range spans only articles that declared a publication
/// timestamp. An empty set yields zero counts and `None` bounds.
#[instrument(level = "info", skip_all)]
pub fn summarize(articles: &[Article]) -> RunStatistics {
    let authors: HashSet<&str> = articles
        .iter()
        .flat_map(|article| article.authors.iter())
        .map(|name| name.as_str())
        .collect();

    let avg_article_length = if articles.is_empty() {
        0.0
    } else {
        let total: usize = articles.iter().map(|article| article.body.chars().count()).sum();
        total as f64 / articles.len() as f64
    };

    let published: Vec<_> = articles
        .iter()
        .filter_map(|article| article.published_at)
        .collect();

    let stats = RunStatistics {
        total_articles: articles.len(),
        unique_authors: authors.len(),
        avg_article_length,
        earliest_published: published.iter().min().copied(),
        latest_published: published.iter().max().copied(),
    };

    info!(
        total = stats.total_articles,
        unique_authors = stats.unique_authors,
        avg_length = stats.avg_article_length,
        "Computed run statistics"
    );
    stats
}
