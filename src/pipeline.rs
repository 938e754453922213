//! The acquisition loop and the run orchestration around it.
//!
//! This is the heart of the crate. One run flows strictly left to right:
//! sitemap fetch → candidate selection → rate-limited extract/validate
//! loop → statistics → sink write. Per-URL failures are isolated here:
//! they are logged, counted, and converted into skips. Only two things
//! abort a run — failing to acquire the candidate set, and failing to
//! persist the result.
//!
//! # Loop Invariants
//!
//! - `accepted <= attempted <= candidates.len()`
//! - `accepted + failed == attempted`
//! - no two accepted articles share a URL
//! - each attempted candidate produces exactly one classified log record
//!
//! The loop never retries a failed URL; any retrying happens inside the
//! fetch capability, invisibly to the loop's bookkeeping.

use crate::config::RunConfig;
use crate::extractor::{ArticleExtractor, ExtractArticle, HtmlContentExtractor};
use crate::fetch::{HttpFetcher, RetryFetch};
use crate::models::{Article, RunOutcome, RunResult};
use crate::outputs::sink::{self, SinkError};
use crate::ratelimit::RateLimiter;
use crate::sitemap::{SitemapError, SitemapSource, select_candidates};
use crate::stats;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Why the validator refused an extracted article.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("empty headline")]
    EmptyHeadline,
    #[error("body too short ({len} chars, minimum {min})")]
    BodyTooShort { len: usize, min: usize },
    #[error("url already accepted this run")]
    DuplicateUrl,
}

/// Minimum-quality gate for extracted articles.
///
/// A pure predicate over the article and the set of already-accepted URLs;
/// it never mutates either.
#[derive(Debug)]
pub struct Validator {
    min_body_chars: usize,
}

impl Validator {
    pub fn new(min_body_chars: usize) -> Self {
        Self { min_body_chars }
    }

    /// Accept or reject `article` against the current run state.
    pub fn validate(
        &self,
        article: &Article,
        accepted_urls: &HashSet<String>,
    ) -> Result<(), RejectReason> {
        if article.headline.trim().is_empty() {
            return Err(RejectReason::EmptyHeadline);
        }
        let len = article.body.chars().count();
        if len < self.min_body_chars {
            return Err(RejectReason::BodyTooShort {
                len,
                min: self.min_body_chars,
            });
        }
        if accepted_urls.contains(&article.url) {
            return Err(RejectReason::DuplicateUrl);
        }
        Ok(())
    }
}

/// The per-run orchestrator: walks candidate URLs through the rate gate,
/// the extractor, and the validator, collecting accepted articles.
///
/// Owns its [`RateLimiter`] and result sequence exclusively, so concurrent
/// runs in the same process never share mutable state.
pub struct AcquisitionLoop<E> {
    source: E,
    limiter: RateLimiter,
    validator: Validator,
    max_articles: usize,
    deadline: Option<Instant>,
}

impl<E> AcquisitionLoop<E>
where
    E: ExtractArticle,
{
    /// # Arguments
    ///
    /// * `source` - Article extraction capability
    /// * `limiter` - Pacing gate, owned by this run
    /// * `validator` - Minimum-quality gate
    /// * `max_articles` - Stop once this many articles are accepted
    /// * `time_budget` - Optional wall-clock budget; when exhausted the
    ///   loop stops attempting new candidates so the run still reaches the
    ///   sink with what it has
    pub fn new(
        source: E,
        limiter: RateLimiter,
        validator: Validator,
        max_articles: usize,
        time_budget: Option<Duration>,
    ) -> Self {
        Self {
            source,
            limiter,
            validator,
            max_articles,
            deadline: time_budget.map(|budget| Instant::now() + budget),
        }
    }

    /// Process `candidates` in order until the target count is reached or
    /// candidates are exhausted.
    ///
    /// Never fails: every per-URL failure is recorded as a skip. A result
    /// with zero accepted articles is a successful low-yield run.
    #[instrument(level = "info", skip_all, fields(candidates = candidates.len(), target = self.max_articles))]
    pub async fn run(&mut self, candidates: &[String]) -> RunResult {
        let mut result = RunResult::default();
        let mut accepted_urls: HashSet<String> = HashSet::new();

        for url in candidates {
            if (result.accepted as usize) >= self.max_articles {
                break;
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    warn!(
                        attempted = result.attempted,
                        accepted = result.accepted,
                        "Time budget exhausted; finishing run early"
                    );
                    break;
                }
            }

            self.limiter.wait().await;
            result.attempted += 1;

            let article = match self.source.extract(url).await {
                Ok(article) => article,
                Err(e) => {
                    result.failed += 1;
                    warn!(%url, reason = %e, "Candidate skipped");
                    continue;
                }
            };

            if let Err(reason) = self.validator.validate(&article, &accepted_urls) {
                result.failed += 1;
                warn!(%url, reason = %reason, "Candidate skipped");
                continue;
            }

            accepted_urls.insert(article.url.clone());
            result.articles.push(article);
            result.accepted += 1;
            info!(
                %url,
                accepted = result.accepted,
                target = self.max_articles,
                "Article accepted"
            );
        }

        info!(
            attempted = result.attempted,
            accepted = result.accepted,
            failed = result.failed,
            "Acquisition loop finished"
        );
        result
    }
}

/// Fatal run failures: everything per-URL stays inside the loop.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Sitemap(#[from] SitemapError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl PipelineError {
    /// Stable machine-readable classification for the outcome report.
    pub fn classification(&self) -> &'static str {
        match self {
            PipelineError::Sitemap(SitemapError::Unavailable(_)) => "source_unavailable",
            PipelineError::Sitemap(SitemapError::Malformed(_)) => "malformed_sitemap",
            PipelineError::Sitemap(SitemapError::NoCandidates) => "no_candidates",
            PipelineError::Sink(_) => "sink_write_failed",
        }
    }
}

/// Execute one complete run from sitemap fetch through sink write.
///
/// # Errors
///
/// [`PipelineError::Sitemap`] when no candidate set can be produced,
/// [`PipelineError::Sink`] when the dataset cannot be persisted. A run
/// that attempts candidates and accepts none is `Ok` with
/// `accepted = 0` — callers judge yield from the outcome, not from
/// `success` alone.
#[instrument(level = "info", skip_all, fields(sitemap_url = %config.sitemap_url))]
pub async fn run_pipeline(config: RunConfig) -> Result<RunOutcome, PipelineError> {
    let fetcher =
        HttpFetcher::new(config.request_timeout()).map_err(SitemapError::Unavailable)?;

    let source = SitemapSource::new(fetcher.clone());
    let entries = source.fetch_entries(&config.sitemap_url).await?;
    let candidates = select_candidates(&entries, config.max_candidates);
    if candidates.is_empty() {
        return Err(SitemapError::NoCandidates.into());
    }

    let article_fetch = RetryFetch::new(fetcher, config.fetch_retries, Duration::from_secs(1));
    let extractor = ArticleExtractor::new(
        article_fetch,
        HtmlContentExtractor,
        config.default_language.clone(),
    );
    let mut acquisition = AcquisitionLoop::new(
        extractor,
        RateLimiter::new(config.delay()),
        Validator::new(config.min_body_chars),
        config.max_articles,
        config.time_budget(),
    );
    let result = acquisition.run(&candidates).await;

    let statistics = stats::summarize(&result.articles);
    let destination = sink::write_run(&result.articles, &config.destination).await?;

    Ok(RunOutcome {
        success: true,
        attempted: result.attempted,
        accepted: result.accepted,
        destination,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ScrapeError;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn article_at(url: &str, body: &str) -> Article {
        Article {
            headline: "Headline".to_string(),
            body: body.to_string(),
            authors: vec!["Jo Writer".to_string()],
            published_at: None,
            language: "en".to_string(),
            source_domain: "example.com".to_string(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        }
    }

    /// Scripted extraction capability: succeeds with a canned body unless
    /// the URL is listed as failing or overridden with a custom body.
    #[derive(Default)]
    struct ScriptedSource {
        failing: HashSet<String>,
        bodies: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn failing(urls: &[&str]) -> Self {
            Self {
                failing: urls.iter().map(|u| u.to_string()).collect(),
                ..Self::default()
            }
        }

        fn with_body(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ExtractArticle for ScriptedSource {
        async fn extract(&self, url: &str) -> Result<Article, ScrapeError> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.failing.contains(url) {
                return Err(ScrapeError::Extraction("no usable content".to_string()));
            }
            let body = self
                .bodies
                .get(url)
                .cloned()
                .unwrap_or_else(|| "A body comfortably over the minimum length.".to_string());
            Ok(article_at(url, &body))
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    fn acquisition(source: ScriptedSource, max_articles: usize) -> AcquisitionLoop<ScriptedSource> {
        AcquisitionLoop::new(
            source,
            RateLimiter::new(Duration::ZERO),
            Validator::new(10),
            max_articles,
            None,
        )
    }

    #[tokio::test]
    async fn test_loop_stops_at_target() {
        let candidates = urls(&["u1", "u2", "u3", "u4", "u5"]);
        let mut acquisition = acquisition(ScriptedSource::default(), 3);

        let result = acquisition.run(&candidates).await;
        assert_eq!(result.attempted, 3);
        assert_eq!(result.accepted, 3);
        assert_eq!(result.failed, 0);
        assert_eq!(acquisition.source.calls(), urls(&["u1", "u2", "u3"]));
    }

    #[tokio::test]
    async fn test_loop_isolates_mid_run_failure() {
        let candidates = urls(&["u1", "u2", "u3"]);
        let mut acquisition = acquisition(ScriptedSource::failing(&["u2"]), 3);

        let result = acquisition.run(&candidates).await;
        assert_eq!(result.attempted, 3);
        assert_eq!(result.accepted, 2);
        assert_eq!(result.failed, 1);
        let accepted: Vec<&str> = result.articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(accepted, vec!["u1", "u3"]);
    }

    #[tokio::test]
    async fn test_loop_rejects_short_body() {
        let candidates = urls(&["u1", "u2"]);
        let source = ScriptedSource::default().with_body("u1", "tiny");
        let mut acquisition = acquisition(source, 2);

        let result = acquisition.run(&candidates).await;
        assert_eq!(result.attempted, 2);
        assert_eq!(result.accepted, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.articles[0].url, "u2");
    }

    #[tokio::test]
    async fn test_loop_rejects_duplicate_url() {
        let candidates = urls(&["u1", "u1"]);
        let mut acquisition = acquisition(ScriptedSource::default(), 5);

        let result = acquisition.run(&candidates).await;
        assert_eq!(result.attempted, 2);
        assert_eq!(result.accepted, 1);
        assert_eq!(result.failed, 1);
    }

    #[tokio::test]
    async fn test_loop_zero_yield_is_not_an_error() {
        let candidates = urls(&["u1", "u2"]);
        let mut acquisition = acquisition(ScriptedSource::failing(&["u1", "u2"]), 5);

        let result = acquisition.run(&candidates).await;
        assert_eq!(result.attempted, 2);
        assert_eq!(result.accepted, 0);
        assert_eq!(result.failed, 2);
        assert!(result.articles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_respects_time_budget() {
        let candidates = urls(&["u1", "u2"]);
        let mut acquisition = AcquisitionLoop::new(
            ScriptedSource::default(),
            RateLimiter::new(Duration::ZERO),
            Validator::new(10),
            5,
            Some(Duration::ZERO),
        );

        let result = acquisition.run(&candidates).await;
        assert_eq!(result.attempted, 0);
        assert_eq!(result.accepted, 0);
    }

    #[tokio::test]
    async fn test_loop_count_invariants() {
        let candidates = urls(&["u1", "u2", "u3", "u4"]);
        let mut acquisition = acquisition(ScriptedSource::failing(&["u1", "u3"]), 2);

        let result = acquisition.run(&candidates).await;
        assert!(result.accepted <= result.attempted);
        assert!(result.attempted as usize <= candidates.len());
        assert_eq!(result.accepted + result.failed, result.attempted);
    }

    #[test]
    fn test_validator_accepts_good_article() {
        let validator = Validator::new(10);
        let article = article_at("u1", "long enough body text");
        assert!(validator.validate(&article, &HashSet::new()).is_ok());
    }

    #[test]
    fn test_validator_rejects_empty_headline() {
        let validator = Validator::new(10);
        let mut article = article_at("u1", "long enough body text");
        article.headline = "   ".to_string();
        assert_eq!(
            validator.validate(&article, &HashSet::new()),
            Err(RejectReason::EmptyHeadline)
        );
    }

    #[test]
    fn test_validator_rejects_short_body() {
        let validator = Validator::new(100);
        let article = article_at("u1", "short");
        assert_eq!(
            validator.validate(&article, &HashSet::new()),
            Err(RejectReason::BodyTooShort { len: 5, min: 100 })
        );
    }

    #[test]
    fn test_validator_rejects_already_accepted_url() {
        let validator = Validator::new(5);
        let article = article_at("u1", "long enough body text");
        let accepted: HashSet<String> = [String::from("u1")].into();
        assert_eq!(
            validator.validate(&article, &accepted),
            Err(RejectReason::DuplicateUrl)
        );
    }
}
