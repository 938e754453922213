//! HTTP fetch capability with optional exponential-backoff retry.
//!
//! The pipeline never talks to `reqwest` directly; it consumes the
//! [`FetchAsync`] capability so the transport can be swapped or stubbed.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: Core trait defining an async URL fetch
//! - [`HttpFetcher`]: Production implementation backed by `reqwest`
//! - [`RetryFetch`]: Decorator that adds bounded retry to any `FetchAsync`
//!
//! # Retry Strategy
//!
//! Only transient failures are retried (transport errors, HTTP 5xx, and
//! 429). The delay between attempts follows:
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```
//!
//! A URL that exhausts its retries surfaces an ordinary [`FetchError`]; the
//! acquisition loop still records it as a single skipped attempt.

use rand::{Rng, rng};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};

/// User-Agent header sent with every article and sitemap request.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; news-harvester/0.1)";

/// Failure modes of a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, or timeout failure from the transport.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(StatusCode),
}

impl FetchError {
    /// Whether retrying this failure could plausibly succeed.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Trait for fetching the body of a URL.
///
/// Implementors resolve a URL to its response body, treating any non-2xx
/// status as an error. Decorators (like retry logic) wrap implementations
/// of this trait.
pub trait FetchAsync {
    /// Fetch `url` and return the response body.
    ///
    /// # Errors
    ///
    /// [`FetchError::Transport`] for connection-level failures,
    /// [`FetchError::Status`] for non-2xx responses.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Production [`FetchAsync`] implementation backed by a shared `reqwest`
/// client.
///
/// The client carries a fixed User-Agent and the per-request timeout from
/// configuration, so every component going through this fetcher inherits
/// both.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the underlying client cannot be
    /// constructed (e.g. TLS backend initialization failure).
    pub fn new(timeout: StdDuration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Fetch returned non-success status");
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched document"
        );
        Ok(body)
    }
}

/// Decorator that adds bounded exponential-backoff retry to any
/// [`FetchAsync`] implementation.
///
/// # Arguments to [`RetryFetch::new`]
///
/// * `inner` - The fetcher to wrap
/// * `max_retries` - Additional attempts after the first failure
/// * `base_delay` - Initial backoff delay (doubles per attempt, capped at
///   30 seconds)
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Wrap `inner` with retry behavior.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;

                    if attempt > self.max_retries || !e.is_transient() {
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "Fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
