//! Request pacing for the acquisition loop.
//!
//! A [`RateLimiter`] is a single shared gate per run: every extraction
//! attempt passes through [`RateLimiter::wait`] before touching the
//! network, so the effective request rate against the publisher never
//! exceeds `1 / delay`. It is purely a pacing primitive; it neither
//! retries nor inspects outcomes.
//!
//! Built on `tokio::time` so tests with a paused clock can assert the
//! spacing deterministically.

use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::trace;

/// Enforces a minimum delay between successive calls to [`wait`].
///
/// The first call returns immediately; each later call sleeps for the
/// configured delay minus the time already elapsed since the previous call
/// returned. One instance belongs to exactly one run.
///
/// [`wait`]: RateLimiter::wait
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_release: Option<Instant>,
}

impl RateLimiter {
    /// Create a gate with the given minimum spacing. A zero delay turns
    /// the gate into a no-op.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_release: None,
        }
    }

    /// Block until at least `delay` has passed since the previous `wait`
    /// returned. Never blocks on the first call.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_release {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                let pause = self.delay - elapsed;
                trace!(?pause, "Pacing before next request");
                sleep(pause).await;
            }
        }
        self.last_release = Some(Instant::now());
    }
}
