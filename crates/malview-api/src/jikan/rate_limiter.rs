//! Jikan API rate limiter.

use std::time::{Duration, Instant};

/// Default minimum interval between requests (1 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Sequential rate limiter for the Jikan API.
///
/// Serializes a single logical caller: each `wait()` returns only once
/// `min_interval` has elapsed since the previous `wait()` returned.
/// The first call never waits.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct JikanRateLimiter {
    /// Minimum interval between requests.
    min_interval: Duration,
    /// Time the previous `wait()` returned.
    last_request: Option<Instant>,
}

impl JikanRateLimiter {
    /// Creates a new rate limiter with the given minimum interval.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next request is allowed.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval.saturating_sub(elapsed);
                tracing::debug!(
                    wait_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                    "Jikan rate limit delay"
                );
                tokio::time::sleep(remaining).await;
            }
        }

        self.last_request = Some(Instant::now());
    }
}

impl Default for JikanRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
