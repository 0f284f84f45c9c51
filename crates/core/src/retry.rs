//! Retry policy, retryability classification and the backoff loop used by the
//! inference gateway.
//!
//! [`RetryPolicy::default`] is built from [`MAX_RETRIES`], [`RETRY_DELAY`] and
//! [`RETRY_BACKOFF_MULTIPLIER`]. Sleeping goes through the [`Sleeper`] trait.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::genview_core::error::SdkError;

/// Total attempts per call, the first one included.
pub const MAX_RETRIES: u32 = 3;
/// Delay before the second attempt.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
/// Factor applied to the delay after every failed attempt.
pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;
/// Upper bound on any single backoff delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Lowercase substrings that mark an error as transient.
///
/// Rate limiting and gateway/service-unavailable signatures only. Anything
/// else is terminal for the call. Status codes only count in the
/// `http status NNN` form so digits inside upstream bodies never match.
pub const RETRYABLE_MARKERS: &[&str] = &[
    "http status 429",
    "rate limit",
    "resource_exhausted",
    "resource exhausted",
    "too many requests",
    "http status 502",
    "http status 503",
    "http status 504",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "unavailable",
    "overloaded",
];

/// Backoff configuration for one gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the initial one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Cap applied to every computed delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            initial_delay: RETRY_DELAY,
            backoff_multiplier: RETRY_BACKOFF_MULTIPLIER,
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Fails when `backoff_multiplier` is negative, NaN or infinite.
    pub fn custom(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
    ) -> Result<Self, SdkError> {
        if !backoff_multiplier.is_finite() || backoff_multiplier < 0.0 {
            return Err(SdkError::invalid_argument(format!(
                "backoff multiplier must be finite and non-negative, got {backoff_multiplier}"
            )));
        }
        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            ..Self::default()
        })
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// A single attempt, never retried.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based), capped at
    /// `max_delay`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        let cap_ms = self.max_delay.as_millis() as f64;
        let delay_ms = self.initial_delay.as_millis() as f64 * factor;
        // Negative products saturate to zero in the cast.
        Duration::from_millis(delay_ms.min(cap_ms) as u64)
    }
}

/// Classify error text against [`RETRYABLE_MARKERS`].
pub fn is_retryable_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    RETRYABLE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Whether the gateway should retry after `error`.
pub fn is_retryable(error: &SdkError) -> bool {
    is_retryable_message(&error.format_details())
}

/// Trait for determining if an error is retryable
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for SdkError {
    fn is_retryable(&self) -> bool {
        is_retryable(self)
    }
}

/// Suspension used between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up.
///
/// `on_retry` receives the failed attempt number, the delay about to be
/// slept, and the error.
pub async fn retry_with_backoff<F, Fut, T, E, S, R>(
    policy: &RetryPolicy,
    sleeper: &S,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable,
    S: Sleeper + ?Sized,
    R: FnMut(u32, Duration, &E),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_retryable() || attempt >= max_attempts {
                    return Err(err);
                }

                let delay = policy.backoff_for(attempt);
                on_retry(attempt, delay, &err);
                sleeper.sleep(delay).await;
            }
        }
    }
}
