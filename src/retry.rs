//! Retry policy for transport failures.
//!
//! Only failures where no HTTP response was received are retried. A response
//! of any status, including 4xx and 5xx, is final.

use rand::Rng;
use std::time::Duration;

/// Retry decision result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a delay.
    RetryAfter(Duration),
    /// Do not retry.
    DoNotRetry,
}

/// Which requests may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Never retry.
    Never,
    /// Retry only `GET` and `HEAD` requests.
    IdempotentOnly,
    /// Retry every request, including state-changing ones.
    Always,
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: usize,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum jitter added to each delay.
    pub max_jitter: Duration,
    pub strategy: RetryStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            max_jitter: Duration::from_millis(100),
            strategy: RetryStrategy::IdempotentOnly,
        }
    }
}

impl RetryPolicy {
    /// A policy that sends every request exactly once.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            strategy: RetryStrategy::Never,
            ..Self::default()
        }
    }

    /// Decide whether to retry after `attempt` failed attempts (1-based).
    ///
    /// `transient` tells whether the failure was a retryable transport
    /// failure (connect error, timeout).
    #[must_use]
    pub fn decide(&self, attempt: usize, idempotent: bool, transient: bool) -> RetryDecision {
        if attempt >= self.max_attempts.max(1) || !transient {
            return RetryDecision::DoNotRetry;
        }

        match self.strategy {
            RetryStrategy::Never => RetryDecision::DoNotRetry,
            RetryStrategy::IdempotentOnly if !idempotent => RetryDecision::DoNotRetry,
            _ => RetryDecision::RetryAfter(self.delay(attempt)),
        }
    }

    fn delay(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay);

        let jitter_max = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_max > 0 {
            rand::thread_rng().gen_range(0..=jitter_max)
        } else {
            0
        };

        backoff + Duration::from_millis(jitter)
    }
}
