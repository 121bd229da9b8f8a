use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{BackoffBuilder, Retryable};

use crate::error::GrokError;

/// Total attempts per outbound call (first try included)
pub const MAX_ATTEMPTS: u32 = 3;
/// Base delay step; the n-th retry waits `n * DEFAULT_STEP`
pub const DEFAULT_STEP: Duration = Duration::from_millis(2000);

/// Fixed-step retry policy
///
/// The wait after failed attempt `i` (0-based) is `(i + 1) * step`, so the
/// default policy produces 2000ms, 4000ms, ... with no jitter and no cap
/// other than `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay unit multiplied by the attempt number
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            step: DEFAULT_STEP,
        }
    }
}

impl RetryPolicy {
    /// Policy with the default attempt count and a custom step
    #[must_use]
    pub fn with_step(step: Duration) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows failed attempt `attempt_index` (0-based)
    #[must_use]
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.step.saturating_mul(attempt_index.saturating_add(1))
    }

    /// Backoff builder handed to `backon`
    #[must_use]
    pub const fn builder(&self) -> LinearBuilder {
        LinearBuilder { policy: *self }
    }
}

/// `backon` builder yielding `step, 2*step, ...` for `max_attempts - 1` retries
#[derive(Debug, Clone, Copy)]
pub struct LinearBuilder {
    policy: RetryPolicy,
}

impl BackoffBuilder for LinearBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            policy: self.policy,
            attempt: 0,
        }
    }
}

/// Iterator of retry delays produced by [`LinearBuilder`]
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt.saturating_add(1) >= self.policy.max_attempts {
            return None;
        }
        let delay = self.policy.delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}

/// Determines if an HTTP status code should trigger a retry
///
/// Retries on: 429, 500, 502, 503, 504
#[must_use]
pub const fn is_retryable_status(code: u16) -> bool {
    matches!(code, 429 | 500 | 502 | 503 | 504)
}

/// Runs `op` under `policy`, sleeping with tokio's timer between attempts.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once attempts are exhausted.
pub async fn run_with_retry<T, F, Fut>(policy: RetryPolicy, op: F) -> Result<T, GrokError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GrokError>>,
{
    run_with_retry_using(policy, op, tokio::time::sleep).await
}

/// Same as [`run_with_retry`] with a caller-supplied sleeper.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once attempts are exhausted.
pub async fn run_with_retry_using<T, F, Fut, S, SFut>(
    policy: RetryPolicy,
    op: F,
    sleeper: S,
) -> Result<T, GrokError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GrokError>>,
    S: Fn(Duration) -> SFut + 'static,
    SFut: Future<Output = ()>,
{
    let retries = AtomicU32::new(0);
    op.retry(policy.builder())
        .sleep(sleeper)
        .when(GrokError::is_retryable)
        .notify(|err: &GrokError, delay: Duration| {
            let retry = retries.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                retry,
                max_attempts = policy.max_attempts,
                status = err.status(),
                delay_ms = delay.as_millis(),
                "Grok request failed, retrying: {err}"
            );
        })
        .await
}
