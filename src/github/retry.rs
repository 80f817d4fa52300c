//! Bounded retry for GitHub API calls.
//!
//! Terraform applies resources in parallel, and sibling appliers mutate the same
//! organization without any coordination besides GitHub itself: a parent team
//! may not exist yet, or a team may be mid-rename. The reconciler compensates by
//! re-issuing certain calls a fixed number of times.
//!
//! - Default: 10 retries, 5s apart (fixed delay, no jitter)
//! - The delay may grow exponentially by setting a multiplier above 1.0; the
//!   number of attempts is unaffected.
//!
//! Which errors are retried is chosen per call site via [`RetryPolicy`].

use std::future::Future;
use std::time::Duration;

use super::error::{GitHubApiError, GitHubErrorKind};

/// Configuration for bounded retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential growth).
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry. 1.0 keeps it fixed.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Default retry configuration for team API calls.
    ///
    /// - 10 retries, 5s apart
    /// - Total max wait: 50 seconds
    pub const DEFAULT: Self = Self {
        max_retries: 10,
        initial_delay: Duration::from_secs(5),
        max_delay: Duration::from_secs(5),
        backoff_multiplier: 1.0,
    };

    /// Creates a new retry configuration.
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Creates a configuration that waits the same `delay` before every retry.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self::new(max_retries, delay, delay, 1.0)
    }

    /// Total number of attempts, including the initial one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Computes the delay for the given retry attempt (0-indexed).
    ///
    /// The delay grows as `initial_delay * backoff_multiplier^attempt`, capped at
    /// `max_delay`. With the default multiplier of 1.0 every delay is equal.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.backoff_multiplier == 1.0 {
            return self.initial_delay.min(self.max_delay);
        }
        let multiplier = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }

    /// Returns an iterator over all retry delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }

    /// Computes the total maximum wait time for all retries.
    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which errors a retry loop re-attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry on any error.
    ///
    /// Used for parent team lookups: a missing parent may simply not have been
    /// created yet by a concurrent applier.
    RetryAnyError,

    /// Retry on any error except the not-modified signal, which ends the loop.
    ///
    /// Used for reads: a 404 may be a rename still propagating.
    RetryUnlessNotModified,
}

impl RetryPolicy {
    /// Returns true if `err` should be followed by another attempt.
    pub fn should_retry(&self, err: &GitHubApiError) -> bool {
        match self {
            RetryPolicy::RetryAnyError => true,
            RetryPolicy::RetryUnlessNotModified => err.kind != GitHubErrorKind::NotModified,
        }
    }
}

/// Result of a retry loop.
#[derive(Debug)]
pub enum RetryResult<T> {
    /// The operation succeeded.
    Success(T),

    /// A retriable error occurred on every attempt.
    ExhaustedRetries {
        /// The last error encountered.
        last_error: GitHubApiError,
        /// Number of attempts made (including the initial attempt).
        attempts: u32,
    },

    /// An error the policy does not retry ended the loop.
    Stopped(GitHubApiError),
}

impl<T> RetryResult<T> {
    /// Converts to a Result, treating exhausted retries and stopping errors as Err.
    pub fn into_result(self) -> Result<T, GitHubApiError> {
        match self {
            RetryResult::Success(v) => Ok(v),
            RetryResult::ExhaustedRetries { last_error, .. } => Err(last_error),
            RetryResult::Stopped(e) => Err(e),
        }
    }
}

/// Executes an async operation with retry logic.
///
/// The operation is re-attempted, after the configured delay, whenever it
/// fails with an error `policy` accepts, up to `config.max_retries` times.
/// Errors the policy rejects are returned immediately.
///
/// `label` names the operation in the retry warnings.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let mut attempt = 0;
    let max_attempts = config.max_attempts();

    loop {
        match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => {
                attempt += 1;

                if !policy.should_retry(&e) {
                    return RetryResult::Stopped(e);
                }

                if attempt >= max_attempts {
                    return RetryResult::ExhaustedRetries {
                        last_error: e,
                        attempts: attempt,
                    };
                }

                tracing::warn!(
                    operation = label,
                    attempt,
                    max_retries = config.max_retries,
                    error = %e,
                    "{}: retry ({}/{})",
                    label,
                    attempt,
                    config.max_retries
                );

                let delay = config.delay_for_attempt(attempt - 1);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
