//! Retry policy: bounded attempts, fixed delay, overall time budget.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{ConfigError, DispatchError, StoreError};

/// Which store errors are retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// Retry only `StoreError::Transient`. Permanent and not-found errors
    /// surface after the first attempt.
    #[default]
    TransientOnly,

    /// Retry every error identically, permanent ones included.
    /// Kept for deployments that depend on the old behavior.
    Uniform,
}

/// Retry policy for store operations.
///
/// Fixed delay between attempts: no jitter, no exponential growth.
/// `budget` bounds the whole loop (attempts and delays together).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,

    /// Delay between two attempts.
    pub delay: Duration,

    /// Overall time budget for one operation.
    pub budget: Duration,

    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    /// 3 attempts, 100 ms apart, within 10 s.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(100),
            budget: Duration::from_secs(10),
            mode: RetryMode::TransientOnly,
        }
    }
}

impl RetryPolicy {
    pub fn uniform(mut self) -> Self {
        self.mode = RetryMode::Uniform;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.budget.is_zero() {
            return Err(ConfigError::ZeroBudget);
        }
        Ok(())
    }

    /// Delay before the attempt following `attempts` failed ones.
    ///
    /// Constant on purpose: the delay does not grow with the attempt number.
    pub fn next_delay(&self, _attempts: u32) -> Duration {
        self.delay
    }

    pub fn should_retry(&self, err: &StoreError) -> bool {
        match self.mode {
            RetryMode::TransientOnly => err.is_transient(),
            RetryMode::Uniform => true,
        }
    }

    /// Run `operation` under this policy.
    ///
    /// Returns the first success, or the last error once attempts are used up
    /// or the error is not retryable. If `budget` expires first, the in-flight
    /// call is dropped and `DispatchError::Timeout` is returned.
    /// Only retries are logged here; the final error is the caller's to report.
    pub async fn run<T, F, Fut>(&self, op: &'static str, mut operation: F) -> Result<T, DispatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempts = 0u32;
        let result =
            tokio::time::timeout(self.budget, self.attempt_loop(op, &mut operation, &mut attempts))
                .await;

        match result {
            Ok(result) => result,
            Err(_) => {
                debug!(op, attempts, budget_ms = self.budget.as_millis() as u64, "store operation timed out");
                Err(DispatchError::Timeout {
                    budget: self.budget,
                    attempts,
                })
            }
        }
    }

    async fn attempt_loop<T, F, Fut>(
        &self,
        op: &'static str,
        operation: &mut F,
        attempts: &mut u32,
    ) -> Result<T, DispatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        loop {
            *attempts += 1;
            let err = match operation().await {
                Ok(value) => {
                    if *attempts > 1 {
                        debug!(op, attempts = *attempts, "store operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if *attempts >= self.max_attempts || !self.should_retry(&err) {
                debug!(op, attempts = *attempts, error = %err, "store operation gave up");
                return Err(DispatchError::Store {
                    attempts: *attempts,
                    source: err,
                });
            }

            warn!(op, attempt = *attempts, error = %err, "store operation failed, retrying");
            tokio::time::sleep(self.next_delay(*attempts)).await;
        }
    }
}
