//! Retry with exponential backoff.

use crate::Result;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently a failing call is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(retry as i32);
        self.base_delay.mul_f64(factor)
    }

    /// Total number of attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Run `call` until it succeeds, fails permanently, or retries run out.
///
/// Only errors for which [`crate::Error::is_transient`] holds are retried.
/// The last error is returned when retries are exhausted.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:.1}s...",
                    operation,
                    retry + 1,
                    policy.max_attempts(),
                    e,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!(
                        "{} failed after {} attempts: {}",
                        operation,
                        policy.max_attempts(),
                        e
                    );
                }
                return Err(e);
            }
        }
    }
}
