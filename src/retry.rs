//! Bounded retry with exponential backoff, applied per single IMAP operation.

use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A retry policy: up to `max_retries` additional attempts, sleeping
/// `base_delay * 2^k` before attempt `k+1` (0-indexed).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Run `op` until it succeeds or `max_retries` attempts have failed.
    ///
    /// `describe` labels the operation for the retry warning log line
    /// (e.g. `"fetch UID 42"`), matching the message contract in the
    /// error handling design: operation, then cause.
    pub async fn run<T, F, Fut>(&self, describe: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    warn!(
                        "Attempt {}/{} failed for {}: {}; retrying in {:.0}s",
                        attempt + 1,
                        self.max_retries,
                        describe,
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
