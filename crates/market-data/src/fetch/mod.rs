//! Bounded retry wrapper for provider calls.
//!
//! Every attempt runs under its own timeout. Only errors classified as
//! [`RetryClass::WithBackoff`] are retried; anything else is returned as-is.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};

/// Timeout and retry budget for one logical fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt. `0` means one attempt only.
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub retry_pause: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_pause: Duration::from_millis(500),
        }
    }
}

impl FetchPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget is spent.
///
/// ```ignore
/// let rows = fetch_with_retry(provider.id(), &policy, || {
///     provider.get_reference(&tickers, &ReferenceField::ALL)
/// })
/// .await?;
/// ```
pub async fn fetch_with_retry<T, F, Fut>(
    provider_id: &str,
    policy: &FetchPolicy,
    mut op: F,
) -> Result<T, MarketDataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    let max_attempts = policy.max_retries.saturating_add(1);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let outcome = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout {
                provider: provider_id.to_string(),
                after_ms: policy.timeout.as_millis() as u64,
            }),
        };

        let err = match outcome {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", provider_id, attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if err.retry_class() == RetryClass::Never {
            return Err(err);
        }

        if attempt >= max_attempts {
            warn!(
                "{} giving up after {} attempts: {}",
                provider_id, attempt, err
            );
            return Err(MarketDataError::RetriesExhausted {
                provider: provider_id.to_string(),
                attempts: attempt,
                last_error: err.to_string(),
            });
        }

        warn!(
            "{} attempt {}/{} failed, retrying: {}",
            provider_id, attempt, max_attempts, err
        );
        tokio::time::sleep(policy.retry_pause).await;
    }
}
