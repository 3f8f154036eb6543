//! Bounded exponential backoff for transient backend failures.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::PaymentError;

/// Retry parameters for calls to the payment backend.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// First backoff delay; doubles on each retry
    pub base_delay: Duration,
    /// Total attempts before giving up
    pub max_attempts: u32,
    /// Per-call timeout; an elapsed call counts as a transient failure
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(200),
            max_attempts: 4,
            call_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry)
    }
}

/// Run a backend call under the retry policy.
///
/// `Transient` failures (including per-call timeouts) back off and retry
/// up to the attempt cap, then surface as `ServiceUnavailable`. Any other
/// outcome, success or terminal error, returns immediately.
pub(crate) async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &'static str,
    mut op: F,
) -> Result<T, PaymentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PaymentError>>,
{
    let mut attempts = 0u32;
    loop {
        let outcome = match tokio::time::timeout(policy.call_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(PaymentError::Transient(format!("{op_name} call timed out"))),
        };

        match outcome {
            Err(PaymentError::Transient(reason)) => {
                attempts += 1;
                if attempts >= policy.max_attempts {
                    warn!(op = op_name, attempts, %reason, "payment backend unavailable, giving up");
                    return Err(PaymentError::ServiceUnavailable { attempts });
                }
                let delay = policy.delay_for(attempts - 1);
                debug!(
                    op = op_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    %reason,
                    "transient backend failure, backing off"
                );
                tokio::time::sleep(delay).await;
            },
            other => return other,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
