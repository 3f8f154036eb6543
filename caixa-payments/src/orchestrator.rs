//! Payment orchestrator: authorize → capture → refund over a pluggable
//! backend.
//!
//! The orchestrator owns every PaymentIntent and enforces the state
//! machine and amount ceilings no matter which backend is plugged in.
//! Concurrent operations against the same intent are serialized by a
//! per-intent async mutex; unrelated intents never contend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use caixa_domain::{DomainError, Money};

use crate::error::{PaymentError, PaymentResult};
use crate::intent::{PaymentIntent, PaymentIntentId, PaymentState};
use crate::ports::PaymentBackendPort;
use crate::retry::{with_backoff, RetryPolicy};

/// Orchestrates payment operations with retry and state enforcement.
pub struct PaymentOrchestrator<B: PaymentBackendPort> {
    backend: Arc<B>,
    intents: RwLock<HashMap<PaymentIntentId, Arc<tokio::sync::Mutex<PaymentIntent>>>>,
    retry: RetryPolicy,
}

impl<B: PaymentBackendPort> PaymentOrchestrator<B> {
    /// Create a new orchestrator over a backend.
    pub fn new(backend: Arc<B>, retry: RetryPolicy) -> Self {
        Self {
            backend,
            intents: RwLock::new(HashMap::new()),
            retry,
        }
    }

    fn insert_intent(&self, intent: PaymentIntent) -> PaymentIntentId {
        let id = intent.id;
        let mut intents = self.intents.write().unwrap();
        intents.insert(id, Arc::new(tokio::sync::Mutex::new(intent)));
        id
    }

    fn intent_cell(
        &self,
        id: PaymentIntentId,
    ) -> PaymentResult<Arc<tokio::sync::Mutex<PaymentIntent>>> {
        let intents = self.intents.read().unwrap();
        intents.get(&id).cloned().ok_or(PaymentError::IntentNotFound(id))
    }

    /// Authorize a payment.
    ///
    /// Transient backend failures are retried with bounded exponential
    /// backoff before surfacing `ServiceUnavailable`. A decline is
    /// terminal; a `Failed` intent is kept for audit.
    ///
    /// # Errors
    /// `Declined`, `ServiceUnavailable`, or other backend errors.
    pub async fn authorize(
        &self,
        amount: Money,
        order_ref: &str,
        metadata: HashMap<String, String>,
    ) -> PaymentResult<PaymentIntentId> {
        let result = with_backoff(&self.retry, "authorize", || {
            self.backend.authorize(&amount, order_ref, &metadata)
        })
        .await;

        match result {
            Ok(auth) => {
                let intent = PaymentIntent::authorized(order_ref, amount, auth.processor_ref);
                info!(intent = %intent.id, order_ref, amount = %intent.amount, "payment authorized");
                Ok(self.insert_intent(intent))
            },
            Err(PaymentError::Declined(reason)) => {
                let intent = PaymentIntent::failed(order_ref, amount, reason.clone());
                warn!(intent = %intent.id, order_ref, %reason, "authorization declined");
                self.insert_intent(intent);
                Err(PaymentError::Declined(reason))
            },
            Err(other) => Err(other),
        }
    }

    /// Capture authorized funds, atomically once.
    ///
    /// # Errors
    /// `InvalidState` unless the intent is `Authorized` (a concurrent
    /// second capture observes `Captured` and fails here);
    /// `AmountExceedsAuthorized` if the amount is over the authorization.
    pub async fn capture(&self, id: PaymentIntentId, amount: &Money) -> PaymentResult<()> {
        let cell = self.intent_cell(id)?;
        let mut intent = cell.lock().await;

        match &intent.state {
            PaymentState::Authorized => {},
            other => {
                return Err(PaymentError::InvalidState {
                    expected: "authorized",
                    actual: other.name().to_string(),
                });
            },
        }

        if amount.currency() != intent.amount.currency() {
            return Err(DomainError::CurrencyMismatch {
                left: amount.currency().clone(),
                right: intent.amount.currency().clone(),
            }
            .into());
        }

        if amount.amount_minor() > intent.amount.amount_minor() {
            return Err(PaymentError::AmountExceedsAuthorized {
                requested: amount.clone(),
                limit: intent.amount.clone(),
            });
        }

        let processor_ref = intent.processor_ref.clone().ok_or(PaymentError::InvalidState {
            expected: "authorized",
            actual: "missing processor reference".to_string(),
        })?;

        with_backoff(&self.retry, "capture", || self.backend.capture(&processor_ref, amount))
            .await?;

        intent.state = PaymentState::Captured { captured: amount.clone() };
        intent.updated_at = chrono::Utc::now();
        info!(intent = %id, amount = %amount, "payment captured");
        Ok(())
    }

    /// Refund captured funds.
    ///
    /// Refunds may accumulate; the ceiling is the captured amount (not
    /// the original authorization). Transitions to `Refunded` when the
    /// cumulative refund reaches the captured amount, `PartiallyRefunded`
    /// otherwise.
    ///
    /// # Errors
    /// `InvalidState` unless the intent is `Captured` or
    /// `PartiallyRefunded`; `AmountExceedsAuthorized` with the capture
    /// ceiling if the cumulative refund would exceed it.
    pub async fn refund(&self, id: PaymentIntentId, amount: &Money) -> PaymentResult<()> {
        let cell = self.intent_cell(id)?;
        let mut intent = cell.lock().await;

        let (captured, refunded_so_far) = match &intent.state {
            PaymentState::Captured { captured } => {
                (captured.clone(), Money::zero(captured.currency().clone()))
            },
            PaymentState::PartiallyRefunded { captured, refunded } => {
                (captured.clone(), refunded.clone())
            },
            other => {
                return Err(PaymentError::InvalidState {
                    expected: "captured",
                    actual: other.name().to_string(),
                });
            },
        };

        let cumulative = refunded_so_far.add(amount)?;
        if cumulative.amount_minor() > captured.amount_minor() {
            return Err(PaymentError::AmountExceedsAuthorized {
                requested: amount.clone(),
                limit: captured,
            });
        }

        let processor_ref = intent.processor_ref.clone().ok_or(PaymentError::InvalidState {
            expected: "captured",
            actual: "missing processor reference".to_string(),
        })?;

        with_backoff(&self.retry, "refund", || self.backend.refund(&processor_ref, amount))
            .await?;

        intent.state = if cumulative == captured {
            PaymentState::Refunded { captured }
        } else {
            PaymentState::PartiallyRefunded { captured, refunded: cumulative }
        };
        intent.updated_at = chrono::Utc::now();
        info!(intent = %id, amount = %amount, state = intent.state.name(), "payment refunded");
        Ok(())
    }

    /// Snapshot an intent.
    ///
    /// # Errors
    /// `IntentNotFound` for an unknown ID.
    pub async fn intent(&self, id: PaymentIntentId) -> PaymentResult<PaymentIntent> {
        let cell = self.intent_cell(id)?;
        let intent = cell.lock().await;
        Ok(intent.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubGateway;
    use caixa_domain::Currency;

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::new("USD").unwrap()).unwrap()
    }

    fn orchestrator(gateway: Arc<StubGateway>) -> PaymentOrchestrator<StubGateway> {
        let retry = RetryPolicy {
            base_delay: std::time::Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        PaymentOrchestrator::new(gateway, retry)
    }

    #[tokio::test]
    async fn test_authorize_then_capture() {
        let gateway = Arc::new(StubGateway::new());
        let payments = orchestrator(Arc::clone(&gateway));

        let id = payments.authorize(usd(1350), "ORD-1", HashMap::new()).await.unwrap();
        payments.capture(id, &usd(1350)).await.unwrap();

        let intent = payments.intent(id).await.unwrap();
        assert_eq!(intent.state, PaymentState::Captured { captured: usd(1350) });
        assert_eq!(gateway.calls().capture, 1);
    }

    #[tokio::test]
    async fn test_capture_over_authorization_rejected() {
        let payments = orchestrator(Arc::new(StubGateway::new()));

        let id = payments.authorize(usd(1000), "ORD-1", HashMap::new()).await.unwrap();
        let result = payments.capture(id, &usd(1001)).await;

        assert_eq!(
            result,
            Err(PaymentError::AmountExceedsAuthorized { requested: usd(1001), limit: usd(1000) })
        );

        // Still capturable for a legal amount.
        payments.capture(id, &usd(1000)).await.unwrap();
    }

    #[tokio::test]
    async fn test_second_capture_rejected() {
        let gateway = Arc::new(StubGateway::new());
        let payments = orchestrator(Arc::clone(&gateway));

        let id = payments.authorize(usd(1000), "ORD-1", HashMap::new()).await.unwrap();
        payments.capture(id, &usd(1000)).await.unwrap();

        let result = payments.capture(id, &usd(1000)).await;
        assert_eq!(
            result,
            Err(PaymentError::InvalidState { expected: "authorized", actual: "captured".to_string() })
        );
        assert_eq!(gateway.calls().capture, 1);
    }

    #[tokio::test]
    async fn test_refund_bounded_by_capture_not_authorization() {
        let payments = orchestrator(Arc::new(StubGateway::new()));

        // Authorized 2000, captured only 1350: the capture is the ceiling.
        let id = payments.authorize(usd(2000), "ORD-1", HashMap::new()).await.unwrap();
        payments.capture(id, &usd(1350)).await.unwrap();

        let result = payments.refund(id, &usd(2000)).await;
        assert_eq!(
            result,
            Err(PaymentError::AmountExceedsAuthorized { requested: usd(2000), limit: usd(1350) })
        );
    }

    #[tokio::test]
    async fn test_full_refund_is_terminal() {
        let payments = orchestrator(Arc::new(StubGateway::new()));

        let id = payments.authorize(usd(1350), "ORD-1", HashMap::new()).await.unwrap();
        payments.capture(id, &usd(1350)).await.unwrap();
        payments.refund(id, &usd(1350)).await.unwrap();

        let intent = payments.intent(id).await.unwrap();
        assert_eq!(intent.state, PaymentState::Refunded { captured: usd(1350) });

        // Nothing left to refund.
        let result = payments.refund(id, &usd(1)).await;
        assert_eq!(
            result,
            Err(PaymentError::InvalidState { expected: "captured", actual: "refunded".to_string() })
        );
    }

    #[tokio::test]
    async fn test_partial_refunds_accumulate() {
        let payments = orchestrator(Arc::new(StubGateway::new()));

        let id = payments.authorize(usd(1000), "ORD-1", HashMap::new()).await.unwrap();
        payments.capture(id, &usd(1000)).await.unwrap();

        payments.refund(id, &usd(400)).await.unwrap();
        let intent = payments.intent(id).await.unwrap();
        assert_eq!(
            intent.state,
            PaymentState::PartiallyRefunded { captured: usd(1000), refunded: usd(400) }
        );

        // 400 + 700 would exceed the 1000 captured.
        let result = payments.refund(id, &usd(700)).await;
        assert_eq!(
            result,
            Err(PaymentError::AmountExceedsAuthorized { requested: usd(700), limit: usd(1000) })
        );

        // 400 + 600 lands exactly on the ceiling and terminates the intent.
        payments.refund(id, &usd(600)).await.unwrap();
        let intent = payments.intent(id).await.unwrap();
        assert_eq!(intent.state, PaymentState::Refunded { captured: usd(1000) });
    }

    #[tokio::test]
    async fn test_refund_before_capture_rejected() {
        let payments = orchestrator(Arc::new(StubGateway::new()));

        let id = payments.authorize(usd(1000), "ORD-1", HashMap::new()).await.unwrap();
        let result = payments.refund(id, &usd(100)).await;

        assert_eq!(
            result,
            Err(PaymentError::InvalidState { expected: "captured", actual: "authorized".to_string() })
        );
    }

    #[tokio::test]
    async fn test_decline_records_failed_intent() {
        let gateway = Arc::new(StubGateway::new());
        gateway.decline_next("insufficient funds");
        let payments = orchestrator(Arc::clone(&gateway));

        let result = payments.authorize(usd(1000), "ORD-1", HashMap::new()).await;
        assert_eq!(result, Err(PaymentError::Declined("insufficient funds".to_string())));

        // One attempt only: declines are terminal.
        assert_eq!(gateway.calls().authorize, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retried() {
        let gateway = Arc::new(StubGateway::new());
        gateway.fail_transient(2);
        let payments = orchestrator(Arc::clone(&gateway));

        let id = payments.authorize(usd(1000), "ORD-1", HashMap::new()).await.unwrap();
        assert_eq!(gateway.calls().authorize, 3);

        let intent = payments.intent(id).await.unwrap();
        assert_eq!(intent.state, PaymentState::Authorized);
    }

    #[tokio::test]
    async fn test_transient_failures_exhausted() {
        let gateway = Arc::new(StubGateway::new());
        gateway.fail_transient(100);
        let payments = orchestrator(Arc::clone(&gateway));

        let result = payments.authorize(usd(1000), "ORD-1", HashMap::new()).await;
        assert_eq!(result, Err(PaymentError::ServiceUnavailable { attempts: 4 }));
        assert_eq!(gateway.calls().authorize, 4);
    }

    #[tokio::test]
    async fn test_unknown_intent() {
        let payments = orchestrator(Arc::new(StubGateway::new()));
        let id = uuid::Uuid::now_v7();

        assert_eq!(
            payments.capture(id, &usd(1)).await,
            Err(PaymentError::IntentNotFound(id))
        );
    }
}
