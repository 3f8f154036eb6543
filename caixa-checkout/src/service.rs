//! Checkout orchestration.
//!
//! One transactional checkout: claim the idempotency key, price the
//! cart, reserve stock, authorize and capture payment, commit, and attach
//! the outcome to the key. Every failure after the claim runs its
//! compensating actions (release, and refund once captured) before
//! surfacing, so no exit path leaves a partial reservation or partial
//! payment behind. Compensation failures are logged for manual
//! reconciliation and never replace the primary result.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};

use caixa_domain::{net_to_gross, CartLine, Order, OrderId, OrderTotals, Promotion, Sku};
use caixa_payments::{PaymentBackendPort, PaymentError, PaymentIntentId, PaymentOrchestrator};
use caixa_pricing::{authorize_discounts, compute_totals, context_for};
use caixa_store::{Claim, IdempotencyKey, ReservationToken, Store, StoreError};

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Request / Receipt
// =============================================================================

/// One checkout request: a cart, its category tags, the discount codes
/// the client wants applied, and the client-supplied idempotency key.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Client-supplied key guaranteeing at-most-one effect
    pub idempotency_key: IdempotencyKey,
    /// Cart lines
    pub lines: Vec<CartLine>,
    /// Category identifiers present in the cart
    pub categories: HashSet<String>,
    /// Discount codes to apply
    pub discount_codes: Vec<String>,
}

/// Successful checkout result. Replays of the same idempotency key
/// return the identical receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    /// The placed order
    pub order: Order,
}

// =============================================================================
// Stored outcome
// =============================================================================

/// What gets attached to the idempotency key: the receipt on success, a
/// typed rejection otherwise. Retries with the same key observe the
/// first request's outcome either way and never execute a second time.
#[derive(Debug, Serialize, Deserialize)]
enum StoredOutcome {
    Completed(CheckoutReceipt),
    Rejected { kind: RejectionKind, message: String },
}

#[derive(Debug, Serialize, Deserialize)]
enum RejectionKind {
    OutOfStock { sku: Sku },
    PaymentDeclined,
    ServiceUnavailable,
    Invalid,
}

impl StoredOutcome {
    fn from_result(outcome: &CheckoutResult<CheckoutReceipt>) -> Self {
        match outcome {
            Ok(receipt) => StoredOutcome::Completed(receipt.clone()),
            Err(CheckoutError::OutOfStock { sku }) => StoredOutcome::Rejected {
                kind: RejectionKind::OutOfStock { sku: sku.clone() },
                message: String::new(),
            },
            Err(CheckoutError::PaymentDeclined(reason)) => StoredOutcome::Rejected {
                kind: RejectionKind::PaymentDeclined,
                message: reason.clone(),
            },
            Err(CheckoutError::ServiceUnavailable) => StoredOutcome::Rejected {
                kind: RejectionKind::ServiceUnavailable,
                message: String::new(),
            },
            Err(other) => StoredOutcome::Rejected {
                kind: RejectionKind::Invalid,
                message: other.to_string(),
            },
        }
    }

    fn restore(value: serde_json::Value) -> CheckoutResult<CheckoutReceipt> {
        let stored: StoredOutcome = serde_json::from_value(value)
            .map_err(|e| CheckoutError::Internal(format!("corrupt stored outcome: {e}")))?;

        match stored {
            StoredOutcome::Completed(receipt) => Ok(receipt),
            StoredOutcome::Rejected { kind, message } => Err(match kind {
                RejectionKind::OutOfStock { sku } => CheckoutError::OutOfStock { sku },
                RejectionKind::PaymentDeclined => CheckoutError::PaymentDeclined(message),
                RejectionKind::ServiceUnavailable => CheckoutError::ServiceUnavailable,
                RejectionKind::Invalid => CheckoutError::Rejected(message),
            }),
        }
    }
}

// =============================================================================
// CheckoutService
// =============================================================================

/// Composes the pricing engine, inventory ledger, idempotency store, and
/// payment orchestrator into one transactional checkout operation.
pub struct CheckoutService<B: PaymentBackendPort, S: Store> {
    store: Arc<S>,
    payments: PaymentOrchestrator<B>,
    promotions: Vec<Promotion>,
    config: CheckoutConfig,
}

impl<B: PaymentBackendPort, S: Store> CheckoutService<B, S> {
    /// Create a new checkout service.
    pub fn new(
        store: Arc<S>,
        backend: Arc<B>,
        promotions: Vec<Promotion>,
        config: CheckoutConfig,
    ) -> Self {
        let payments = PaymentOrchestrator::new(backend, config.retry);
        Self { store, payments, promotions, config }
    }

    /// Access the payment orchestrator (for settlement/refund flows).
    pub fn payments(&self) -> &PaymentOrchestrator<B> {
        &self.payments
    }

    /// Reservations held past the configured timeout.
    ///
    /// The background reaper (an external collaborator) polls this and
    /// releases what it finds; abandoned reservations must not hold stock
    /// forever.
    ///
    /// # Errors
    /// Store errors from the ledger scan.
    pub async fn stale_reservations(&self) -> CheckoutResult<Vec<ReservationToken>> {
        let timeout = chrono::Duration::from_std(self.config.reservation_timeout)
            .map_err(|e| CheckoutError::Config(format!("reservation timeout out of range: {e}")))?;
        let cutoff = chrono::Utc::now() - timeout;
        Ok(self.store.inventory().stale_reservations(cutoff).await?)
    }

    /// Run one checkout.
    ///
    /// A request whose idempotency key was already used returns the first
    /// request's outcome immediately, with no further side effects.
    ///
    /// # Errors
    /// See [`CheckoutError`] for the taxonomy; business rejections
    /// (`OutOfStock`, `PaymentDeclined`) arrive with all compensations
    /// already run.
    pub async fn checkout(&self, request: CheckoutRequest) -> CheckoutResult<CheckoutReceipt> {
        // 1. Claim the idempotency key; duplicates replay the first outcome.
        match self
            .store
            .idempotency()
            .claim(&request.idempotency_key, self.config.claim_wait)
            .await?
        {
            Claim::Granted => {},
            Claim::Duplicate(stored) => {
                info!(key = %request.idempotency_key, "duplicate checkout, replaying first outcome");
                return StoredOutcome::restore(stored);
            },
        }

        let outcome = self.run(&request).await;

        // 6. Attach the terminal outcome, success or rejection, so same-key
        //    retries observe it instead of executing again.
        self.record_outcome(&request.idempotency_key, &outcome).await;
        outcome
    }

    async fn run(&self, request: &CheckoutRequest) -> CheckoutResult<CheckoutReceipt> {
        // 2. Price the cart: authorize discount codes, compute totals, add VAT.
        let ctx = context_for(&request.lines, request.categories.clone(), HashMap::new())?;
        let discounts = authorize_discounts(&self.promotions, &request.discount_codes, &ctx)?;
        let totals = compute_totals(&request.lines, &discounts)?;

        let currency = totals.total_excl_vat.currency().clone();
        let rate = *self
            .config
            .vat_rates
            .get(&currency)
            .ok_or(CheckoutError::NoVatRate(currency))?;
        let gross = net_to_gross(&totals.total_excl_vat, rate)?;
        let vat = gross.sub(&totals.total_excl_vat)?;

        // 3. Reserve stock for every line, all-or-nothing.
        let tokens = self.reserve_all(&request.lines).await?;

        // 4. Authorize payment for the gross total. Reservation is complete
        //    by now, so no inventory lock is held across this network call.
        let order_id = OrderId::generate();
        let mut metadata = HashMap::new();
        metadata.insert(
            "idempotency_key".to_string(),
            request.idempotency_key.as_str().to_string(),
        );

        let intent_id = match self.payments.authorize(gross.clone(), order_id.as_str(), metadata).await {
            Ok(id) => id,
            Err(e) => {
                self.release_all(&tokens).await;
                return Err(Self::surface_payment_error(e));
            },
        };

        // 5. Capture, persist the order, make the deduction permanent.
        if let Err(e) = self.payments.capture(intent_id, &gross).await {
            self.release_all(&tokens).await;
            return Err(Self::surface_payment_error(e));
        }

        let order = Order::place(
            order_id,
            request.lines.clone(),
            OrderTotals {
                subtotal: totals.subtotal,
                discount_amount: totals.discount_amount,
                total_excl_vat: totals.total_excl_vat,
                vat,
                total: gross.clone(),
            },
            intent_id,
            tokens.iter().map(|t| t.id).collect(),
        );

        if let Err(e) = self.store.orders().save(&order).await {
            // Funds were captured for an order we failed to record.
            self.refund_captured(intent_id, &order.totals.total).await;
            self.release_all(&tokens).await;
            return Err(e.into());
        }

        if let Err(e) = self.commit_all(&tokens).await {
            // Commit failing on a reserved token means the ledger is
            // inconsistent: abort, compensate the payment, escalate.
            error!(order = %order.id, error = %e, "reservation commit failed; manual reconciliation required");
            self.refund_captured(intent_id, &order.totals.total).await;
            self.release_all(&tokens).await;
            return Err(CheckoutError::Internal(format!("reservation commit failed: {e}")));
        }

        info!(order = %order.id, total = %order.totals.total, "checkout completed");
        Ok(CheckoutReceipt { order })
    }

    /// Reserve every line; on the first failure release what was already
    /// acquired for this request and report the failing SKU.
    async fn reserve_all(&self, lines: &[CartLine]) -> CheckoutResult<Vec<ReservationToken>> {
        let mut tokens = Vec::with_capacity(lines.len());

        for line in lines {
            match self.store.inventory().reserve(line.sku(), line.quantity()).await {
                Ok(token) => tokens.push(token),
                Err(StoreError::OutOfStock { sku, requested, available }) => {
                    warn!(%sku, requested, available, "insufficient stock, releasing partial reservations");
                    self.release_all(&tokens).await;
                    return Err(CheckoutError::OutOfStock { sku });
                },
                Err(other) => {
                    self.release_all(&tokens).await;
                    return Err(other.into());
                },
            }
        }

        Ok(tokens)
    }

    /// Compensating release. Failures here are escalated for manual
    /// reconciliation, never surfaced as the request's result.
    async fn release_all(&self, tokens: &[ReservationToken]) {
        for token in tokens {
            if let Err(e) = self.store.inventory().release(token).await {
                error!(token = %token.id, sku = %token.sku, error = %e, "failed to release reservation; manual reconciliation required");
            }
        }
    }

    async fn commit_all(&self, tokens: &[ReservationToken]) -> Result<(), StoreError> {
        for token in tokens {
            self.store.inventory().commit(token).await?;
        }
        Ok(())
    }

    /// Compensating refund after a post-capture failure. Failures here
    /// are escalated, never surfaced.
    async fn refund_captured(&self, intent_id: PaymentIntentId, amount: &caixa_domain::Money) {
        if let Err(e) = self.payments.refund(intent_id, amount).await {
            error!(intent = %intent_id, error = %e, "compensating refund failed; manual reconciliation required");
        }
    }

    /// Attach the terminal outcome to the idempotency key so same-key
    /// retries observe it. A failure here is logged for manual
    /// reconciliation, never surfaced as the request's result.
    async fn record_outcome(
        &self,
        key: &IdempotencyKey,
        outcome: &CheckoutResult<CheckoutReceipt>,
    ) {
        let stored = StoredOutcome::from_result(outcome);
        let value = match serde_json::to_value(&stored) {
            Ok(value) => value,
            Err(e) => {
                error!(%key, error = %e, "failed to serialize checkout outcome; manual reconciliation required");
                return;
            },
        };
        if let Err(e) = self.store.idempotency().attach_result(key, value).await {
            error!(%key, error = %e, "failed to attach checkout outcome; manual reconciliation required");
        }
    }

    fn surface_payment_error(e: PaymentError) -> CheckoutError {
        match e {
            PaymentError::Declined(reason) => CheckoutError::PaymentDeclined(reason),
            PaymentError::ServiceUnavailable { .. } => CheckoutError::ServiceUnavailable,
            other => other.into(),
        }
    }
}
