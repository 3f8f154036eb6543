//! Storage trait definitions (ports).
//!
//! These traits define the persistence interface the checkout kernel
//! requires: per-SKU atomic reserve/commit/release, per-key atomic
//! idempotency claims, and order persistence. Implementations can be
//! in-memory (this crate) or a durable database adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use caixa_domain::{Order, OrderId, Sku};

use crate::error::StoreResult;
use crate::token::{IdempotencyKey, InventoryRecord, ReservationToken};

// =============================================================================
// Inventory Ledger
// =============================================================================

/// Per-SKU stock ledger with provisional reservations.
///
/// Every operation is atomic with respect to other operations on the same
/// SKU; `reserve` in particular must be linearizable per SKU so that
/// concurrent reservations never oversell under any interleaving.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Reserve `quantity` units of a SKU.
    ///
    /// Atomically moves the units from available to reserved and returns
    /// a single-use token referencing the delta.
    ///
    /// # Errors
    /// `OutOfStock` when available < quantity; `UnknownSku` for a SKU with
    /// no inventory record.
    async fn reserve(&self, sku: &Sku, quantity: u32) -> StoreResult<ReservationToken>;

    /// Convert a reservation into a permanent deduction.
    ///
    /// Decrements reserved; available is unaffected (it was already
    /// decremented at reserve time).
    ///
    /// # Errors
    /// `AlreadyCommitted` on a second commit rather than double-deducting;
    /// `AlreadyReleased` for a token that was released.
    async fn commit(&self, token: &ReservationToken) -> StoreResult<()>;

    /// Reverse a reservation that was never committed.
    ///
    /// Moves the units back from reserved to available. Used on checkout
    /// failure after a successful reserve.
    ///
    /// # Errors
    /// `AlreadyReleased` or `AlreadyCommitted` for a token no longer in
    /// the reserved state.
    async fn release(&self, token: &ReservationToken) -> StoreResult<()>;

    /// Snapshot a SKU's (available, reserved) counts.
    async fn record(&self, sku: &Sku) -> StoreResult<Option<InventoryRecord>>;

    /// Tokens still reserved that were taken before `cutoff`.
    ///
    /// The background reaper that periodically calls this and releases
    /// what it finds is a required external collaborator; it is not part
    /// of this kernel.
    async fn stale_reservations(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<ReservationToken>>;
}

// =============================================================================
// Idempotency Store
// =============================================================================

/// Outcome of an idempotency claim.
#[derive(Debug, Clone)]
pub enum Claim {
    /// The key was free; the caller owns the operation.
    Granted,
    /// The key was already claimed; carries the first caller's terminal
    /// result.
    Duplicate(serde_json::Value),
}

/// Append-only record of operation keys, one effect per key.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Claim a key.
    ///
    /// Atomic: of two concurrent claimants exactly one observes
    /// `Granted`. A duplicate claim against a key whose first caller has
    /// not attached a result yet blocks up to `wait` for that result
    /// (blocking-with-timeout policy, so callers always get a definite
    /// answer).
    ///
    /// # Errors
    /// `ClaimWaitTimeout` if the first caller's result does not arrive
    /// within `wait`.
    async fn claim(&self, key: &IdempotencyKey, wait: Duration) -> StoreResult<Claim>;

    /// Attach the terminal result for a claimed key, exactly once.
    ///
    /// # Errors
    /// `NotClaimed` if the key was never claimed; `AlreadyResolved` on a
    /// second attach. Records are never updated in place beyond this
    /// single attach.
    async fn attach_result(
        &self,
        key: &IdempotencyKey,
        result: serde_json::Value,
    ) -> StoreResult<()>;
}

// =============================================================================
// Order Repository
// =============================================================================

/// Repository for placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Save an order.
    async fn save(&self, order: &Order) -> StoreResult<()>;

    /// Find an order by ID.
    async fn find_by_id(&self, id: &OrderId) -> StoreResult<Option<Order>>;
}

// =============================================================================
// Combined Store
// =============================================================================

/// Combined store interface handed to the checkout service.
pub trait Store: Send + Sync {
    /// Get the inventory ledger.
    fn inventory(&self) -> &dyn InventoryLedger;

    /// Get the idempotency store.
    fn idempotency(&self) -> &dyn IdempotencyStore;

    /// Get the order repository.
    fn orders(&self) -> &dyn OrderRepository;
}
