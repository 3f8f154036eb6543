//! Storage layer errors.

use thiserror::Error;
use uuid::Uuid;

use caixa_domain::Sku;

use crate::token::IdempotencyKey;

/// Errors that can occur in the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Not enough stock to cover a reservation
    #[error("Out of stock for SKU {sku}: requested {requested}, available {available}")]
    OutOfStock {
        /// SKU that could not be reserved
        sku: Sku,
        /// Quantity requested
        requested: u32,
        /// Quantity actually available
        available: u32,
    },

    /// SKU has no inventory record
    #[error("Unknown SKU: {0}")]
    UnknownSku(Sku),

    /// Reservation token is not known to the ledger
    #[error("Reservation token not found: {0}")]
    TokenNotFound(Uuid),

    /// Token was already committed; committing or releasing again would
    /// double-apply the deduction
    #[error("Reservation already committed: {0}")]
    AlreadyCommitted(Uuid),

    /// Token was already released
    #[error("Reservation already released: {0}")]
    AlreadyReleased(Uuid),

    /// Idempotency keys must be non-empty
    #[error("Idempotency key must be non-empty")]
    EmptyKey,

    /// A result was attached to a key that was never claimed
    #[error("Idempotency key was never claimed: {0}")]
    NotClaimed(IdempotencyKey),

    /// A second result was attached to an already-resolved key
    #[error("Idempotency key already resolved: {0}")]
    AlreadyResolved(IdempotencyKey),

    /// Gave up waiting for the first claimant's terminal result
    #[error("Timed out waiting for the first claimant's result on key {0}")]
    ClaimWaitTimeout(IdempotencyKey),

    /// Internal-consistency violation; the request must abort and the
    /// condition must be escalated, never silently corrected
    #[error("Inventory ledger corrupted for SKU {sku}: {detail}")]
    LedgerCorrupted {
        /// SKU whose record is inconsistent
        sku: Sku,
        /// What was found
        detail: String,
    },

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] caixa_domain::DomainError),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
