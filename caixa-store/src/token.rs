//! Storage-layer value types: reservation tokens, inventory records, and
//! idempotency keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use caixa_domain::Sku;

use crate::error::StoreError;

// =============================================================================
// ReservationToken
// =============================================================================

/// Handle for a provisional, uncommitted inventory deduction.
///
/// Single-use: a token moves reserved → committed or reserved → released
/// exactly once. The creation timestamp supports staleness detection; a
/// reservation held past the configured timeout becomes eligible for
/// release by the background reaper (an external collaborator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationToken {
    /// Token identifier
    pub id: Uuid,
    /// SKU the reservation is against
    pub sku: Sku,
    /// Reserved quantity
    pub quantity: u32,
    /// When the reservation was taken
    pub reserved_at: DateTime<Utc>,
}

impl ReservationToken {
    /// Mint a fresh token. Only ledger implementations should call this.
    pub fn new(sku: Sku, quantity: u32) -> Self {
        Self {
            id: Uuid::now_v7(),
            sku,
            quantity,
            reserved_at: Utc::now(),
        }
    }
}

// =============================================================================
// InventoryRecord
// =============================================================================

/// Snapshot of a SKU's stock position.
///
/// # Invariants
/// - `available + reserved` equals the SKU's uncommitted stock at all times
/// - Neither count ever goes negative (unsigned by construction; guarded
///   arithmetic turns an underflow into a fatal `LedgerCorrupted`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Units free to reserve
    pub available: u32,
    /// Units held by uncommitted reservations
    pub reserved: u32,
}

// =============================================================================
// IdempotencyKey
// =============================================================================

/// Client-supplied opaque key guaranteeing at-most-one effect.
///
/// # Invariants
/// - Must be non-empty
/// - Once claimed, never claimable again; the store is append-only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Create a new IdempotencyKey with validation.
    ///
    /// # Errors
    /// Returns `StoreError::EmptyKey` if the key is empty.
    pub fn new(key: &str) -> Result<Self, StoreError> {
        if key.trim().is_empty() {
            return Err(StoreError::EmptyKey);
        }
        Ok(Self(key.to_string()))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let sku = Sku::new("A").unwrap();
        let t1 = ReservationToken::new(sku.clone(), 1);
        let t2 = ReservationToken::new(sku, 1);

        assert_ne!(t1.id, t2.id);
    }

    #[test]
    fn test_idempotency_key_validation() {
        assert!(IdempotencyKey::new("req-1").is_ok());
        assert_eq!(IdempotencyKey::new(""), Err(StoreError::EmptyKey));
        assert_eq!(IdempotencyKey::new("  "), Err(StoreError::EmptyKey));
    }
}
