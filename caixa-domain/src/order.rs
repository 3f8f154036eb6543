//! Order entity.
//!
//! An order is created only after payment authorization and inventory
//! reservation have both succeeded, and is immutable thereafter except for
//! the status field, which settlement and shipping events advance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::cart::CartLine;
use crate::money::Money;

// =============================================================================
// OrderId
// =============================================================================

/// Globally unique, human-readable order identifier (`ORD-<uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(format!("ORD-{}", Uuid::now_v7()))
    }

    /// Get the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Final totals attached to an order.
///
/// `total` is the gross charged amount; `vat` is derived by subtraction so
/// `total_excl_vat + vat == total` holds exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of line totals before any discount
    pub subtotal: Money,
    /// Total discount granted across both tiers
    pub discount_amount: Money,
    /// Discounted total before VAT
    pub total_excl_vat: Money,
    /// VAT share of the charged amount
    pub vat: Money,
    /// Gross amount charged
    pub total: Money,
}

// =============================================================================
// Order
// =============================================================================

/// Order lifecycle status.
///
/// Advanced by shipping/settlement events outside this kernel; only
/// `Placed` is ever set here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Payment captured, stock committed
    Placed,
    /// Handed to fulfilment
    Shipped,
    /// Processor settlement confirmed
    Settled,
}

/// A placed order: cart snapshot, final totals, and the references tying
/// it to its payment intent and inventory reservations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Snapshot of the cart lines as purchased
    pub lines: Vec<CartLine>,
    /// Final totals
    pub totals: OrderTotals,
    /// Payment intent reference
    pub payment_ref: Uuid,
    /// Inventory reservation token references
    pub reservation_refs: Vec<Uuid>,
    /// Lifecycle status
    pub status: OrderStatus,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a newly placed order.
    pub fn place(
        id: OrderId,
        lines: Vec<CartLine>,
        totals: OrderTotals,
        payment_ref: Uuid,
        reservation_refs: Vec<Uuid>,
    ) -> Self {
        Self {
            id,
            lines,
            totals,
            payment_ref,
            reservation_refs,
            status: OrderStatus::Placed,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
