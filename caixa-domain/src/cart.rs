//! Cart line items and the promotion evaluation context.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::DomainError;
use crate::money::Money;

// =============================================================================
// Sku
// =============================================================================

/// Stock-keeping unit identifier.
///
/// # Invariants
/// - Must be non-empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    /// Create a new Sku with validation.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSku` if the identifier is empty.
    pub fn new(id: &str) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidSku(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    /// Get the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CartLine
// =============================================================================

/// One cart line: a SKU at a unit price, a positive number of times.
///
/// Owned by the cart for the duration of one checkout request and never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    sku: Sku,
    unit_price: Money,
    quantity: u32,
}

impl CartLine {
    /// Create a new CartLine with validation.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if quantity is zero.
    pub fn new(sku: Sku, unit_price: Money, quantity: u32) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self { sku, unit_price, quantity })
    }

    /// The SKU being purchased.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Unit price.
    pub fn unit_price(&self) -> &Money {
        &self.unit_price
    }

    /// Quantity (always positive).
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Line total: unit price × quantity, exact.
    ///
    /// # Errors
    /// `AmountOverflow` on overflow.
    pub fn line_total(&self) -> Result<Money, DomainError> {
        self.unit_price.mul_qty(self.quantity)
    }
}

// =============================================================================
// CartContext
// =============================================================================

/// Structured evaluation context for promotion rules.
///
/// Explicit, typed fields rather than an open-ended dictionary: rules see
/// the running subtotal, the set of category identifiers present in the
/// cart, and any promotion-specific data under named custom keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartContext {
    /// Running subtotal of the cart
    pub subtotal: Money,
    /// Category identifiers present in the cart
    pub categories: HashSet<String>,
    /// Promotion-specific data, keyed by name
    pub custom: HashMap<String, serde_json::Value>,
}

impl CartContext {
    /// Create a context with a subtotal and no categories or custom data.
    pub fn new(subtotal: Money) -> Self {
        Self {
            subtotal,
            categories: HashSet::new(),
            custom: HashMap::new(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
