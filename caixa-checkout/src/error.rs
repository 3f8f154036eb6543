//! Checkout error types.
//!
//! Taxonomy: `OutOfStock` and `PaymentDeclined` are expected business
//! conditions, surfaced and never retried. `ServiceUnavailable` is what a
//! transient infrastructure condition becomes once the bounded retries
//! are exhausted. A replayed idempotent request is not an error at all.
//! `Internal` marks invariant violations that abort the request and are
//! escalated rather than silently corrected.

use thiserror::Error;

use caixa_domain::{Currency, DomainError, Sku};
use caixa_payments::PaymentError;
use caixa_pricing::PricingError;
use caixa_store::StoreError;

/// Checkout-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Not enough stock for a cart line; names the first failing SKU
    #[error("Out of stock: {sku}")]
    OutOfStock {
        /// First SKU that could not be reserved
        sku: Sku,
    },

    /// Processor declined the payment
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    /// Payment backend stayed unavailable through the bounded retries
    #[error("Payment service unavailable")]
    ServiceUnavailable,

    /// The cart currency has no configured VAT rate
    #[error("No VAT rate configured for currency {0}")]
    NoVatRate(Currency),

    /// A replayed rejection whose original error shape is not preserved
    #[error("Checkout rejected: {0}")]
    Rejected(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal-consistency violation; aborts the request, escalated for
    /// manual reconciliation
    #[error("Internal consistency error: {0}")]
    Internal(String),

    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Pricing error
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Payment error
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
