//! Pricing engine error types.

use thiserror::Error;

/// Errors that can occur while pricing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Totals are undefined for an empty cart
    #[error("Cannot price an empty cart")]
    EmptyCart,

    /// A requested discount code is not in the promotion catalog
    #[error("Unknown discount code: {0:?}")]
    UnknownCode(String),

    /// Domain error (currency mismatch, overflow, validation)
    #[error("Domain error: {0}")]
    Domain(#[from] caixa_domain::DomainError),
}

/// Result type for pricing operations.
pub type PricingResult<T> = Result<T, PricingError>;
