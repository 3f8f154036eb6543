//! Payment layer error types.

use thiserror::Error;
use uuid::Uuid;

use caixa_domain::Money;

/// Errors that can occur during payment operations.
///
/// `Declined` is a terminal business condition and is never retried;
/// `Transient` is an infrastructure condition the orchestrator retries
/// with bounded exponential backoff before surfacing `ServiceUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Processor rejected the operation; terminal, never retried
    #[error("Declined by processor: {0}")]
    Declined(String),

    /// Infrastructure failure; retryable
    #[error("Transient payment backend failure: {0}")]
    Transient(String),

    /// Retries exhausted against a transient failure
    #[error("Payment backend unavailable after {attempts} attempts")]
    ServiceUnavailable {
        /// How many attempts were made
        attempts: u32,
    },

    /// Operation not permitted in the intent's current state
    #[error("Invalid payment state: expected {expected}, got {actual}")]
    InvalidState {
        /// State the operation requires
        expected: &'static str,
        /// State the intent is actually in
        actual: String,
    },

    /// Amount exceeds the operation's ceiling: the authorized amount for
    /// captures, the captured amount for refunds
    #[error("Amount {requested} exceeds the ceiling of {limit}")]
    AmountExceedsAuthorized {
        /// Amount requested
        requested: Money,
        /// Ceiling that bounds the operation
        limit: Money,
    },

    /// No intent with the given ID
    #[error("Payment intent not found: {0}")]
    IntentNotFound(Uuid),

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] caixa_domain::DomainError),
}

/// Result type for payment operations.
pub type PaymentResult<T> = Result<T, PaymentError>;
