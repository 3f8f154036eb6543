//! Payment layer port definitions.
//!
//! The backend port is the seam to the real payment processor. It is an
//! open capability interface: third-party gateways are pluggable at
//! deploy time, so the orchestrator enforces the state machine and amount
//! invariants regardless of which backend is behind it.
//!
//! Implementations:
//! - `StubGateway` - For testing (configurable declines and outages)
//! - Real processor adapters live in deployment crates

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use caixa_domain::Money;

use crate::error::PaymentError;

/// Port for payment processor operations.
#[async_trait]
pub trait PaymentBackendPort: Send + Sync {
    /// Ask the processor to commit funds for later capture.
    ///
    /// # Errors
    /// `Declined` is terminal; `Transient` is retryable by the caller.
    async fn authorize(
        &self,
        amount: &Money,
        order_ref: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<BackendAuthorization, PaymentError>;

    /// Collect previously authorized funds.
    async fn capture(&self, processor_ref: &str, amount: &Money) -> Result<(), PaymentError>;

    /// Return previously captured funds.
    async fn refund(&self, processor_ref: &str, amount: &Money) -> Result<(), PaymentError>;
}

/// Authorization acknowledged by the processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendAuthorization {
    /// Processor-assigned reference for the authorization
    pub processor_ref: String,
    /// When the processor acknowledged it
    pub authorized_at: DateTime<Utc>,
}
