//! Payment intent and its state machine.
//!
//! Legal transitions: `Authorized -> Captured -> {Refunded |
//! PartiallyRefunded}` and `Authorized -> Failed`. Capture happens
//! atomically once for an amount up to the authorization; refunds may
//! accumulate up to the captured amount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use caixa_domain::Money;

/// Unique identifier for a PaymentIntent.
pub type PaymentIntentId = Uuid;

/// State of a payment intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaymentState {
    /// Funds committed by the processor, not yet collected
    Authorized,

    /// Funds collected
    Captured {
        /// Amount actually captured (≤ the authorized amount)
        captured: Money,
    },

    /// Part of the captured amount returned
    PartiallyRefunded {
        /// Amount originally captured
        captured: Money,
        /// Cumulative amount refunded so far
        refunded: Money,
    },

    /// The full captured amount returned; terminal
    Refunded {
        /// Amount that was captured and fully refunded
        captured: Money,
    },

    /// Authorization rejected by the processor; terminal
    Failed {
        /// Processor's rejection reason
        reason: String,
    },
}

impl PaymentState {
    /// Get the name of the state for display.
    pub fn name(&self) -> &'static str {
        match self {
            PaymentState::Authorized => "authorized",
            PaymentState::Captured { .. } => "captured",
            PaymentState::PartiallyRefunded { .. } => "partially_refunded",
            PaymentState::Refunded { .. } => "refunded",
            PaymentState::Failed { .. } => "failed",
        }
    }
}

/// A payment intent: one authorization and its lifecycle.
///
/// Owned by the orchestrator; created on authorize, terminal on full
/// refund or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Intent identifier
    pub id: PaymentIntentId,
    /// Order reference the payment belongs to
    pub order_ref: String,
    /// Authorized amount
    pub amount: Money,
    /// Processor-assigned reference (absent for failed authorizations)
    pub processor_ref: Option<String>,
    /// Current state
    pub state: PaymentState,
    /// When the intent was created
    pub created_at: DateTime<Utc>,
    /// Last state change
    pub updated_at: DateTime<Utc>,
}

impl PaymentIntent {
    /// Create an intent for a successful authorization.
    pub fn authorized(order_ref: &str, amount: Money, processor_ref: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            order_ref: order_ref.to_string(),
            amount,
            processor_ref: Some(processor_ref),
            state: PaymentState::Authorized,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an intent recording a rejected authorization, for audit.
    pub fn failed(order_ref: &str, amount: Money, reason: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            order_ref: order_ref.to_string(),
            amount,
            processor_ref: None,
            state: PaymentState::Failed { reason },
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
