//! Caixa Checkout Service
//!
//! Composes the pricing engine, inventory ledger, idempotency store, and
//! payment orchestrator into one transactional checkout operation with
//! compensating actions on every failure path.
//!
//! Two collaborators live outside this kernel: the background reaper that
//! releases reservations older than the configured timeout (it drives
//! [`InventoryLedger::stale_reservations`]), and the processor webhook
//! receiver for asynchronous settlement events, which must reuse the same
//! [`IdempotencyStore`] keyed by the processor's event ID to avoid
//! double-processing.
//!
//! [`InventoryLedger::stale_reservations`]: caixa_store::InventoryLedger::stale_reservations
//! [`IdempotencyStore`]: caixa_store::IdempotencyStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod service;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, CheckoutResult};
pub use service::{CheckoutReceipt, CheckoutRequest, CheckoutService};
