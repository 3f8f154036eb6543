//! Caixa Storage Layer
//!
//! Ports and in-memory implementation for the three keyed resources the
//! checkout kernel mutates: per-SKU inventory, per-key idempotency
//! records, and placed orders. A durable database adapter plugs in behind
//! the same traits; the only primitive it must provide is per-key /
//! per-SKU atomic read-modify-write.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod repository;
pub mod token;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repository::{Claim, IdempotencyStore, InventoryLedger, OrderRepository, Store};
pub use token::{IdempotencyKey, InventoryRecord, ReservationToken};
