//! In-memory store implementation.
//!
//! Used for testing and development without a database. Inventory is
//! serialized at SKU granularity: the outer map is only locked to look up
//! or insert a SKU cell, and all stock mutation happens under that SKU's
//! own mutex. There is no global lock across SKUs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use caixa_domain::{Order, OrderId, Sku};

use crate::error::{StoreError, StoreResult};
use crate::repository::{Claim, IdempotencyStore, InventoryLedger, OrderRepository, Store};
use crate::token::{IdempotencyKey, InventoryRecord, ReservationToken};

// =============================================================================
// Internal state
// =============================================================================

/// Lifecycle of a reservation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenStatus {
    Reserved,
    Committed,
    Released,
}

/// Per-SKU stock cell. All mutation happens under this cell's mutex.
struct SkuState {
    available: u32,
    reserved: u32,
    tokens: HashMap<Uuid, (ReservationToken, TokenStatus)>,
}

/// Per-key idempotency entry. The watch channel wakes duplicate claimants
/// when the first caller attaches its terminal result.
struct IdemEntry {
    created_at: DateTime<Utc>,
    result: Option<serde_json::Value>,
    resolved_tx: watch::Sender<bool>,
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store for testing and development.
pub struct MemoryStore {
    skus: RwLock<HashMap<Sku, Arc<Mutex<SkuState>>>>,
    keys: RwLock<HashMap<IdempotencyKey, IdemEntry>>,
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            skus: RwLock::new(HashMap::new()),
            keys: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Seed (or replace) the inventory record for a SKU.
    pub fn set_stock(&self, sku: Sku, available: u32) {
        let mut skus = self.skus.write().unwrap();
        skus.insert(
            sku,
            Arc::new(Mutex::new(SkuState {
                available,
                reserved: 0,
                tokens: HashMap::new(),
            })),
        );
    }

    /// Number of stored orders.
    pub fn order_count(&self) -> usize {
        self.orders.read().unwrap().len()
    }

    /// Number of claimed idempotency keys.
    pub fn key_count(&self) -> usize {
        self.keys.read().unwrap().len()
    }

    /// Clear all data (useful for test setup).
    pub fn clear(&self) {
        self.skus.write().unwrap().clear();
        self.keys.write().unwrap().clear();
        self.orders.write().unwrap().clear();
    }

    fn sku_cell(&self, sku: &Sku) -> StoreResult<Arc<Mutex<SkuState>>> {
        let skus = self.skus.read().unwrap();
        skus.get(sku).cloned().ok_or_else(|| StoreError::UnknownSku(sku.clone()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Inventory Ledger Implementation
// =============================================================================

#[async_trait]
impl InventoryLedger for MemoryStore {
    async fn reserve(&self, sku: &Sku, quantity: u32) -> StoreResult<ReservationToken> {
        let cell = self.sku_cell(sku)?;
        let mut state = cell.lock().unwrap();

        if state.available < quantity {
            return Err(StoreError::OutOfStock {
                sku: sku.clone(),
                requested: quantity,
                available: state.available,
            });
        }

        state.available -= quantity;
        state.reserved += quantity;

        let token = ReservationToken::new(sku.clone(), quantity);
        state.tokens.insert(token.id, (token.clone(), TokenStatus::Reserved));

        debug!(%sku, quantity, token = %token.id, "stock reserved");
        Ok(token)
    }

    async fn commit(&self, token: &ReservationToken) -> StoreResult<()> {
        let cell = self.sku_cell(&token.sku)?;
        let mut state = cell.lock().unwrap();

        let status = state
            .tokens
            .get(&token.id)
            .map(|(_, status)| *status)
            .ok_or(StoreError::TokenNotFound(token.id))?;

        match status {
            TokenStatus::Committed => Err(StoreError::AlreadyCommitted(token.id)),
            TokenStatus::Released => Err(StoreError::AlreadyReleased(token.id)),
            TokenStatus::Reserved => {
                if state.reserved < token.quantity {
                    return Err(StoreError::LedgerCorrupted {
                        sku: token.sku.clone(),
                        detail: format!(
                            "reserved count {} below token quantity {}",
                            state.reserved, token.quantity
                        ),
                    });
                }
                state.reserved -= token.quantity;
                if let Some(entry) = state.tokens.get_mut(&token.id) {
                    entry.1 = TokenStatus::Committed;
                }
                debug!(sku = %token.sku, quantity = token.quantity, token = %token.id, "reservation committed");
                Ok(())
            },
        }
    }

    async fn release(&self, token: &ReservationToken) -> StoreResult<()> {
        let cell = self.sku_cell(&token.sku)?;
        let mut state = cell.lock().unwrap();

        let status = state
            .tokens
            .get(&token.id)
            .map(|(_, status)| *status)
            .ok_or(StoreError::TokenNotFound(token.id))?;

        match status {
            TokenStatus::Committed => Err(StoreError::AlreadyCommitted(token.id)),
            TokenStatus::Released => Err(StoreError::AlreadyReleased(token.id)),
            TokenStatus::Reserved => {
                if state.reserved < token.quantity {
                    return Err(StoreError::LedgerCorrupted {
                        sku: token.sku.clone(),
                        detail: format!(
                            "reserved count {} below token quantity {}",
                            state.reserved, token.quantity
                        ),
                    });
                }
                state.reserved -= token.quantity;
                state.available += token.quantity;
                if let Some(entry) = state.tokens.get_mut(&token.id) {
                    entry.1 = TokenStatus::Released;
                }
                debug!(sku = %token.sku, quantity = token.quantity, token = %token.id, "reservation released");
                Ok(())
            },
        }
    }

    async fn record(&self, sku: &Sku) -> StoreResult<Option<InventoryRecord>> {
        let cell = {
            let skus = self.skus.read().unwrap();
            skus.get(sku).cloned()
        };

        Ok(cell.map(|cell| {
            let state = cell.lock().unwrap();
            InventoryRecord { available: state.available, reserved: state.reserved }
        }))
    }

    async fn stale_reservations(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<Vec<ReservationToken>> {
        let cells: Vec<Arc<Mutex<SkuState>>> = {
            let skus = self.skus.read().unwrap();
            skus.values().cloned().collect()
        };

        let mut stale = Vec::new();
        for cell in cells {
            let state = cell.lock().unwrap();
            for (token, status) in state.tokens.values() {
                if *status == TokenStatus::Reserved && token.reserved_at < cutoff {
                    stale.push(token.clone());
                }
            }
        }
        Ok(stale)
    }
}

// =============================================================================
// Idempotency Store Implementation
// =============================================================================

#[async_trait]
impl IdempotencyStore for MemoryStore {
    async fn claim(&self, key: &IdempotencyKey, wait: Duration) -> StoreResult<Claim> {
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            let mut resolved_rx = {
                let mut keys = self.keys.write().unwrap();
                match keys.get(key) {
                    None => {
                        let (resolved_tx, _) = watch::channel(false);
                        keys.insert(
                            key.clone(),
                            IdemEntry { created_at: Utc::now(), result: None, resolved_tx },
                        );
                        debug!(%key, "idempotency key claimed");
                        return Ok(Claim::Granted);
                    },
                    Some(entry) => match &entry.result {
                        Some(result) => return Ok(Claim::Duplicate(result.clone())),
                        None => entry.resolved_tx.subscribe(),
                    },
                }
            };

            // The first claimant is still in flight; wait for its terminal
            // result, then loop to re-read the map.
            while !*resolved_rx.borrow_and_update() {
                let remaining = deadline
                    .checked_duration_since(tokio::time::Instant::now())
                    .ok_or_else(|| StoreError::ClaimWaitTimeout(key.clone()))?;

                match tokio::time::timeout(remaining, resolved_rx.changed()).await {
                    Ok(Ok(())) => {},
                    Ok(Err(_)) => break,
                    Err(_) => return Err(StoreError::ClaimWaitTimeout(key.clone())),
                }
            }
        }
    }

    async fn attach_result(
        &self,
        key: &IdempotencyKey,
        result: serde_json::Value,
    ) -> StoreResult<()> {
        let mut keys = self.keys.write().unwrap();
        let entry = keys.get_mut(key).ok_or_else(|| StoreError::NotClaimed(key.clone()))?;

        if entry.result.is_some() {
            return Err(StoreError::AlreadyResolved(key.clone()));
        }

        entry.result = Some(result);
        let _ = entry.resolved_tx.send(true);

        debug!(%key, age_ms = (Utc::now() - entry.created_at).num_milliseconds(), "terminal result attached");
        Ok(())
    }
}

// =============================================================================
// Order Repository Implementation
// =============================================================================

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn save(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write().unwrap();
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        let orders = self.orders.read().unwrap();
        Ok(orders.get(id).cloned())
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

impl Store for MemoryStore {
    fn inventory(&self) -> &dyn InventoryLedger {
        self
    }

    fn idempotency(&self) -> &dyn IdempotencyStore {
        self
    }

    fn orders(&self) -> &dyn OrderRepository {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
