//! Fixture builders for carts, money, and seeded stores.

use anyhow::{Context, Result};
use std::sync::Arc;

use caixa_domain::{CartLine, Currency, Money, Sku};
use caixa_store::MemoryStore;

/// Build a currency from its code.
pub fn currency(code: &str) -> Result<Currency> {
    Currency::new(code).with_context(|| format!("invalid test currency {code:?}"))
}

/// Build money from minor units.
pub fn money(amount_minor: i64, code: &str) -> Result<Money> {
    let money = Money::from_minor(amount_minor, currency(code)?)
        .with_context(|| format!("invalid test amount {amount_minor}"))?;
    Ok(money)
}

/// Build a SKU.
pub fn sku(id: &str) -> Result<Sku> {
    Sku::new(id).with_context(|| format!("invalid test SKU {id:?}"))
}

/// Build a cart line priced in the given currency.
pub fn cart_line(sku_id: &str, unit_minor: i64, code: &str, quantity: u32) -> Result<CartLine> {
    let line = CartLine::new(sku(sku_id)?, money(unit_minor, code)?, quantity)
        .context("invalid test cart line")?;
    Ok(line)
}

/// A fresh in-memory store seeded with the given (SKU, available) pairs.
pub fn seeded_store(stock: &[(&str, u32)]) -> Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    for (id, available) in stock {
        store.set_stock(sku(id)?, *available);
    }
    Ok(store)
}

// =============================================================================
// Tests
// =============================================================================
