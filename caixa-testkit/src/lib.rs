//! Test helpers for caixa tests.
//!
//! Provides tracing setup, fixture builders for carts and money, and a
//! seeded in-memory store.

mod helpers;

pub use helpers::{cart_line, currency, money, seeded_store, sku};

use std::sync::Once;

static TRACING: Once = Once::new();

/// Initialize test tracing output once per process.
///
/// Respects `RUST_LOG`; defaults to `info`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}
