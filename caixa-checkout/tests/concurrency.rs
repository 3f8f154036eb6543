//! Concurrency properties: no overselling under contention, and one
//! execution per idempotency key no matter how requests interleave.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;

use caixa_checkout::{CheckoutConfig, CheckoutError, CheckoutRequest, CheckoutService};
use caixa_payments::StubGateway;
use caixa_store::{IdempotencyKey, InventoryLedger, MemoryStore};
use caixa_testkit::{cart_line, init_tracing, sku};

fn service(
    store: Arc<MemoryStore>,
    gateway: Arc<StubGateway>,
) -> CheckoutService<StubGateway, MemoryStore> {
    init_tracing();
    CheckoutService::new(store, gateway, Vec::new(), CheckoutConfig::test())
}

fn request(key: &str, qty: u32) -> Result<CheckoutRequest> {
    Ok(CheckoutRequest {
        idempotency_key: IdempotencyKey::new(key)?,
        lines: vec![cart_line("A", 1000, "USD", qty)?],
        categories: HashSet::new(),
        discount_codes: Vec::new(),
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_unit_goes_to_exactly_one_checkout() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.set_stock(sku("A")?, 1);
    let gateway = Arc::new(StubGateway::new());
    let service = Arc::new(service(Arc::clone(&store), Arc::clone(&gateway)));

    let first = {
        let service = Arc::clone(&service);
        let req = request("req-1", 1)?;
        tokio::spawn(async move { service.checkout(req).await })
    };
    let second = {
        let service = Arc::clone(&service);
        let req = request("req-2", 1)?;
        tokio::spawn(async move { service.checkout(req).await })
    };

    let outcomes = [first.await?, second.await?];
    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    let out_of_stock = outcomes
        .iter()
        .filter(|o| matches!(o, Err(CheckoutError::OutOfStock { .. })))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(out_of_stock, 1);

    // The loser never reached the payment backend.
    assert_eq!(gateway.calls().authorize, 1);
    assert_eq!(gateway.calls().capture, 1);

    let record = store.record(&sku("A")?).await?.unwrap();
    assert_eq!(record.available, 0);
    assert_eq!(record.reserved, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contended_stock_grants_only_what_fits() -> Result<()> {
    // 16 single-unit checkouts against 4 units of stock.
    let store = Arc::new(MemoryStore::new());
    store.set_stock(sku("A")?, 4);
    let gateway = Arc::new(StubGateway::new());
    let service = Arc::new(service(Arc::clone(&store), Arc::clone(&gateway)));

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = Arc::clone(&service);
        let req = request(&format!("req-{i}"), 1)?;
        handles.push(tokio::spawn(async move { service.checkout(req).await }));
    }

    let mut successes = 0u32;
    let mut out_of_stock = 0u32;
    for handle in handles {
        match handle.await? {
            Ok(_) => successes += 1,
            Err(CheckoutError::OutOfStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected checkout error: {other}"),
        }
    }

    assert_eq!(successes, 4);
    assert_eq!(out_of_stock, 12);

    // One authorization per granted checkout, none for the losers.
    assert_eq!(gateway.calls().authorize, 4);

    let record = store.record(&sku("A")?).await?.unwrap();
    assert_eq!(record.available, 0);
    assert_eq!(record.reserved, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_key_requests_execute_once() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.set_stock(sku("A")?, 5);
    let gateway = Arc::new(StubGateway::new());
    let service = Arc::new(service(Arc::clone(&store), Arc::clone(&gateway)));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = Arc::clone(&service);
        let req = request("same-key", 2)?;
        handles.push(tokio::spawn(async move { service.checkout(req).await }));
    }

    let mut receipts = Vec::new();
    for handle in handles {
        receipts.push(handle.await??);
    }

    // Every caller observes the first execution's receipt.
    for receipt in &receipts {
        assert_eq!(receipt, &receipts[0]);
    }

    assert_eq!(gateway.calls().authorize, 1);
    assert_eq!(gateway.calls().capture, 1);

    // Stock moved exactly once.
    let record = store.record(&sku("A")?).await?.unwrap();
    assert_eq!(record.available, 3);
    assert_eq!(record.reserved, 0);

    Ok(())
}
