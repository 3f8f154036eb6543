//! Stub payment gateway for testing.
//!
//! Simulates processor behavior without network calls: immediate
//! authorizations, configurable declines, and transient-failure runs for
//! exercising the retry path. Every call is counted so tests can assert
//! exactly how often the backend was touched.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use caixa_domain::Money;

use crate::error::PaymentError;
use crate::ports::{BackendAuthorization, PaymentBackendPort};

/// Per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    /// Authorize calls seen
    pub authorize: u32,
    /// Capture calls seen
    pub capture: u32,
    /// Refund calls seen
    pub refund: u32,
}

/// Stub gateway for testing.
pub struct StubGateway {
    decline_next: RwLock<Option<String>>,
    decline_capture_next: RwLock<Option<String>>,
    transient_failures: RwLock<u32>,
    calls: RwLock<CallLog>,
    ref_counter: RwLock<u64>,
}

impl StubGateway {
    /// Create a new stub gateway that approves everything.
    pub fn new() -> Self {
        Self {
            decline_next: RwLock::new(None),
            decline_capture_next: RwLock::new(None),
            transient_failures: RwLock::new(0),
            calls: RwLock::new(CallLog::default()),
            ref_counter: RwLock::new(0),
        }
    }

    /// Decline the next authorization with the given reason.
    pub fn decline_next(&self, reason: &str) {
        let mut decline = self.decline_next.write().unwrap();
        *decline = Some(reason.to_string());
    }

    /// Decline the next capture with the given reason.
    pub fn decline_capture_next(&self, reason: &str) {
        let mut decline = self.decline_capture_next.write().unwrap();
        *decline = Some(reason.to_string());
    }

    /// Fail the next `count` calls (any operation) with a transient error.
    pub fn fail_transient(&self, count: u32) {
        let mut failures = self.transient_failures.write().unwrap();
        *failures = count;
    }

    /// Snapshot the call counts.
    pub fn calls(&self) -> CallLog {
        *self.calls.read().unwrap()
    }

    fn next_ref(&self) -> String {
        let mut counter = self.ref_counter.write().unwrap();
        *counter += 1;
        format!("AUTH-{}", *counter)
    }

    fn take_transient_failure(&self) -> bool {
        let mut failures = self.transient_failures.write().unwrap();
        if *failures > 0 {
            *failures -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentBackendPort for StubGateway {
    async fn authorize(
        &self,
        amount: &Money,
        order_ref: &str,
        _metadata: &HashMap<String, String>,
    ) -> Result<BackendAuthorization, PaymentError> {
        self.calls.write().unwrap().authorize += 1;

        if self.take_transient_failure() {
            return Err(PaymentError::Transient("simulated gateway outage".to_string()));
        }

        if let Some(reason) = self.decline_next.write().unwrap().take() {
            return Err(PaymentError::Declined(reason));
        }

        let processor_ref = self.next_ref();
        debug!(order_ref, amount = %amount, %processor_ref, "stub: authorized");
        Ok(BackendAuthorization { processor_ref, authorized_at: Utc::now() })
    }

    async fn capture(&self, processor_ref: &str, amount: &Money) -> Result<(), PaymentError> {
        self.calls.write().unwrap().capture += 1;

        if self.take_transient_failure() {
            return Err(PaymentError::Transient("simulated gateway outage".to_string()));
        }

        if let Some(reason) = self.decline_capture_next.write().unwrap().take() {
            return Err(PaymentError::Declined(reason));
        }

        debug!(processor_ref, amount = %amount, "stub: captured");
        Ok(())
    }

    async fn refund(&self, processor_ref: &str, amount: &Money) -> Result<(), PaymentError> {
        self.calls.write().unwrap().refund += 1;

        if self.take_transient_failure() {
            return Err(PaymentError::Transient("simulated gateway outage".to_string()));
        }

        debug!(processor_ref, amount = %amount, "stub: refunded");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
