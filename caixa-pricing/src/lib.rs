//! Caixa Pricing Engine
//!
//! Pure decision logic, deterministic, no I/O: resolves discount codes
//! against the promotion catalog and computes cart totals under the
//! fixed-then-percentage discount policy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod eligibility;
pub mod error;
pub mod totals;

pub use eligibility::{authorize_discounts, context_for};
pub use error::{PricingError, PricingResult};
pub use totals::{compute_totals, subtotal, CartTotals};
