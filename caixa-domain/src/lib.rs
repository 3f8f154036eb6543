//! Caixa Domain Layer
//!
//! Pure domain logic with zero I/O dependencies: money and VAT arithmetic,
//! cart value objects, promotion rules, and the order entity.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod promotion;
pub mod vat;

// Re-export commonly used types
pub use cart::{CartContext, CartLine, Sku};
pub use error::DomainError;
pub use money::{Currency, Money};
pub use order::{Order, OrderId, OrderStatus, OrderTotals};
pub use promotion::{Discount, DiscountKind, Promotion, PromotionRule};
pub use vat::{net_to_gross, split_gross, VatRate};
