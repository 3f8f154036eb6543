//! Domain errors for value object validation and money arithmetic.

use rust_decimal::Decimal;

use crate::money::Currency;

/// Domain errors raised by value object constructors and money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Currency code must be three ASCII letters
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Arithmetic between two different currencies
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand
        left: Currency,
        /// Currency of the right operand
        right: Currency,
    },

    /// Money amounts are non-negative at every public constructor
    #[error("Money amount must be non-negative, got {0}")]
    NegativeAmount(i64),

    /// Checked arithmetic overflowed the minor-unit range
    #[error("Money amount overflow")]
    AmountOverflow,

    /// Scale factors must be non-negative
    #[error("Scale factor must be non-negative, got {0}")]
    NegativeFactor(Decimal),

    /// Strict subtraction would have produced a negative amount
    #[error("Subtraction underflow: {minuend} minus {subtrahend}")]
    SubtractionUnderflow {
        /// Amount subtracted from, in minor units
        minuend: i64,
        /// Amount subtracted, in minor units
        subtrahend: i64,
    },

    /// VAT rates live in [0, 1)
    #[error("Invalid VAT rate: {0} (expected a rate in [0, 1))")]
    InvalidVatRate(Decimal),

    /// SKU identifiers must be non-empty
    #[error("Invalid SKU: {0:?}")]
    InvalidSku(String),

    /// Cart line quantities must be positive
    #[error("Cart line quantity must be positive")]
    InvalidQuantity,

    /// Percentage discounts live in (0, 100]
    #[error("Invalid percentage: {0} (expected a percentage in (0, 100])")]
    InvalidPercentage(Decimal),

    /// Promotion codes must be non-empty
    #[error("Invalid promotion code: {0:?}")]
    InvalidPromotionCode(String),
}
