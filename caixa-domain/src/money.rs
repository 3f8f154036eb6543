//! Money and currency primitives.
//!
//! Amounts are integer minor units (e.g., cents) tagged with a currency
//! code; there is no floating-point representation anywhere. Scaling goes
//! through `rust_decimal` and rounds half-to-even, the single rounding rule
//! used everywhere money is scaled.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

// =============================================================================
// Currency
// =============================================================================

/// ISO-style alphabetic currency code (e.g., EUR, USD).
///
/// # Invariants
/// - Exactly three ASCII letters, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new Currency with validation.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCurrency` if the code is not three
    /// ASCII letters.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Get the uppercase three-letter code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Money
// =============================================================================

/// Money is an exact fixed-point amount in minor units plus a currency tag.
///
/// Immutable value type: every operation returns a new instance. Public
/// constructors reject negative amounts; arithmetic between different
/// currencies fails with `CurrencyMismatch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    /// Create Money from an amount in minor units.
    ///
    /// # Errors
    /// Returns `DomainError::NegativeAmount` if the amount is negative.
    pub fn from_minor(amount_minor: i64, currency: Currency) -> Result<Self, DomainError> {
        if amount_minor < 0 {
            return Err(DomainError::NegativeAmount(amount_minor));
        }
        Ok(Self { amount_minor, currency })
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { amount_minor: 0, currency }
    }

    /// Amount in minor units.
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Currency tag.
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }

    fn with_amount(&self, amount_minor: i64) -> Money {
        Money { amount_minor, currency: self.currency.clone() }
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    /// `CurrencyMismatch` if the currencies differ, `AmountOverflow` on
    /// overflow.
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        self.require_same_currency(other)?;
        let amount = self
            .amount_minor
            .checked_add(other.amount_minor)
            .ok_or(DomainError::AmountOverflow)?;
        Ok(self.with_amount(amount))
    }

    /// Strict same-currency subtraction.
    ///
    /// # Errors
    /// `CurrencyMismatch` if the currencies differ,
    /// `SubtractionUnderflow` if the result would be negative.
    pub fn sub(&self, other: &Money) -> Result<Money, DomainError> {
        self.require_same_currency(other)?;
        if other.amount_minor > self.amount_minor {
            return Err(DomainError::SubtractionUnderflow {
                minuend: self.amount_minor,
                subtrahend: other.amount_minor,
            });
        }
        Ok(self.with_amount(self.amount_minor - other.amount_minor))
    }

    /// Same-currency subtraction floored at zero.
    ///
    /// This is the fixed-discount primitive: subtracting more than the
    /// amount yields zero rather than an error.
    ///
    /// # Errors
    /// `CurrencyMismatch` if the currencies differ.
    pub fn saturating_sub(&self, other: &Money) -> Result<Money, DomainError> {
        self.require_same_currency(other)?;
        Ok(self.with_amount((self.amount_minor - other.amount_minor).max(0)))
    }

    /// Multiply by a rational factor, rounding to the nearest minor unit
    /// with round-half-to-even (banker's rounding).
    ///
    /// # Errors
    /// `NegativeFactor` for negative factors, `AmountOverflow` if the
    /// result leaves the minor-unit range.
    pub fn scale(&self, factor: Decimal) -> Result<Money, DomainError> {
        if factor.is_sign_negative() {
            return Err(DomainError::NegativeFactor(factor));
        }
        let scaled = Decimal::from(self.amount_minor) * factor;
        let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        let amount = rounded.to_i64().ok_or(DomainError::AmountOverflow)?;
        Ok(self.with_amount(amount))
    }

    /// Multiply by an integer quantity, exactly.
    ///
    /// # Errors
    /// `AmountOverflow` on overflow.
    pub fn mul_qty(&self, quantity: u32) -> Result<Money, DomainError> {
        let amount = self
            .amount_minor
            .checked_mul(i64::from(quantity))
            .ok_or(DomainError::AmountOverflow)?;
        Ok(self.with_amount(amount))
    }
}

impl fmt::Display for Money {
    /// Display assumes two-decimal minor units; this is for logs and
    /// messages only, never for serialization.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02} {}", self.amount_minor / 100, self.amount_minor % 100, self.currency)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eur() -> Currency {
        Currency::new("EUR").unwrap()
    }

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    // Currency tests
    #[test]
    fn test_currency_validation() {
        assert!(Currency::new("EUR").is_ok());
        assert!(Currency::new("usd").is_ok());
        assert!(Currency::new("EURO").is_err());
        assert!(Currency::new("E1R").is_err());
        assert!(Currency::new("").is_err());
    }

    #[test]
    fn test_currency_uppercased() {
        assert_eq!(Currency::new("eur").unwrap().code(), "EUR");
    }

    // Constructor tests
    #[test]
    fn test_from_minor_rejects_negative() {
        assert!(Money::from_minor(-1, eur()).is_err());
        assert!(Money::from_minor(0, eur()).is_ok());
        assert!(Money::from_minor(1999, eur()).is_ok());
    }

    // Arithmetic tests
    #[test]
    fn test_add_commutes() {
        let a = Money::from_minor(1234, eur()).unwrap();
        let b = Money::from_minor(5678, eur()).unwrap();

        assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
        assert_eq!(a.add(&b).unwrap().amount_minor(), 6912);
    }

    #[test]
    fn test_add_currency_mismatch() {
        let a = Money::from_minor(100, eur()).unwrap();
        let b = Money::from_minor(100, usd()).unwrap();

        assert!(matches!(a.add(&b), Err(DomainError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_add_overflow() {
        let a = Money::from_minor(i64::MAX, eur()).unwrap();
        let b = Money::from_minor(1, eur()).unwrap();

        assert_eq!(a.add(&b), Err(DomainError::AmountOverflow));
    }

    #[test]
    fn test_sub_strict() {
        let a = Money::from_minor(500, eur()).unwrap();
        let b = Money::from_minor(200, eur()).unwrap();

        assert_eq!(a.sub(&b).unwrap().amount_minor(), 300);
        assert!(matches!(b.sub(&a), Err(DomainError::SubtractionUnderflow { .. })));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Money::from_minor(500, eur()).unwrap();
        let b = Money::from_minor(800, eur()).unwrap();

        assert!(a.saturating_sub(&b).unwrap().is_zero());
        assert_eq!(b.saturating_sub(&a).unwrap().amount_minor(), 300);
    }

    // Scaling tests
    #[test]
    fn test_scale_rounds_half_to_even() {
        // 25 * 0.5 = 12.5 -> rounds to 12 (even), not 13
        let m = Money::from_minor(25, eur()).unwrap();
        assert_eq!(m.scale(dec!(0.5)).unwrap().amount_minor(), 12);

        // 35 * 0.5 = 17.5 -> rounds to 18 (even)
        let m = Money::from_minor(35, eur()).unwrap();
        assert_eq!(m.scale(dec!(0.5)).unwrap().amount_minor(), 18);
    }

    #[test]
    fn test_scale_rejects_negative_factor() {
        let m = Money::from_minor(100, eur()).unwrap();
        assert!(matches!(m.scale(dec!(-1)), Err(DomainError::NegativeFactor(_))));
    }

    #[test]
    fn test_mul_qty() {
        let unit = Money::from_minor(1000, usd()).unwrap();
        assert_eq!(unit.mul_qty(2).unwrap().amount_minor(), 2000);
        assert_eq!(unit.mul_qty(0).unwrap().amount_minor(), 0);
    }

    #[test]
    fn test_display() {
        let m = Money::from_minor(1350, usd()).unwrap();
        assert_eq!(m.to_string(), "13.50 USD");
    }

    #[test]
    fn test_serde_preserves_minor_units() {
        let m = Money::from_minor(1999, eur()).unwrap();
        let json = serde_json::to_string(&m).unwrap();

        assert!(json.contains("1999"));
        assert!(!json.contains("19.99"));

        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
