//! Net/gross VAT conversion built on Money.
//!
//! `split_gross` derives the VAT share by subtraction, never by scaling, so
//! net + vat always reconstructs the gross exactly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::money::Money;

// =============================================================================
// VatRate
// =============================================================================

/// VAT rate as a fraction.
///
/// # Invariants
/// - Must be in [0, 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate(Decimal);

impl VatRate {
    /// Create a new VatRate with validation.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidVatRate` if the rate is outside [0, 1).
    pub fn new(rate: Decimal) -> Result<Self, DomainError> {
        if rate < Decimal::ZERO || rate >= Decimal::ONE {
            return Err(DomainError::InvalidVatRate(rate));
        }
        Ok(Self(rate))
    }

    /// Get the underlying fraction.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Compute the gross amount: `net × (1 + rate)`, rounded half-to-even.
///
/// # Errors
/// Propagates money scaling errors.
pub fn net_to_gross(net: &Money, rate: VatRate) -> Result<Money, DomainError> {
    net.scale(Decimal::ONE + rate.as_decimal())
}

/// Split a gross amount into (net, vat).
///
/// Net is computed by dividing before rounding; vat is then derived as
/// `gross - net`, never by scaling, so that `net + vat == gross` holds
/// exactly for every non-negative gross and every rate in [0, 1).
///
/// # Errors
/// `AmountOverflow` if the rounded net leaves the minor-unit range.
pub fn split_gross(gross: &Money, rate: VatRate) -> Result<(Money, Money), DomainError> {
    let divisor = Decimal::ONE + rate.as_decimal();
    let net_exact = Decimal::from(gross.amount_minor()) / divisor;
    let net_minor = net_exact
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .ok_or(DomainError::AmountOverflow)?;

    let net = Money::from_minor(net_minor, gross.currency().clone())?;
    let vat = gross.sub(&net)?;
    Ok((net, vat))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use rust_decimal_macros::dec;

    fn eur(minor: i64) -> Money {
        Money::from_minor(minor, Currency::new("EUR").unwrap()).unwrap()
    }

    #[test]
    fn test_vat_rate_validation() {
        assert!(VatRate::new(dec!(0)).is_ok());
        assert!(VatRate::new(dec!(0.19)).is_ok());
        assert!(VatRate::new(dec!(0.999)).is_ok());
        assert!(VatRate::new(dec!(1)).is_err());
        assert!(VatRate::new(dec!(-0.1)).is_err());
    }

    #[test]
    fn test_net_to_gross() {
        let net = eur(10000);
        let gross = net_to_gross(&net, VatRate::new(dec!(0.19)).unwrap()).unwrap();
        assert_eq!(gross.amount_minor(), 11900);
    }

    #[test]
    fn test_split_gross_reconstructs_exactly() {
        let rate = VatRate::new(dec!(0.19)).unwrap();
        let gross = eur(11900);

        let (net, vat) = split_gross(&gross, rate).unwrap();
        assert_eq!(net.amount_minor(), 10000);
        assert_eq!(vat.amount_minor(), 1900);
        assert_eq!(net.add(&vat).unwrap(), gross);
    }

    #[test]
    fn test_split_gross_reconciles_across_rates_and_amounts() {
        // Odd-cent amounts where the division never lands exactly.
        let rates = [dec!(0), dec!(0.07), dec!(0.19), dec!(0.20), dec!(0.255), dec!(0.999)];
        let amounts = [0i64, 1, 99, 101, 1350, 12345, 999_999_999];

        for &rate in &rates {
            let rate = VatRate::new(rate).unwrap();
            for &amount in &amounts {
                let gross = eur(amount);
                let (net, vat) = split_gross(&gross, rate).unwrap();
                assert_eq!(
                    net.add(&vat).unwrap(),
                    gross,
                    "net + vat must equal gross for amount {} at rate {}",
                    amount,
                    rate
                );
            }
        }
    }

    #[test]
    fn test_split_gross_zero_rate() {
        let (net, vat) = split_gross(&eur(1234), VatRate::new(dec!(0)).unwrap()).unwrap();
        assert_eq!(net.amount_minor(), 1234);
        assert!(vat.is_zero());
    }
}
