//! Cart totals with tiered discount application.
//!
//! The tier order is load-bearing: fixed amounts model coupons and
//! vouchers that must not compound with percentage markdowns, so fixed
//! discounts come off the subtotal first and percentages apply to what is
//! left, rounded once. Reordering the tiers changes the charged amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use caixa_domain::{CartLine, Discount, DiscountKind, Money};

use crate::error::{PricingError, PricingResult};

// =============================================================================
// CartTotals
// =============================================================================

/// Result of pricing a cart: what the lines add up to, what was taken
/// off, and what remains before VAT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of unit price × quantity over all lines
    pub subtotal: Money,
    /// Total discount across both tiers
    pub discount_amount: Money,
    /// Discounted total, before VAT
    pub total_excl_vat: Money,
}

// =============================================================================
// Computation
// =============================================================================

/// Sum the line totals of a cart.
///
/// Mixed-currency carts are rejected outright: the first line fixes the
/// cart currency and any other currency fails the addition.
///
/// # Errors
/// `EmptyCart` for no lines, `CurrencyMismatch` via the domain for mixed
/// currencies, `AmountOverflow` on overflow.
pub fn subtotal(lines: &[CartLine]) -> PricingResult<Money> {
    let first = lines.first().ok_or(PricingError::EmptyCart)?;

    let mut sum = Money::zero(first.unit_price().currency().clone());
    for line in lines {
        sum = sum.add(&line.line_total()?)?;
    }
    Ok(sum)
}

/// Compute cart totals under the fixed-then-percentage discount policy.
///
/// Tier 1 sums every fixed discount and subtracts it from the subtotal,
/// floored at zero. Tier 2 sums every percentage discount (capped at
/// 100%) and applies it to the post-fixed amount, rounding the result
/// once, half-to-even. Within each tier the input order is irrelevant.
///
/// # Errors
/// `EmptyCart`, or domain errors from the money arithmetic.
pub fn compute_totals(lines: &[CartLine], discounts: &[Discount]) -> PricingResult<CartTotals> {
    let subtotal = subtotal(lines)?;
    let currency = subtotal.currency().clone();

    let mut fixed = Money::zero(currency);
    let mut pct_sum = Decimal::ZERO;
    for discount in discounts {
        match &discount.kind {
            DiscountKind::Fixed(amount) => fixed = fixed.add(amount)?,
            DiscountKind::Percentage(pct) => pct_sum += *pct,
        }
    }

    let after_fixed = subtotal.saturating_sub(&fixed)?;

    // Stacked percentages past 100% floor the total at zero.
    let pct_sum = pct_sum.min(Decimal::ONE_HUNDRED);
    let total_excl_vat = after_fixed.scale(Decimal::ONE - pct_sum / Decimal::ONE_HUNDRED)?;

    let discount_amount = subtotal.sub(&total_excl_vat)?;

    Ok(CartTotals { subtotal, discount_amount, total_excl_vat })
}

// =============================================================================
// Tests
// =============================================================================
