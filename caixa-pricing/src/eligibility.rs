//! Discount authorization against the promotion catalog.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use caixa_domain::{CartContext, CartLine, Discount, Promotion};

use crate::error::{PricingError, PricingResult};
use crate::totals::subtotal;

/// Build the evaluation context for a cart.
///
/// The subtotal comes from the lines; category identifiers and custom data
/// come from the caller, since they ride on the checkout request rather
/// than the minimal line model.
///
/// # Errors
/// `EmptyCart` or domain errors from the subtotal computation.
pub fn context_for(
    lines: &[CartLine],
    categories: HashSet<String>,
    custom: HashMap<String, serde_json::Value>,
) -> PricingResult<CartContext> {
    let mut ctx = CartContext::new(subtotal(lines)?);
    ctx.categories = categories;
    ctx.custom = custom;
    Ok(ctx)
}

/// Resolve requested discount codes into authorized discounts.
///
/// An unknown code is a caller error and fails the request; a known code
/// whose rule is not satisfied is simply skipped (the rule said no, which
/// is an answer, not a failure). Granted discounts carry their rule for
/// audit.
///
/// # Errors
/// `UnknownCode` for a code not in the catalog; domain errors from rule
/// evaluation (e.g., a threshold in a foreign currency).
pub fn authorize_discounts(
    catalog: &[Promotion],
    codes: &[String],
    ctx: &CartContext,
) -> PricingResult<Vec<Discount>> {
    let mut granted = Vec::with_capacity(codes.len());

    for code in codes {
        let promotion = catalog
            .iter()
            .find(|p| p.code == *code)
            .ok_or_else(|| PricingError::UnknownCode(code.clone()))?;

        if promotion.rule.is_eligible(ctx)? {
            granted.push(Discount {
                kind: promotion.kind.clone(),
                authorized_by: promotion.rule.clone(),
            });
        } else {
            debug!(code, "discount code not eligible, skipped");
        }
    }

    Ok(granted)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use caixa_domain::{Currency, DiscountKind, Money, PromotionRule, Sku};
    use rust_decimal_macros::dec;

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::new("USD").unwrap()).unwrap()
    }

    fn line(unit_minor: i64, qty: u32) -> CartLine {
        CartLine::new(Sku::new("A").unwrap(), usd(unit_minor), qty).unwrap()
    }

    fn catalog() -> Vec<Promotion> {
        vec![
            Promotion::new(
                "SAVE5",
                PromotionRule::MinCartAmount(usd(1500)),
                DiscountKind::Fixed(usd(500)),
            )
            .unwrap(),
            Promotion::new(
                "BOOKS10",
                PromotionRule::CategoryContains("books".to_string()),
                DiscountKind::Percentage(dec!(10)),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_context_carries_subtotal_and_categories() {
        let categories: HashSet<String> = ["books".to_string()].into_iter().collect();
        let ctx = context_for(&[line(1000, 2)], categories, HashMap::new()).unwrap();

        assert_eq!(ctx.subtotal, usd(2000));
        assert!(ctx.categories.contains("books"));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let ctx = context_for(&[line(1000, 2)], HashSet::new(), HashMap::new()).unwrap();

        let result = authorize_discounts(&catalog(), &["NOPE".to_string()], &ctx);
        assert_eq!(result, Err(PricingError::UnknownCode("NOPE".to_string())));
    }

    #[test]
    fn test_ineligible_code_skipped() {
        // Subtotal below the SAVE5 threshold: code is known but not granted.
        let ctx = context_for(&[line(1000, 1)], HashSet::new(), HashMap::new()).unwrap();

        let granted = authorize_discounts(&catalog(), &["SAVE5".to_string()], &ctx).unwrap();
        assert!(granted.is_empty());
    }

    #[test]
    fn test_eligible_codes_granted_with_rule() {
        let categories: HashSet<String> = ["books".to_string()].into_iter().collect();
        let ctx = context_for(&[line(1000, 2)], categories, HashMap::new()).unwrap();

        let granted = authorize_discounts(
            &catalog(),
            &["SAVE5".to_string(), "BOOKS10".to_string()],
            &ctx,
        )
        .unwrap();

        assert_eq!(granted.len(), 2);
        assert_eq!(granted[0].kind, DiscountKind::Fixed(usd(500)));
        assert_eq!(granted[0].authorized_by, PromotionRule::MinCartAmount(usd(1500)));
    }
}
