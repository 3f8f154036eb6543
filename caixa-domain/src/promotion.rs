//! Promotion rules and discounts.
//!
//! Rules are a closed set of composable predicates evaluated against a
//! `CartContext`. They are stateless and reusable across requests; the
//! combinators short-circuit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartContext;
use crate::error::DomainError;
use crate::money::Money;

// =============================================================================
// PromotionRule
// =============================================================================

/// Eligibility predicate over a cart context.
///
/// A closed sum type: the set of rule shapes is known and fixed, so adding
/// a variant is a deliberate schema change rather than a plug-in point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PromotionRule {
    /// Cart subtotal must reach the given amount
    MinCartAmount(Money),

    /// Cart must contain the given category identifier
    CategoryContains(String),

    /// Every inner rule must pass; stops at the first false
    All(Vec<PromotionRule>),

    /// At least one inner rule must pass; stops at the first true
    Any(Vec<PromotionRule>),

    /// Inverts the inner rule
    Not(Box<PromotionRule>),
}

impl PromotionRule {
    /// Evaluate this rule against a cart context.
    ///
    /// # Errors
    /// Returns `DomainError::CurrencyMismatch` if a `MinCartAmount`
    /// threshold is in a different currency than the context subtotal.
    pub fn is_eligible(&self, ctx: &CartContext) -> Result<bool, DomainError> {
        match self {
            PromotionRule::MinCartAmount(threshold) => {
                if ctx.subtotal.currency() != threshold.currency() {
                    return Err(DomainError::CurrencyMismatch {
                        left: ctx.subtotal.currency().clone(),
                        right: threshold.currency().clone(),
                    });
                }
                Ok(ctx.subtotal.amount_minor() >= threshold.amount_minor())
            },

            PromotionRule::CategoryContains(category) => Ok(ctx.categories.contains(category)),

            PromotionRule::All(rules) => {
                for rule in rules {
                    if !rule.is_eligible(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },

            PromotionRule::Any(rules) => {
                for rule in rules {
                    if rule.is_eligible(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            },

            PromotionRule::Not(rule) => Ok(!rule.is_eligible(ctx)?),
        }
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// The two discount shapes, applied in fixed tier order by the pricing
/// engine: fixed amounts first, percentages second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiscountKind {
    /// Flat amount off the subtotal
    Fixed(Money),

    /// Percent-as-number off the post-fixed-discount amount (10 means 10%)
    Percentage(Decimal),
}

impl DiscountKind {
    /// Validate the discount parameters.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPercentage` if a percentage is outside
    /// (0, 100]. Fixed amounts are non-negative by construction.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let DiscountKind::Percentage(pct) = self {
            if *pct <= Decimal::ZERO || *pct > Decimal::ONE_HUNDRED {
                return Err(DomainError::InvalidPercentage(*pct));
            }
        }
        Ok(())
    }
}

/// An authorized discount, carrying the rule that granted it for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    /// What the discount is worth
    pub kind: DiscountKind,
    /// The rule that authorized this discount
    pub authorized_by: PromotionRule,
}

// =============================================================================
// Promotion
// =============================================================================

/// A catalog entry: a discount code, the rule gating it, and the discount
/// it grants when eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// Discount code clients put on checkout requests
    pub code: String,
    /// Eligibility rule
    pub rule: PromotionRule,
    /// Discount granted when the rule passes
    pub kind: DiscountKind,
}

impl Promotion {
    /// Create a new Promotion with validation.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPromotionCode` for an empty code, or
    /// the discount kind's own validation error.
    pub fn new(code: &str, rule: PromotionRule, kind: DiscountKind) -> Result<Self, DomainError> {
        if code.trim().is_empty() {
            return Err(DomainError::InvalidPromotionCode(code.to_string()));
        }
        kind.validate()?;
        Ok(Self { code: code.to_string(), rule, kind })
    }
}

// =============================================================================
// Tests
// =============================================================================
