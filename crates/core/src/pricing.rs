//! Cart price calculation.
//!
//! [`summarize`] derives a [`PriceSummary`] from a list of line items and a
//! [`PricingPolicy`]. It is pure and deterministic: the same items and policy
//! always give the same summary, and unit prices come from each line's
//! snapshot rather than the live catalog.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CurrencyCode, LineItem, format_amount};

/// Invalid pricing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingPolicyError {
    #[error("tax rate must be between 0 and 1 (got {0})")]
    TaxRateOutOfRange(Decimal),
    #[error("{0} must not be negative (got {1})")]
    NegativeAmount(&'static str, Decimal),
}

/// Tax and shipping configuration for a storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    tax_rate: Decimal,
    free_shipping_threshold: Decimal,
    flat_shipping_fee: Decimal,
    currency_code: CurrencyCode,
}

impl Default for PricingPolicy {
    /// 7% tax, free shipping from $50.00, otherwise $5.99 flat.
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(7, 2),
            free_shipping_threshold: Decimal::new(5000, 2),
            flat_shipping_fee: Decimal::new(599, 2),
            currency_code: CurrencyCode::USD,
        }
    }
}

impl PricingPolicy {
    /// Create a validated pricing policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the tax rate is outside `[0, 1]` or either amount
    /// is negative.
    pub fn new(
        tax_rate: Decimal,
        free_shipping_threshold: Decimal,
        flat_shipping_fee: Decimal,
        currency_code: CurrencyCode,
    ) -> Result<Self, PricingPolicyError> {
        if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
            return Err(PricingPolicyError::TaxRateOutOfRange(tax_rate));
        }
        if free_shipping_threshold < Decimal::ZERO {
            return Err(PricingPolicyError::NegativeAmount(
                "free shipping threshold",
                free_shipping_threshold,
            ));
        }
        if flat_shipping_fee < Decimal::ZERO {
            return Err(PricingPolicyError::NegativeAmount(
                "flat shipping fee",
                flat_shipping_fee,
            ));
        }

        Ok(Self {
            tax_rate,
            free_shipping_threshold,
            flat_shipping_fee,
            currency_code,
        })
    }

    #[must_use]
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    #[must_use]
    pub const fn free_shipping_threshold(&self) -> Decimal {
        self.free_shipping_threshold
    }

    #[must_use]
    pub const fn flat_shipping_fee(&self) -> Decimal {
        self.flat_shipping_fee
    }

    #[must_use]
    pub const fn currency_code(&self) -> CurrencyCode {
        self.currency_code
    }
}

/// Derived totals for a cart. Never stored; recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub free_shipping_threshold: Decimal,
    /// How much more the shopper must spend for free shipping. Zero when
    /// shipping is already free or the cart is empty.
    pub amount_to_free_shipping: Decimal,
    pub currency_code: CurrencyCode,
}

impl PriceSummary {
    /// Summary of an empty cart under `policy`.
    #[must_use]
    pub const fn empty(policy: &PricingPolicy) -> Self {
        Self {
            item_count: 0,
            subtotal: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            free_shipping_threshold: policy.free_shipping_threshold,
            amount_to_free_shipping: Decimal::ZERO,
            currency_code: policy.currency_code,
        }
    }

    /// Whether the shopper should see an "almost free shipping" nudge.
    #[must_use]
    pub fn shows_free_shipping_nudge(&self) -> bool {
        self.amount_to_free_shipping > Decimal::ZERO
    }

    /// Formatted total, e.g. "$27.39".
    #[must_use]
    pub fn display_total(&self) -> String {
        format_amount(self.total, self.currency_code)
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the price summary for `items` under `policy`.
#[must_use]
pub fn summarize(items: &[LineItem], policy: &PricingPolicy) -> PriceSummary {
    if items.is_empty() {
        return PriceSummary::empty(policy);
    }

    let item_count = items
        .iter()
        .fold(0_u32, |acc, item| acc.saturating_add(item.quantity));
    let subtotal: Decimal = items.iter().map(LineItem::line_total).sum();

    let free_shipping = subtotal >= policy.free_shipping_threshold;
    let shipping_fee = if free_shipping {
        Decimal::ZERO
    } else {
        policy.flat_shipping_fee
    };
    let amount_to_free_shipping = if subtotal > Decimal::ZERO && !free_shipping {
        policy.free_shipping_threshold - subtotal
    } else {
        Decimal::ZERO
    };

    let tax = round_cents(subtotal * policy.tax_rate);
    let total = subtotal + shipping_fee + tax;

    PriceSummary {
        item_count,
        subtotal,
        shipping_fee,
        tax,
        total,
        free_shipping_threshold: policy.free_shipping_threshold,
        amount_to_free_shipping,
        currency_code: policy.currency_code,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{LineItemId, Price, ProductId, ProductSnapshot};
    use proptest::prelude::*;

    fn line(product: i32, cents: i64, quantity: u32) -> LineItem {
        LineItem {
            id: LineItemId::generate(),
            product_id: ProductId::new(product),
            quantity,
            product: ProductSnapshot {
                name: format!("Plant {product}"),
                price: Price::usd_cents(cents),
                compare_at_price: None,
                image_url: None,
                sku: format!("SKU-{product}"),
            },
        }
    }

    fn cents(c: i64) -> Decimal {
        Decimal::new(c, 2)
    }

    #[test]
    fn test_two_plants_at_ten_dollars() {
        let summary = summarize(&[line(42, 1000, 2)], &PricingPolicy::default());
        assert_eq!(summary.subtotal, cents(2000));
        assert_eq!(summary.shipping_fee, cents(599));
        assert_eq!(summary.tax, cents(140));
        assert_eq!(summary.total, cents(2739));
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.amount_to_free_shipping, cents(3000));
        assert_eq!(summary.display_total(), "$27.39");
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let summary = summarize(&[], &PricingPolicy::default());
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.shipping_fee, Decimal::ZERO);
        assert_eq!(summary.tax, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.item_count, 0);
        assert!(!summary.shows_free_shipping_nudge());
    }

    #[test]
    fn test_threshold_boundary_is_free() {
        let summary = summarize(&[line(1, 2500, 2)], &PricingPolicy::default());
        assert_eq!(summary.subtotal, cents(5000));
        assert_eq!(summary.shipping_fee, Decimal::ZERO);
        assert!(!summary.shows_free_shipping_nudge());
    }

    #[test]
    fn test_just_below_threshold_pays_flat_fee() {
        let summary = summarize(&[line(1, 4999, 1)], &PricingPolicy::default());
        assert_eq!(summary.shipping_fee, cents(599));
        assert_eq!(summary.amount_to_free_shipping, cents(1));
    }

    #[test]
    fn test_free_items_get_no_free_shipping_nudge() {
        let summary = summarize(&[line(7, 0, 3)], &PricingPolicy::default());
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.amount_to_free_shipping, Decimal::ZERO);
        assert!(!summary.shows_free_shipping_nudge());
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 0.50 * 0.07 = 0.035 -> 0.04
        let summary = summarize(&[line(1, 50, 1)], &PricingPolicy::default());
        assert_eq!(summary.tax, cents(4));
    }

    #[test]
    fn test_policy_rejects_bad_values() {
        assert!(matches!(
            PricingPolicy::new(cents(150), cents(5000), cents(599), CurrencyCode::USD),
            Err(PricingPolicyError::TaxRateOutOfRange(_))
        ));
        assert!(matches!(
            PricingPolicy::new(cents(7), cents(-1), cents(599), CurrencyCode::USD),
            Err(PricingPolicyError::NegativeAmount(_, _))
        ));
        assert!(matches!(
            PricingPolicy::new(cents(7), cents(5000), cents(-599), CurrencyCode::USD),
            Err(PricingPolicyError::NegativeAmount(_, _))
        ));
    }

    #[test]
    fn test_custom_policy() {
        let policy =
            PricingPolicy::new(cents(8), cents(7500), cents(1000), CurrencyCode::CAD).unwrap();
        let summary = summarize(&[line(1, 5000, 1)], &policy);
        assert_eq!(summary.shipping_fee, cents(1000));
        assert_eq!(summary.tax, cents(400));
        assert_eq!(summary.total, cents(6400));
        assert_eq!(summary.currency_code, CurrencyCode::CAD);
    }

    proptest! {
        #[test]
        fn prop_subtotal_is_sum_of_snapshot_lines(
            lines in prop::collection::vec((1..20_000_i64, 1..10_u32), 1..8)
        ) {
            let items: Vec<LineItem> = lines
                .iter()
                .enumerate()
                .map(|(i, (price, qty))| line(i32::try_from(i).unwrap(), *price, *qty))
                .collect();
            let expected: Decimal = lines
                .iter()
                .map(|(price, qty)| cents(*price) * Decimal::from(*qty))
                .sum();

            let policy = PricingPolicy::default();
            let summary = summarize(&items, &policy);
            prop_assert_eq!(summary.subtotal, expected);
            prop_assert_eq!(summary.total, summary.subtotal + summary.shipping_fee + summary.tax);
            if summary.subtotal >= policy.free_shipping_threshold() {
                prop_assert_eq!(summary.shipping_fee, Decimal::ZERO);
            } else {
                prop_assert_eq!(summary.shipping_fee, policy.flat_shipping_fee());
            }
        }
    }
}
