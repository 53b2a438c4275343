//! Cart totals.
//!
//! `subtotal` already uses discounted unit prices, and `discount` is then
//! subtracted once more when computing `total`. Existing order totals depend
//! on this arithmetic, so it must not be "fixed".

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line::CartLine;
use crate::types::round_to_unit;

/// Store-wide pricing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Fraction of the subtotal charged as tax (0.11 = 11%).
    pub tax_rate: Decimal,
    /// Flat shipping fee charged on any non-empty cart.
    pub shipping_fee: Decimal,
}

impl PricingPolicy {
    pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(11, 0, 0, false, 2);
    pub const DEFAULT_SHIPPING_FEE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Self::DEFAULT_TAX_RATE,
            shipping_fee: Self::DEFAULT_SHIPPING_FEE,
        }
    }
}

/// Derived cart amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Compute totals for a set of lines.
    #[must_use]
    pub fn compute(lines: &[CartLine], policy: &PricingPolicy) -> Self {
        if lines.is_empty() {
            return Self::default();
        }

        let subtotal = subtotal(lines);
        let discount: Decimal = lines.iter().map(CartLine::line_discount).sum();
        let shipping = policy.shipping_fee;
        let tax = round_to_unit(subtotal * policy.tax_rate);
        let total = subtotal + shipping + tax - discount;

        Self {
            subtotal,
            discount,
            shipping,
            tax,
            total,
        }
    }
}

/// Sum of effective price times quantity.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::cart::identity::OwnerKey;
    use crate::cart::line::{CartItem, item_count};
    use crate::types::catalog::fixtures::product;
    use crate::types::{CartItemId, UserId};

    fn line(id: i64, price: i64, discount: Option<i64>, quantity: u32) -> CartLine {
        let product = product(id, price, discount, None);
        CartLine {
            item: CartItem {
                id: CartItemId::new(id),
                owner: OwnerKey::User(UserId::new(1)),
                product_id: product.id,
                quantity,
                created_at: DateTime::<Utc>::UNIX_EPOCH,
                updated_at: DateTime::<Utc>::UNIX_EPOCH,
            },
            product,
        }
    }

    #[test]
    fn empty_cart_has_zero_totals() {
        let totals = CartTotals::compute(&[], &PricingPolicy::default());
        assert_eq!(totals, CartTotals::default());
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn discounted_line_matches_reference_totals() {
        let lines = [line(1, 100_000, Some(80_000), 2)];
        let totals = CartTotals::compute(&lines, &PricingPolicy::default());

        assert_eq!(totals.subtotal, Decimal::from(160_000));
        assert_eq!(totals.discount, Decimal::from(40_000));
        assert_eq!(totals.shipping, Decimal::from(10_000));
        assert_eq!(totals.tax, Decimal::from(17_600));
        assert_eq!(totals.total, Decimal::from(147_600));
    }

    #[test]
    fn non_discount_sale_price_contributes_nothing_to_discount() {
        let lines = [
            line(1, 50_000, Some(60_000), 1),
            line(2, 20_000, None, 3),
        ];
        let totals = CartTotals::compute(&lines, &PricingPolicy::default());

        assert_eq!(totals.subtotal, Decimal::from(110_000));
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::from(12_100));
        assert_eq!(totals.total, Decimal::from(132_100));
    }

    #[test]
    fn tax_rounds_half_up_to_whole_units() {
        // 4_550 * 0.11 = 500.5
        let lines = [line(1, 4_550, None, 1)];
        let totals = CartTotals::compute(&lines, &PricingPolicy::default());
        assert_eq!(totals.tax, Decimal::from(501));

        // 4_545 * 0.11 = 499.95
        let lines = [line(1, 4_545, None, 1)];
        let totals = CartTotals::compute(&lines, &PricingPolicy::default());
        assert_eq!(totals.tax, Decimal::from(500));
    }

    #[test]
    fn policy_overrides_are_applied() {
        let policy = PricingPolicy {
            tax_rate: Decimal::ZERO,
            shipping_fee: Decimal::from(25_000),
        };
        let totals = CartTotals::compute(&[line(1, 10_000, None, 1)], &policy);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::from(35_000));
    }

    #[test]
    fn item_count_sums_quantities() {
        let lines = [line(1, 1, None, 2), line(2, 1, None, 5)];
        assert_eq!(item_count(&lines), 7);
        assert_eq!(item_count(&[]), 0);
    }

    #[test]
    fn default_policy_matches_store_defaults() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.tax_rate, Decimal::new(11, 2));
        assert_eq!(policy.shipping_fee, Decimal::from(10_000));
    }
}
