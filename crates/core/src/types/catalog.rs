//! Catalog types: products and the categories they are filed under.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// A product as the cart sees it.
///
/// Products are read-only to the cart. Prices are whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// List price.
    pub price: Decimal,
    /// Sale price. Only counts as a discount when strictly below `price`.
    pub discount_price: Option<Decimal>,
    /// Units on hand. `None` means stock is not tracked.
    pub stock: Option<i32>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The sale price, if it is a genuine discount.
    #[must_use]
    pub fn active_discount_price(&self) -> Option<Decimal> {
        self.discount_price.filter(|discount| *discount < self.price)
    }

    /// Price charged per unit.
    ///
    /// Every place that shows or sums a price goes through this method so
    /// display and totals never disagree.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.active_discount_price().unwrap_or(self.price)
    }

    /// Amount saved per unit (zero without a genuine discount).
    #[must_use]
    pub fn unit_discount(&self) -> Decimal {
        self.active_discount_price()
            .map_or(Decimal::ZERO, |discount| self.price - discount)
    }

    /// Whether the product can cover `quantity` units right now.
    ///
    /// Untracked stock is unlimited.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock
            .is_none_or(|stock| i64::from(stock) >= i64::from(quantity))
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use super::*;

    #[test]
    fn discount_below_price_is_effective() {
        let p = product(1, 100_000, Some(80_000), None);
        assert_eq!(p.effective_price(), Decimal::from(80_000));
        assert_eq!(p.unit_discount(), Decimal::from(20_000));
    }

    #[test]
    fn discount_equal_or_above_price_is_ignored() {
        let equal = product(1, 100_000, Some(100_000), None);
        assert_eq!(equal.effective_price(), Decimal::from(100_000));
        assert_eq!(equal.unit_discount(), Decimal::ZERO);

        let above = product(2, 100_000, Some(120_000), None);
        assert_eq!(above.effective_price(), Decimal::from(100_000));
        assert_eq!(above.unit_discount(), Decimal::ZERO);
    }

    #[test]
    fn missing_discount_uses_list_price() {
        let p = product(1, 50_000, None, None);
        assert_eq!(p.effective_price(), Decimal::from(50_000));
        assert!(p.active_discount_price().is_none());
    }

    #[test]
    fn stock_check_treats_untracked_as_unlimited() {
        assert!(product(1, 1, None, None).has_stock_for(10_000));
        assert!(product(1, 1, None, Some(3)).has_stock_for(3));
        assert!(!product(1, 1, None, Some(3)).has_stock_for(4));
        assert!(!product(1, 1, None, Some(0)).has_stock_for(1));
    }
}
