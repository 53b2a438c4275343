//! Cart line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identity::OwnerKey;
use crate::types::{CartItemId, Product, ProductId};

/// One persisted cart row.
///
/// At most one row exists per (owner, product). `quantity` is always at
/// least one; a row whose quantity would drop to zero is deleted instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub owner: OwnerKey,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Whether `owner` may modify this row.
    ///
    /// Plain equality: no other authorization applies to cart rows.
    #[must_use]
    pub fn is_owned_by(&self, owner: &OwnerKey) -> bool {
        self.owner == *owner
    }
}

/// A cart row joined with its product's current pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.product.effective_price()
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.item.quantity)
    }

    #[must_use]
    pub fn line_discount(&self) -> Decimal {
        self.product.unit_discount() * Decimal::from(self.item.quantity)
    }
}

/// Sum of quantities across lines.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.item.quantity)).sum()
}
