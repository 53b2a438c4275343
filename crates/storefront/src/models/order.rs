//! Order domain types.
//!
//! Orders are written by the checkout pipeline, which lives outside this
//! service. The storefront only reads them for order history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use toko_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    /// User who placed the order. Only this user may view it.
    pub user_id: UserId,
    /// Customer-facing order number, e.g. `INV-20250325-0001`.
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether `user` may view this order.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }
}

/// A line of a placed order.
///
/// Name and unit price are snapshots taken at checkout; `product_id` is
/// cleared if the product is later deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
