//! Order history service.

use thiserror::Error;
use toko_core::{OrderId, UserId};
use tracing::instrument;

use crate::db::{OrderStore, RepositoryError};
use crate::models::{Order, OrderItem};

/// Errors that can occur while reading order history.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order does not exist.
    #[error("order not found")]
    NotFound,

    /// Order exists but was placed by another user.
    #[error("order belongs to another user")]
    Forbidden,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One page of a user's orders.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    /// Total orders across all pages.
    pub total: u64,
}

impl OrderPage {
    /// Number of pages, at least 1.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page.max(1))).max(1)
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}

/// An order with its line items.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order history service.
pub struct OrderService<'a, S> {
    storage: &'a S,
    per_page: u32,
}

impl<'a, S: OrderStore> OrderService<'a, S> {
    /// Create a new order service returning `per_page` orders per page.
    #[must_use]
    pub fn new(storage: &'a S, per_page: u32) -> Self {
        Self {
            storage,
            per_page: per_page.max(1),
        }
    }

    /// List one page of the user's orders, newest first.
    ///
    /// Page numbers below 1 are treated as 1.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the store fails.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn list(&self, user: UserId, page: u32) -> Result<OrderPage, OrderError> {
        let page = page.max(1);
        let offset = u64::from(page - 1) * u64::from(self.per_page);

        let (orders, total) = self
            .storage
            .orders_for_user(user, self.per_page, offset)
            .await?;

        Ok(OrderPage {
            orders,
            page,
            per_page: self.per_page,
            total,
        })
    }

    /// Show one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    /// Returns `OrderError::Forbidden` if the order belongs to another user.
    /// Returns `OrderError::Repository` if the store fails.
    #[instrument(skip(self), fields(user_id = %user, order_id = %id))]
    pub async fn show(&self, user: UserId, id: OrderId) -> Result<OrderDetail, OrderError> {
        let order = self.storage.order(id).await?.ok_or(OrderError::NotFound)?;

        if !order.is_owned_by(user) {
            tracing::warn!("Rejected order access by non-owner");
            return Err(OrderError::Forbidden);
        }

        let items = self.storage.order_items(id).await?;
        Ok(OrderDetail { order, items })
    }
}
