//! Database operations for the storefront.
//!
//! # Database
//!
//! All tables live in the `storefront` schema:
//!
//! - `user` - Accounts owned by the external auth layer (read for ownership only)
//! - `product` - Catalog entries with list price, sale price and stock
//! - `category` / `category_product` - Many-to-many product categories
//! - `cart_item` - Cart rows owned by exactly one user or anonymous session
//! - `order` / `order_item` - Placed orders (read-only here)
//! - `tower_sessions.session` - Tower-sessions storage (created by the CLI)
//!
//! # Storage ports
//!
//! Services depend on the traits below rather than on `PgPool` directly.
//! [`postgres::PgStorage`] is the production adapter and
//! [`memory::MemoryStorage`] backs tests and local demos.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p toko-cli -- migrate
//! ```

pub mod cart_items;
pub mod categories;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod products;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use toko_core::{
    CartItem, CartItemId, CartLine, Category, CategoryId, OrderId, OwnerKey, Product, ProductId,
    SessionKey, UserId,
};

use crate::models::order::{Order, OrderItem};

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Read access to products.
pub trait ProductCatalog: Send + Sync {
    /// Get a product by ID.
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;
}

/// Persistence for cart line items.
///
/// Every method that touches rows for an owner takes the resolved
/// [`OwnerKey`] and scopes its write by it. The store never decides identity.
pub trait CartStore: Send + Sync {
    /// All lines for an owner joined with their products, newest first.
    fn lines(
        &self,
        owner: &OwnerKey,
    ) -> impl Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;

    /// Get a single row by ID regardless of owner.
    fn find_item(
        &self,
        id: CartItemId,
    ) -> impl Future<Output = Result<Option<CartItem>, RepositoryError>> + Send;

    /// Insert a row, or add `quantity` to the existing row for
    /// (owner, product), as one atomic statement.
    fn add_quantity(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<CartItem, RepositoryError>> + Send;

    /// Overwrite the quantity of a row owned by `owner`.
    ///
    /// Returns `false` if no such row exists for that owner.
    fn set_quantity(
        &self,
        owner: &OwnerKey,
        id: CartItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete a row owned by `owner`. Returns `false` if nothing was deleted.
    fn delete_item(
        &self,
        owner: &OwnerKey,
        id: CartItemId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every row owned by `owner`. Returns the number deleted.
    fn clear(&self, owner: &OwnerKey) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Move all rows of an anonymous session into a user's cart, summing
    /// quantities for products already in the user's cart.
    ///
    /// Returns the number of session rows moved. Fails with
    /// `RepositoryError::Conflict`, leaving both carts unchanged, if a summed
    /// quantity would not fit.
    fn merge_session_into_user(
        &self,
        session: &SessionKey,
        user: UserId,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Delete anonymous rows not updated since `cutoff`.
    fn prune_session_items(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Read access to placed orders.
pub trait OrderStore: Send + Sync {
    /// One page of a user's orders, newest first, plus the user's total
    /// order count.
    fn orders_for_user(
        &self,
        user: UserId,
        limit: u32,
        offset: u64,
    ) -> impl Future<Output = Result<(Vec<Order>, u64), RepositoryError>> + Send;

    /// Get an order by ID regardless of owner.
    fn order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Items of an order.
    fn order_items(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Vec<OrderItem>, RepositoryError>> + Send;
}

/// Read access to categories.
pub trait CategoryStore: Send + Sync {
    /// All categories ordered by name.
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    fn category_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Products filed under a category, ordered by name.
    fn category_products(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;
}

/// Everything the storefront needs from storage.
pub trait Storage:
    ProductCatalog + CartStore + OrderStore + CategoryStore + Clone + 'static
{
    /// Check that the backing store is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Convert a stored quantity, rejecting values the schema should forbid.
pub(crate) fn quantity_from_db(quantity: i32) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| RepositoryError::DataCorruption(format!("invalid quantity: {quantity}")))
}

/// Convert a requested quantity to the column type.
pub(crate) fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} is too large")))
}
