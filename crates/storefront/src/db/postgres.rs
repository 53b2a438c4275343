//! `PostgreSQL` storage adapter.
//!
//! Implements the storage ports by delegating to the per-table repositories.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use toko_core::{
    CartItem, CartItemId, CartLine, Category, CategoryId, OrderId, OwnerKey, Product, ProductId,
    SessionKey, UserId,
};

use super::cart_items::CartItemRepository;
use super::categories::CategoryRepository;
use super::orders::OrderRepository;
use super::products::ProductRepository;
use super::{CartStore, CategoryStore, OrderStore, ProductCatalog, RepositoryError, Storage};
use crate::models::order::{Order, OrderItem};

/// Storage backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ProductCatalog for PgStorage {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }
}

impl CartStore for PgStorage {
    async fn lines(&self, owner: &OwnerKey) -> Result<Vec<CartLine>, RepositoryError> {
        CartItemRepository::new(&self.pool).lines(owner).await
    }

    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        CartItemRepository::new(&self.pool).get_by_id(id).await
    }

    async fn add_quantity(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError> {
        CartItemRepository::new(&self.pool)
            .upsert_increment(owner, product_id, quantity)
            .await
    }

    async fn set_quantity(
        &self,
        owner: &OwnerKey,
        id: CartItemId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        CartItemRepository::new(&self.pool)
            .set_quantity(owner, id, quantity)
            .await
    }

    async fn delete_item(&self, owner: &OwnerKey, id: CartItemId) -> Result<bool, RepositoryError> {
        CartItemRepository::new(&self.pool).delete(owner, id).await
    }

    async fn clear(&self, owner: &OwnerKey) -> Result<u64, RepositoryError> {
        CartItemRepository::new(&self.pool).delete_all(owner).await
    }

    async fn merge_session_into_user(
        &self,
        session: &SessionKey,
        user: UserId,
    ) -> Result<u64, RepositoryError> {
        CartItemRepository::new(&self.pool)
            .merge_session_into_user(session, user)
            .await
    }

    async fn prune_session_items(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        CartItemRepository::new(&self.pool)
            .prune_sessions(cutoff)
            .await
    }
}

impl OrderStore for PgStorage {
    async fn orders_for_user(
        &self,
        user: UserId,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Order>, u64), RepositoryError> {
        let repo = OrderRepository::new(&self.pool);
        let orders = repo.list_for_user(user, limit, offset).await?;
        let total = repo.count_for_user(user).await?;
        Ok((orders, total))
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_id(id).await
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        OrderRepository::new(&self.pool).items(id).await
    }
}

impl CategoryStore for PgStorage {
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        CategoryRepository::new(&self.pool).list().await
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        CategoryRepository::new(&self.pool).get_by_slug(slug).await
    }

    async fn category_products(&self, id: CategoryId) -> Result<Vec<Product>, RepositoryError> {
        CategoryRepository::new(&self.pool).products(id).await
    }
}

impl Storage for PgStorage {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
