//! In-memory storage adapter.
//!
//! Mirrors the `PostgreSQL` adapter's semantics (one row per owner and
//! product, owner-scoped writes, atomic merge) behind a single async mutex.
//! Used by the test suites and for running the storefront without a
//! database.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use toko_core::{
    CartItem, CartItemId, CartLine, Category, CategoryId, OrderId, OwnerKey, Product, ProductId,
    SessionKey, UserId,
};

use super::{CartStore, CategoryStore, OrderStore, ProductCatalog, RepositoryError, Storage};
use crate::models::order::{Order, OrderItem};

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    categories: BTreeMap<CategoryId, Category>,
    category_products: BTreeSet<(CategoryId, ProductId)>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
    order_items: Vec<OrderItem>,
    next_cart_item_id: i64,
}

/// Sum two quantities, failing like the `INTEGER` column would.
fn checked_quantity(current: u32, added: u32) -> Result<u32, RepositoryError> {
    current
        .checked_add(added)
        .filter(|q| i32::try_from(*q).is_ok())
        .ok_or_else(|| RepositoryError::Conflict("quantity overflow".to_owned()))
}

impl State {
    fn next_cart_item_id(&mut self) -> CartItemId {
        self.next_cart_item_id += 1;
        CartItemId::new(self.next_cart_item_id)
    }

    fn item_for(&self, owner: &OwnerKey, product_id: ProductId) -> Option<CartItemId> {
        self.cart_items
            .values()
            .find(|item| item.owner == *owner && item.product_id == product_id)
            .map(|item| item.id)
    }

    fn insert_or_increment(
        &mut self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: u32,
        created_at: DateTime<Utc>,
    ) -> Result<CartItem, RepositoryError> {
        let now = Utc::now();

        if let Some(id) = self.item_for(owner, product_id)
            && let Some(item) = self.cart_items.get_mut(&id)
        {
            item.quantity = checked_quantity(item.quantity, quantity)?;
            item.updated_at = now;
            return Ok(item.clone());
        }

        let item = CartItem {
            id: self.next_cart_item_id(),
            owner: owner.clone(),
            product_id,
            quantity,
            created_at,
            updated_at: now,
        };
        self.cart_items.insert(item.id, item.clone());
        Ok(item)
    }
}

/// Storage held entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a product.
    pub async fn insert_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    /// Remove a product and every cart row and category link that points
    /// at it, as the foreign key cascades do.
    pub async fn delete_product(&self, id: ProductId) {
        let mut state = self.state.lock().await;
        state.products.remove(&id);
        state.cart_items.retain(|_, item| item.product_id != id);
        state.category_products.retain(|(_, product)| *product != id);
    }

    /// Add or replace a category.
    pub async fn insert_category(&self, category: Category) {
        self.state
            .lock()
            .await
            .categories
            .insert(category.id, category);
    }

    /// File a product under a category. Linking twice is a no-op.
    pub async fn link_category(&self, category: CategoryId, product: ProductId) {
        self.state
            .lock()
            .await
            .category_products
            .insert((category, product));
    }

    /// Add an order together with its items.
    pub async fn insert_order(&self, order: Order, items: Vec<OrderItem>) {
        let mut state = self.state.lock().await;
        state.orders.insert(order.id, order);
        state.order_items.extend(items);
    }

    /// Set the last-modified time of a cart row.
    pub async fn set_item_updated_at(&self, id: CartItemId, updated_at: DateTime<Utc>) {
        if let Some(item) = self.state.lock().await.cart_items.get_mut(&id) {
            item.updated_at = updated_at;
        }
    }
}

impl ProductCatalog for MemoryStorage {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }
}

impl CartStore for MemoryStorage {
    async fn lines(&self, owner: &OwnerKey) -> Result<Vec<CartLine>, RepositoryError> {
        let state = self.state.lock().await;

        let mut lines = state
            .cart_items
            .values()
            .filter(|item| item.owner == *owner)
            .filter_map(|item| {
                state.products.get(&item.product_id).map(|product| CartLine {
                    item: item.clone(),
                    product: product.clone(),
                })
            })
            .collect::<Vec<_>>();

        lines.sort_by(|a, b| {
            b.item
                .created_at
                .cmp(&a.item.created_at)
                .then_with(|| b.item.id.cmp(&a.item.id))
        });
        Ok(lines)
    }

    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self.state.lock().await.cart_items.get(&id).cloned())
    }

    async fn add_quantity(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }
        state.insert_or_increment(owner, product_id, quantity, Utc::now())
    }

    async fn set_quantity(
        &self,
        owner: &OwnerKey,
        id: CartItemId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        match state.cart_items.get_mut(&id) {
            Some(item) if item.owner == *owner => {
                item.quantity = quantity;
                item.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_item(&self, owner: &OwnerKey, id: CartItemId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let owned = state
            .cart_items
            .get(&id)
            .is_some_and(|item| item.owner == *owner);
        if owned {
            state.cart_items.remove(&id);
        }
        Ok(owned)
    }

    async fn clear(&self, owner: &OwnerKey) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let owned = |item: &CartItem| item.owner == *owner;
        let removed = state.cart_items.values().filter(|item| owned(item)).count();
        state.cart_items.retain(|_, item| !owned(item));
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn merge_session_into_user(
        &self,
        session: &SessionKey,
        user: UserId,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let session_owner = OwnerKey::Session(session.clone());
        let user_owner = OwnerKey::User(user);

        let moved = state
            .cart_items
            .values()
            .filter(|item| item.owner == session_owner)
            .cloned()
            .collect::<Vec<_>>();

        // Check every resulting quantity before touching either cart.
        for item in &moved {
            let existing = state
                .item_for(&user_owner, item.product_id)
                .and_then(|id| state.cart_items.get(&id))
                .map_or(0, |row| row.quantity);
            checked_quantity(existing, item.quantity)?;
        }

        for item in &moved {
            state.cart_items.remove(&item.id);
            state.insert_or_increment(&user_owner, item.product_id, item.quantity, item.created_at)?;
        }

        Ok(u64::try_from(moved.len()).unwrap_or(u64::MAX))
    }

    async fn prune_session_items(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let stale =
            |item: &CartItem| matches!(item.owner, OwnerKey::Session(_)) && item.updated_at < cutoff;
        let pruned = state.cart_items.values().filter(|item| stale(item)).count();
        state.cart_items.retain(|_, item| !stale(item));
        Ok(u64::try_from(pruned).unwrap_or(u64::MAX))
    }
}

impl OrderStore for MemoryStorage {
    async fn orders_for_user(
        &self,
        user: UserId,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Order>, u64), RepositoryError> {
        let state = self.state.lock().await;

        let mut orders = state
            .orders
            .values()
            .filter(|order| order.user_id == user)
            .cloned()
            .collect::<Vec<_>>();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = orders.len() as u64;
        let page = orders
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let state = self.state.lock().await;
        let mut items = state
            .order_items
            .iter()
            .filter(|item| item.order_id == id)
            .cloned()
            .collect::<Vec<_>>();
        items.sort_by_key(|item| item.id);
        Ok(items)
    }
}

impl CategoryStore for MemoryStorage {
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let state = self.state.lock().await;
        let mut categories = state.categories.values().cloned().collect::<Vec<_>>();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .values()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn category_products(&self, id: CategoryId) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        let mut products = state
            .category_products
            .iter()
            .filter(|(category, _)| *category == id)
            .filter_map(|(_, product)| state.products.get(product).cloned())
            .collect::<Vec<_>>();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }
}

impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
