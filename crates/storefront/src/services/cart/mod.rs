//! Cart service.
//!
//! Applies ownership-checked mutations to the cart store and reports fresh
//! aggregates. Callers pass an already resolved [`OwnerKey`]; nothing here
//! reads request or session state.

mod error;

pub use error::CartError;

use rust_decimal::Decimal;
use toko_core::{
    CartItemId, CartLine, CartTotals, OwnerKey, PricingPolicy, ProductId, cart,
};
use tracing::instrument;

use crate::db::{CartStore, ProductCatalog, RepositoryError};

/// A cart as shown on the cart page.
#[derive(Debug, Clone)]
pub struct CartSummary {
    /// Lines, most recently added first.
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    /// Sum of quantities.
    pub item_count: u64,
}

/// Result of updating a line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Whether the update removed the line (quantity zero).
    pub removed: bool,
    pub item_count: u64,
    pub subtotal: Decimal,
}

/// Cart service.
pub struct CartService<'a, S> {
    storage: &'a S,
    pricing: &'a PricingPolicy,
}

impl<'a, S> CartService<'a, S>
where
    S: CartStore + ProductCatalog,
{
    /// Create a new cart service.
    #[must_use]
    pub const fn new(storage: &'a S, pricing: &'a PricingPolicy) -> Self {
        Self { storage, pricing }
    }

    /// Load the owner's cart with totals.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self), fields(owner = owner.kind()))]
    pub async fn summary(&self, owner: &OwnerKey) -> Result<CartSummary, CartError> {
        let lines = self.storage.lines(owner).await?;
        let totals = CartTotals::compute(&lines, self.pricing);
        let item_count = cart::item_count(&lines);

        Ok(CartSummary {
            lines,
            totals,
            item_count,
        })
    }

    /// Sum of quantities in the owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self), fields(owner = owner.kind()))]
    pub async fn item_count(&self, owner: &OwnerKey) -> Result<u64, CartError> {
        let lines = self.storage.lines(owner).await?;
        Ok(cart::item_count(&lines))
    }

    /// Add `quantity` units of a product to the owner's cart.
    ///
    /// Repeat adds accumulate into the existing line. Returns the owner's
    /// new item count.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` if `quantity < 1` or the product does not exist.
    /// Returns `CartError::Stock` if the product tracks stock and has fewer units than requested.
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self), fields(owner = owner.kind()))]
    pub async fn add(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<u64, CartError> {
        let quantity = positive_quantity(quantity)?;

        let product = self
            .storage
            .product(product_id)
            .await?
            .ok_or_else(|| CartError::Validation("The selected product is invalid.".to_owned()))?;

        if !product.has_stock_for(quantity) {
            let available = product.stock.unwrap_or_default();
            tracing::info!(%product_id, quantity, available, "Add rejected: insufficient stock");
            return Err(CartError::Stock { available });
        }

        let item = self
            .storage
            .add_quantity(owner, product_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    CartError::Validation("The selected product is invalid.".to_owned())
                }
                RepositoryError::Conflict(msg) => CartError::Validation(msg),
                other => CartError::Repository(other),
            })?;
        tracing::debug!(cart_item_id = %item.id, quantity = item.quantity, "Cart line saved");

        self.item_count(owner).await
    }

    /// Overwrite a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` if `quantity < 0`.
    /// Returns `CartError::NotFound` if the line does not exist.
    /// Returns `CartError::Forbidden` if the line belongs to another owner.
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self), fields(owner = owner.kind()))]
    pub async fn update(
        &self,
        owner: &OwnerKey,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<UpdateOutcome, CartError> {
        if quantity < 0 {
            return Err(CartError::Validation(
                "The quantity must be at least 0.".to_owned(),
            ));
        }
        self.authorize(owner, item_id).await?;

        let removed = quantity == 0;
        let applied = if removed {
            self.storage.delete_item(owner, item_id).await?
        } else {
            let quantity = u32::try_from(quantity).map_err(|_| {
                CartError::Validation(format!("The quantity {quantity} is too large."))
            })?;
            self.storage
                .set_quantity(owner, item_id, quantity)
                .await
                .map_err(|e| match e {
                    RepositoryError::Conflict(msg) => CartError::Validation(msg),
                    other => CartError::Repository(other),
                })?
        };
        if !applied {
            return Err(CartError::NotFound);
        }

        let lines = self.storage.lines(owner).await?;
        Ok(UpdateOutcome {
            removed,
            item_count: cart::item_count(&lines),
            subtotal: cart::subtotal(&lines),
        })
    }

    /// Remove a line from the owner's cart. Returns the new item count.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the line does not exist.
    /// Returns `CartError::Forbidden` if the line belongs to another owner.
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self), fields(owner = owner.kind()))]
    pub async fn remove(&self, owner: &OwnerKey, item_id: CartItemId) -> Result<u64, CartError> {
        self.authorize(owner, item_id).await?;

        if !self.storage.delete_item(owner, item_id).await? {
            return Err(CartError::NotFound);
        }

        self.item_count(owner).await
    }

    /// Remove every line owned by `owner`. Clearing an empty cart succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self), fields(owner = owner.kind()))]
    pub async fn clear(&self, owner: &OwnerKey) -> Result<u64, CartError> {
        let deleted = self.storage.clear(owner).await?;
        tracing::debug!(deleted, "Cart cleared");
        Ok(deleted)
    }

    /// Fold an anonymous session's cart into a user's cart after login.
    ///
    /// Quantities of products present in both carts are summed. The session
    /// cart is left empty, so calling this twice moves nothing the second
    /// time. Returns the number of lines moved.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` unless `from` is a session owner and `into` a user owner,
    /// or if a summed quantity would be too large (nothing is moved).
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self), fields(from = from.kind(), into = into.kind()))]
    pub async fn merge_on_login(&self, from: &OwnerKey, into: &OwnerKey) -> Result<u64, CartError> {
        let (OwnerKey::Session(session), OwnerKey::User(user)) = (from, into) else {
            return Err(CartError::Validation(
                "carts can only be merged from a session into a user".to_owned(),
            ));
        };

        let moved = self
            .storage
            .merge_session_into_user(session, *user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => CartError::Validation(msg),
                other => CartError::Repository(other),
            })?;
        if moved > 0 {
            tracing::info!(user_id = %user, moved, "Merged anonymous cart into user cart");
        }
        Ok(moved)
    }

    /// Check that `item_id` exists and belongs to `owner`.
    async fn authorize(&self, owner: &OwnerKey, item_id: CartItemId) -> Result<(), CartError> {
        let item = self
            .storage
            .find_item(item_id)
            .await?
            .ok_or(CartError::NotFound)?;

        if !item.is_owned_by(owner) {
            tracing::warn!(cart_item_id = %item_id, "Rejected cart access by non-owner");
            return Err(CartError::Forbidden);
        }
        Ok(())
    }
}

/// Validate a quantity for adding to the cart.
fn positive_quantity(quantity: i64) -> Result<u32, CartError> {
    if quantity < 1 {
        return Err(CartError::Validation(
            "The quantity must be at least 1.".to_owned(),
        ));
    }
    u32::try_from(quantity)
        .ok()
        .filter(|q| i32::try_from(*q).is_ok())
        .ok_or_else(|| CartError::Validation(format!("The quantity {quantity} is too large.")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use toko_core::{Product, SessionKey, UserId};

    use super::*;
    use crate::db::MemoryStorage;

    fn product(id: i64, price: i64, discount: Option<i64>, stock: Option<i32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: None,
            price: Decimal::from(price),
            discount_price: discount.map(Decimal::from),
            stock,
            image: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    async fn storage_with(products: Vec<Product>) -> MemoryStorage {
        let storage = MemoryStorage::new();
        for p in products {
            storage.insert_product(p).await;
        }
        storage
    }

    fn session(key: &str) -> OwnerKey {
        OwnerKey::Session(SessionKey::parse(key).unwrap())
    }

    #[tokio::test]
    async fn test_repeat_adds_accumulate_into_one_line() {
        let storage = storage_with(vec![product(1, 10_000, None, None)]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");

        assert_eq!(service.add(&owner, ProductId::new(1), 2).await.unwrap(), 2);
        assert_eq!(service.add(&owner, ProductId::new(1), 3).await.unwrap(), 5);

        let summary = service.summary(&owner).await.unwrap();
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].item.quantity, 5);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_quantity_and_unknown_product() {
        let storage = storage_with(vec![product(1, 10_000, None, None)]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");

        assert!(matches!(
            service.add(&owner, ProductId::new(1), 0).await,
            Err(CartError::Validation(_))
        ));
        assert!(matches!(
            service.add(&owner, ProductId::new(1), -3).await,
            Err(CartError::Validation(_))
        ));
        assert!(matches!(
            service.add(&owner, ProductId::new(99), 1).await,
            Err(CartError::Validation(_))
        ));
        assert!(service.summary(&owner).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_add_beyond_stock_reports_available_and_does_not_mutate() {
        let storage = storage_with(vec![product(1, 10_000, None, Some(3))]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");

        service.add(&owner, ProductId::new(1), 1).await.unwrap();
        let err = service.add(&owner, ProductId::new(1), 4).await.unwrap_err();
        assert!(matches!(err, CartError::Stock { available: 3 }));

        let summary = service.summary(&owner).await.unwrap();
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].item.quantity, 1);
    }

    #[tokio::test]
    async fn test_update_to_zero_and_remove_reach_same_state() {
        let storage = storage_with(vec![
            product(1, 10_000, None, None),
            product(2, 20_000, None, None),
        ])
        .await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = OwnerKey::User(UserId::new(1));

        service.add(&owner, ProductId::new(1), 1).await.unwrap();
        service.add(&owner, ProductId::new(2), 1).await.unwrap();
        let lines = service.summary(&owner).await.unwrap().lines;
        let first = lines.iter().find(|l| l.product.id == ProductId::new(1)).unwrap();
        let second = lines.iter().find(|l| l.product.id == ProductId::new(2)).unwrap();

        let outcome = service.update(&owner, first.item.id, 0).await.unwrap();
        assert!(outcome.removed);
        assert_eq!(outcome.item_count, 1);
        assert_eq!(outcome.subtotal, Decimal::from(20_000));

        assert_eq!(service.remove(&owner, second.item.id).await.unwrap(), 0);
        assert!(service.summary(&owner).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_update_overwrites_quantity_and_reports_subtotal() {
        let storage = storage_with(vec![product(1, 100_000, Some(80_000), None)]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");

        service.add(&owner, ProductId::new(1), 5).await.unwrap();
        let id = service.summary(&owner).await.unwrap().lines[0].item.id;

        let outcome = service.update(&owner, id, 2).await.unwrap();
        assert!(!outcome.removed);
        assert_eq!(outcome.item_count, 2);
        assert_eq!(outcome.subtotal, Decimal::from(160_000));
    }

    #[tokio::test]
    async fn test_cross_owner_update_and_remove_are_forbidden() {
        let storage = storage_with(vec![product(1, 10_000, None, None)]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let alice = OwnerKey::User(UserId::new(1));
        let bob = OwnerKey::User(UserId::new(2));
        let anon = session("1");

        service.add(&alice, ProductId::new(1), 2).await.unwrap();
        let id = service.summary(&alice).await.unwrap().lines[0].item.id;

        for intruder in [&bob, &anon] {
            assert!(matches!(
                service.update(intruder, id, 7).await,
                Err(CartError::Forbidden)
            ));
            assert!(matches!(
                service.remove(intruder, id).await,
                Err(CartError::Forbidden)
            ));
        }

        let lines = service.summary(&alice).await.unwrap().lines;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.quantity, 2);
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let storage = storage_with(vec![]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");

        assert!(matches!(
            service.update(&owner, CartItemId::new(42), 1).await,
            Err(CartError::NotFound)
        ));
        assert!(matches!(
            service.remove(&owner, CartItemId::new(42)).await,
            Err(CartError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent_and_scoped_to_owner() {
        let storage = storage_with(vec![product(1, 10_000, None, None)]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");
        let other = session("anon-2");

        service.add(&owner, ProductId::new(1), 2).await.unwrap();
        service.add(&other, ProductId::new(1), 1).await.unwrap();

        assert_eq!(service.clear(&owner).await.unwrap(), 1);
        assert_eq!(service.clear(&owner).await.unwrap(), 0);
        assert!(service.summary(&owner).await.unwrap().lines.is_empty());
        assert_eq!(service.item_count(&other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_summary_lists_newest_first_with_totals() {
        let storage = storage_with(vec![
            product(1, 100_000, Some(80_000), None),
            product(2, 5_000, None, None),
        ])
        .await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");

        service.add(&owner, ProductId::new(1), 2).await.unwrap();
        service.add(&owner, ProductId::new(2), 1).await.unwrap();

        let summary = service.summary(&owner).await.unwrap();
        assert_eq!(summary.lines[0].product.id, ProductId::new(2));
        assert_eq!(summary.lines[1].product.id, ProductId::new(1));
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.totals.subtotal, Decimal::from(165_000));
        assert_eq!(summary.totals.discount, Decimal::from(40_000));
        assert_eq!(summary.totals.tax, Decimal::from(18_150));
        assert_eq!(summary.totals.total, Decimal::from(153_150));
    }

    #[tokio::test]
    async fn test_merge_on_login_sums_conflicts_and_empties_session() {
        let storage = storage_with(vec![
            product(1, 10_000, None, None),
            product(2, 20_000, None, None),
        ])
        .await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let anon = session("anon-1");
        let user = OwnerKey::User(UserId::new(9));

        service.add(&anon, ProductId::new(1), 2).await.unwrap();
        service.add(&anon, ProductId::new(2), 1).await.unwrap();
        service.add(&user, ProductId::new(1), 3).await.unwrap();

        assert_eq!(service.merge_on_login(&anon, &user).await.unwrap(), 2);
        assert_eq!(service.merge_on_login(&anon, &user).await.unwrap(), 0);

        assert!(service.summary(&anon).await.unwrap().lines.is_empty());
        let lines = service.summary(&user).await.unwrap().lines;
        assert_eq!(lines.len(), 2);
        let merged = lines.iter().find(|l| l.product.id == ProductId::new(1)).unwrap();
        assert_eq!(merged.item.quantity, 5);
        assert!(merged.item.is_owned_by(&user));
    }

    #[tokio::test]
    async fn test_merge_overflow_is_rejected_without_moving_lines() {
        let storage = storage_with(vec![
            product(1, 10_000, None, None),
            product(2, 20_000, None, None),
        ])
        .await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let anon = session("anon-1");
        let user = OwnerKey::User(UserId::new(9));

        service.add(&user, ProductId::new(1), 2_000_000_000).await.unwrap();
        service.add(&anon, ProductId::new(2), 1).await.unwrap();
        service.add(&anon, ProductId::new(1), 2_000_000_000).await.unwrap();

        assert!(matches!(
            service.merge_on_login(&anon, &user).await,
            Err(CartError::Validation(_))
        ));
        assert_eq!(service.item_count(&anon).await.unwrap(), 2_000_000_001);
        assert_eq!(service.item_count(&user).await.unwrap(), 2_000_000_000);
    }

    #[tokio::test]
    async fn test_add_overflow_is_a_validation_error() {
        let storage = storage_with(vec![product(1, 10_000, None, None)]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let owner = session("anon-1");

        service.add(&owner, ProductId::new(1), 2_000_000_000).await.unwrap();
        assert!(matches!(
            service.add(&owner, ProductId::new(1), 200_000_000).await,
            Err(CartError::Validation(_))
        ));
        assert_eq!(service.item_count(&owner).await.unwrap(), 2_000_000_000);
    }

    #[tokio::test]
    async fn test_merge_rejects_wrong_owner_kinds() {
        let storage = storage_with(vec![]).await;
        let pricing = PricingPolicy::default();
        let service = CartService::new(&storage, &pricing);
        let user = OwnerKey::User(UserId::new(1));

        assert!(matches!(
            service.merge_on_login(&user, &session("anon")).await,
            Err(CartError::Validation(_))
        ));
    }
}
