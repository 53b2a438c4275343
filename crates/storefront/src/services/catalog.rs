//! Category browsing service.

use thiserror::Error;
use toko_core::{Category, Product};
use tracing::instrument;

use crate::db::{CategoryStore, RepositoryError};

/// Errors that can occur while browsing categories.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No category has the requested slug.
    #[error("category not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A category together with its products.
#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    /// Products ordered by name.
    pub products: Vec<Product>,
}

/// Category browsing service.
pub struct CatalogService<'a, S> {
    storage: &'a S,
}

impl<'a, S: CategoryStore> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.storage.categories().await?)
    }

    /// A category and its products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no category has `slug`.
    /// Returns `CatalogError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn products(&self, slug: &str) -> Result<CategoryListing, CatalogError> {
        let category = self
            .storage
            .category_by_slug(slug)
            .await?
            .ok_or(CatalogError::NotFound)?;
        let products = self.storage.category_products(category.id).await?;

        Ok(CategoryListing { category, products })
    }
}
