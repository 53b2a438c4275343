//! Application state shared across handlers.

use std::sync::Arc;

use toko_core::PricingPolicy;

use crate::config::StorefrontConfig;
use crate::db::{PgStorage, Storage};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// storage adapter and configuration. Production uses [`PgStorage`]; tests
/// plug in [`crate::db::MemoryStorage`].
pub struct AppState<S = PgStorage> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    config: StorefrontConfig,
    storage: S,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Storage> AppState<S> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `storage` - Storage adapter for catalog, carts and orders
    #[must_use]
    pub fn new(config: StorefrontConfig, storage: S) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, storage }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the storage adapter.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    /// Get the tax rate and shipping fee applied to carts.
    #[must_use]
    pub fn pricing(&self) -> &PricingPolicy {
        &self.inner.config.pricing
    }
}
