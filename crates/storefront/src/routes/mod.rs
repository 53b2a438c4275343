//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (storage reachable)
//!
//! # Cart (JSON mutations, HTML page)
//! GET  /cart                   - Cart page with totals
//! GET  /cart/count             - Cart count badge
//! POST /cart/add               - Add a product
//! POST /cart/update            - Overwrite a line's quantity (0 removes)
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Remove every line
//!
//! # Orders (requires auth)
//! GET  /orders                 - Order history (?page=N)
//! GET  /orders/{id}            - Order detail
//!
//! # Categories
//! GET  /categories             - Category listing
//! GET  /categories/{slug}      - Category products
//! ```

pub mod cart;
pub mod categories;
pub mod health;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::db::Storage;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes<S: Storage>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(cart::show::<S>))
        .route("/count", get(cart::count::<S>))
        .route("/add", post(cart::add::<S>))
        .route("/update", post(cart::update::<S>))
        .route("/remove", post(cart::remove::<S>))
        .route("/clear", post(cart::clear::<S>))
}

/// Create the order routes router.
pub fn order_routes<S: Storage>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(orders::index::<S>))
        .route("/{id}", get(orders::show::<S>))
}

/// Create the category routes router.
pub fn category_routes<S: Storage>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(categories::index::<S>))
        .route("/{slug}", get(categories::show::<S>))
}

/// Create all routes for the storefront.
pub fn routes<S: Storage>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness::<S>))
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/categories", category_routes())
}
