//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart mutations, totals and merge-on-login
//! - `orders` - Order history for the signed-in user
//! - `catalog` - Category browsing
//!
//! Services borrow a storage adapter and are created per request.

pub mod cart;
pub mod catalog;
pub mod orders;

pub use cart::{CartError, CartService, CartSummary, UpdateOutcome};
pub use catalog::{CatalogError, CatalogService, CategoryListing};
pub use orders::{OrderDetail, OrderError, OrderPage, OrderService};
