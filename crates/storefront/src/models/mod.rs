//! Domain models for the storefront.
//!
//! Cart and catalog types are shared through `toko-core`; this module holds
//! the types only the web service needs.

pub mod order;
pub mod session;

pub use order::{Order, OrderItem};
pub use session::{CurrentUser, keys as session_keys};
