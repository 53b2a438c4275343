//! Core types for the Toko storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod id;
pub mod money;
pub mod status;

pub use catalog::{Category, Product};
pub use id::*;
pub use money::{display_amount, format_amount, round_to_unit};
pub use status::OrderStatus;
