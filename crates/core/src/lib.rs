//! Toko Core - Shared types library.
//!
//! This crate provides the types and pure logic shared by every Toko
//! component:
//! - `storefront` - Public-facing shop (catalog, cart, order history)
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. Cart ownership resolution and totals live here
//! so they can be tested without a database or a web request.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, amounts, catalog entities and statuses
//! - [`cart`] - Owner keys, line items and the totals calculator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartItem, CartLine, CartTotals, OwnerKey, PricingPolicy, RequestIdentity, SessionKey};
pub use types::*;
