//! Cart identity, line items and totals.
//!
//! Everything here is pure: no storage, no request state. Callers pass the
//! resolved [`OwnerKey`] and the lines they loaded.

pub mod identity;
pub mod line;
pub mod totals;

pub use identity::{OwnerKey, RequestIdentity, SessionKey, SessionKeyError};
pub use line::{CartItem, CartLine, item_count};
pub use totals::{CartTotals, PricingPolicy, subtotal};
