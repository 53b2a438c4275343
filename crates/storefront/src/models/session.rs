//! Session-related types.
//!
//! Types stored in the server-side session.

use serde::{Deserialize, Serialize};

use toko_core::UserId;

/// Session-stored user identity.
///
/// Written by the external auth layer through
/// [`crate::middleware::auth::sign_in`]; the storefront only reads the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Display name shown in the header.
    pub name: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous cart owner key of this browsing session.
    pub const CART_SESSION_KEY: &str = "cart_session_key";
}
