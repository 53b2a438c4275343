//! Cart error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
///
/// Every variant except `Repository` is a caller mistake or business-rule
/// rejection and is reported without mutating the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Malformed or missing input, or a product that does not exist.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Cart item does not exist.
    #[error("cart item not found")]
    NotFound,

    /// Cart item exists but belongs to another owner.
    #[error("cart item belongs to another owner")]
    Forbidden,

    /// Requested quantity exceeds tracked stock.
    #[error("not enough stock available ({available} left)")]
    Stock { available: i32 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
