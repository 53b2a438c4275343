//! Cart route handlers.
//!
//! The cart page is server-rendered; mutations are JSON endpoints called from
//! the page script. Every handler resolves the cart owner through
//! [`CartOwner`] and passes it to [`CartService`] explicitly.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use toko_core::{CartItemId, CartLine, ProductId, display_amount, format_amount};
use tracing::instrument;

use crate::db::Storage;
use crate::error::AppError;
use crate::filters;
use crate::middleware::CartOwner;
use crate::services::{CartError, CartService, CartSummary};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    /// List price, shown struck through when a discount applies.
    pub list_price: Option<String>,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.item.id.as_i64(),
            name: line.product.name.clone(),
            slug: line.product.slug.clone(),
            image: line.product.image.clone(),
            quantity: line.item.quantity,
            unit_price: display_amount(line.unit_price()),
            list_price: line
                .product
                .active_discount_price()
                .map(|_| display_amount(line.product.price)),
            line_total: display_amount(line.line_total()),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u64,
    pub subtotal: String,
    pub discount: String,
    pub has_discount: bool,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl From<&CartSummary> for CartView {
    fn from(summary: &CartSummary) -> Self {
        let totals = &summary.totals;
        Self {
            lines: summary.lines.iter().map(CartLineView::from).collect(),
            item_count: summary.item_count,
            subtotal: display_amount(totals.subtotal),
            discount: display_amount(totals.discount),
            has_discount: !totals.discount.is_zero(),
            shipping: display_amount(totals.shipping),
            tax: display_amount(totals.tax),
            total: display_amount(totals.total),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub signed_in: bool,
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Update cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub cart_item_id: CartItemId,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub cart_item_id: CartItemId,
}

/// Successful cart mutation.
#[derive(Debug, Serialize)]
pub struct CartActionResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_count: Option<u64>,
    /// Cart subtotal formatted with `.` thousands separators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<String>,
}

impl CartActionResponse {
    const fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
            cart_count: None,
            subtotal: None,
        }
    }

    const fn with_count(mut self, cart_count: u64) -> Self {
        self.cart_count = Some(cart_count);
        self
    }
}

/// Cart badge count.
#[derive(Debug, Serialize)]
pub struct CartCountResponse {
    pub cart_count: u64,
}

/// Failed cart mutation body.
#[derive(Debug, Serialize)]
struct CartErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_stock: Option<i32>,
}

impl CartErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            available_stock: None,
        }
    }
}

/// Error returned by the JSON cart endpoints.
#[derive(Debug)]
pub enum CartApiError {
    /// Body is missing, malformed or has the wrong field types.
    Payload(JsonRejection),
    /// The cart operation was rejected or failed.
    Cart(CartError),
}

impl From<CartError> for CartApiError {
    fn from(err: CartError) -> Self {
        Self::Cart(err)
    }
}

impl From<JsonRejection> for CartApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Payload(rejection)
    }
}

impl IntoResponse for CartApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Payload(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                CartErrorBody::new(rejection.body_text()),
            ),
            Self::Cart(CartError::Validation(message)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, CartErrorBody::new(message))
            }
            Self::Cart(CartError::Stock { available }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                CartErrorBody {
                    available_stock: Some(available),
                    ..CartErrorBody::new("Not enough stock available")
                },
            ),
            Self::Cart(CartError::NotFound) => {
                (StatusCode::NOT_FOUND, CartErrorBody::new("Cart item not found"))
            }
            Self::Cart(CartError::Forbidden) => {
                (StatusCode::FORBIDDEN, CartErrorBody::new("Unauthorized"))
            }
            Self::Cart(CartError::Repository(e)) => {
                return AppError::Database(e).into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, owner))]
pub async fn show<S: Storage>(
    State(state): State<AppState<S>>,
    owner: CartOwner,
) -> Result<CartShowTemplate, AppError> {
    let summary = CartService::new(state.storage(), state.pricing())
        .summary(&owner.owner_key())
        .await?;

    Ok(CartShowTemplate {
        cart: CartView::from(&summary),
        signed_in: owner.0.user.is_some(),
    })
}

/// Cart count badge.
#[instrument(skip(state, owner))]
pub async fn count<S: Storage>(
    State(state): State<AppState<S>>,
    owner: CartOwner,
) -> Result<Json<CartCountResponse>, CartApiError> {
    let cart_count = CartService::new(state.storage(), state.pricing())
        .item_count(&owner.owner_key())
        .await?;

    Ok(Json(CartCountResponse { cart_count }))
}

/// Add a product to the cart.
#[instrument(skip(state, owner, payload))]
pub async fn add<S: Storage>(
    State(state): State<AppState<S>>,
    owner: CartOwner,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Json<CartActionResponse>, CartApiError> {
    let Json(request) = payload?;

    let cart_count = CartService::new(state.storage(), state.pricing())
        .add(&owner.owner_key(), request.product_id, request.quantity)
        .await?;
    tracing::info!(
        product_id = %request.product_id,
        quantity = request.quantity,
        cart_count,
        "Added to cart"
    );

    Ok(Json(
        CartActionResponse::ok("Product added to cart successfully").with_count(cart_count),
    ))
}

/// Overwrite a line's quantity. Zero removes the line.
#[instrument(skip(state, owner, payload))]
pub async fn update<S: Storage>(
    State(state): State<AppState<S>>,
    owner: CartOwner,
    payload: Result<Json<UpdateCartRequest>, JsonRejection>,
) -> Result<Json<CartActionResponse>, CartApiError> {
    let Json(request) = payload?;

    let outcome = CartService::new(state.storage(), state.pricing())
        .update(&owner.owner_key(), request.cart_item_id, request.quantity)
        .await?;
    tracing::info!(
        cart_item_id = %request.cart_item_id,
        quantity = request.quantity,
        cart_count = outcome.item_count,
        "Cart line updated"
    );

    let message = if outcome.removed {
        "Item removed from cart"
    } else {
        "Cart updated successfully"
    };

    Ok(Json(CartActionResponse {
        subtotal: Some(format_amount(outcome.subtotal)),
        ..CartActionResponse::ok(message).with_count(outcome.item_count)
    }))
}

/// Remove a line from the cart.
#[instrument(skip(state, owner, payload))]
pub async fn remove<S: Storage>(
    State(state): State<AppState<S>>,
    owner: CartOwner,
    payload: Result<Json<RemoveFromCartRequest>, JsonRejection>,
) -> Result<Json<CartActionResponse>, CartApiError> {
    let Json(request) = payload?;

    let cart_count = CartService::new(state.storage(), state.pricing())
        .remove(&owner.owner_key(), request.cart_item_id)
        .await?;
    tracing::info!(cart_item_id = %request.cart_item_id, cart_count, "Cart line removed");

    Ok(Json(
        CartActionResponse::ok("Item removed from cart").with_count(cart_count),
    ))
}

/// Remove every line from the cart.
#[instrument(skip(state, owner))]
pub async fn clear<S: Storage>(
    State(state): State<AppState<S>>,
    owner: CartOwner,
) -> Result<Json<CartActionResponse>, CartApiError> {
    CartService::new(state.storage(), state.pricing())
        .clear(&owner.owner_key())
        .await?;

    Ok(Json(CartActionResponse::ok("Cart cleared successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_response_omits_absent_fields() {
        let body = serde_json::to_value(CartActionResponse::ok("Cart cleared successfully"))
            .unwrap_or_default();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "message": "Cart cleared successfully"})
        );
    }

    #[test]
    fn test_error_statuses() {
        fn status(err: CartError) -> StatusCode {
            CartApiError::from(err).into_response().status()
        }

        assert_eq!(
            status(CartError::Validation("bad".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(CartError::Stock { available: 2 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(CartError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(CartError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status(CartError::Repository(crate::db::RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
