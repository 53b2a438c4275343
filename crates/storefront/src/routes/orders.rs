//! Order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use toko_core::{OrderId, display_amount};
use tracing::instrument;

use crate::db::Storage;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderItem};
use crate::services::{OrderDetail, OrderPage, OrderService};
use crate::state::AppState;

/// Order summary display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i64,
    pub order_number: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub placed_on: String,
    pub subtotal: String,
    pub discount: String,
    pub has_discount: bool,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i64(),
            order_number: order.order_number.clone(),
            status: order.status.label(),
            status_class: order.status.as_str(),
            placed_on: order.created_at.format("%d %b %Y").to_string(),
            subtotal: display_amount(order.subtotal),
            discount: display_amount(order.discount),
            has_discount: !order.discount.is_zero(),
            shipping: display_amount(order.shipping),
            tax: display_amount(order.tax),
            total: display_amount(order.total),
        }
    }
}

/// Order line display data for templates.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: display_amount(item.unit_price),
            line_total: display_amount(item.line_total()),
        }
    }
}

/// Order history query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<u32>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderView>,
    pub page: u32,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl From<&OrderPage> for OrdersIndexTemplate {
    fn from(page: &OrderPage) -> Self {
        Self {
            orders: page.orders.iter().map(OrderView::from).collect(),
            page: page.page,
            total_pages: page.total_pages(),
            has_previous: page.has_previous(),
            has_next: page.has_next(),
        }
    }
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

impl From<&OrderDetail> for OrderShowTemplate {
    fn from(detail: &OrderDetail) -> Self {
        Self {
            order: OrderView::from(&detail.order),
            items: detail.items.iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Display the signed-in user's order history.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index<S: Storage>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate, AppError> {
    let page = OrderService::new(state.storage(), state.config().orders_per_page)
        .list(user.id, query.page.unwrap_or(1))
        .await?;

    Ok(OrdersIndexTemplate::from(&page))
}

/// Display one order. Only its owner may view it.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show<S: Storage>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<OrderShowTemplate, AppError> {
    let detail = OrderService::new(state.storage(), state.config().orders_per_page)
        .show(user.id, id)
        .await?;

    Ok(OrderShowTemplate::from(&detail))
}
