//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use toko_core::{Category, Product, display_amount};
use tracing::instrument;

use crate::db::Storage;
use crate::error::AppError;
use crate::filters;
use crate::services::CatalogService;
use crate::state::AppState;

/// Category display data for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            image: category.image.clone(),
        }
    }
}

/// Product card display data for templates.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub price: String,
    /// List price, shown struck through when a discount applies.
    pub list_price: Option<String>,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            image: product.image.clone(),
            price: display_amount(product.effective_price()),
            list_price: product
                .active_discount_price()
                .map(|_| display_amount(product.price)),
            in_stock: product.stock.is_none_or(|stock| stock > 0),
        }
    }
}

/// Category listing template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryView>,
}

/// Category detail template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub category: CategoryView,
    pub products: Vec<ProductCardView>,
}

/// Display all categories.
#[instrument(skip(state))]
pub async fn index<S: Storage>(
    State(state): State<AppState<S>>,
) -> Result<CategoriesIndexTemplate, AppError> {
    let categories = CatalogService::new(state.storage()).categories().await?;

    Ok(CategoriesIndexTemplate {
        categories: categories.iter().map(CategoryView::from).collect(),
    })
}

/// Display a category and its products.
#[instrument(skip(state))]
pub async fn show<S: Storage>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<CategoryShowTemplate, AppError> {
    let listing = CatalogService::new(state.storage()).products(&slug).await?;

    Ok(CategoryShowTemplate {
        category: CategoryView::from(&listing.category),
        products: listing.products.iter().map(ProductCardView::from).collect(),
    })
}
