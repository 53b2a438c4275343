//! Integration tests for Toko.
//!
//! Tests drive the real storefront router with `tower::ServiceExt::oneshot`,
//! backed by [`MemoryStorage`] and an in-memory session store, so they run
//! without a database or a listening socket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p toko-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_cart` - Cart endpoints, ownership and merge-on-login
//! - `storefront_pages` - Order history, categories and health checks

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    routing::post,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use toko_core::{PricingPolicy, Product, ProductId, UserId};
use toko_storefront::config::StorefrontConfig;
use toko_storefront::db::MemoryStorage;
use toko_storefront::middleware::{sign_in, sign_out};
use toko_storefront::models::CurrentUser;
use toko_storefront::routes;
use toko_storefront::state::AppState;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

/// Path of the test-only sign-in route.
const SIGN_IN_PATH: &str = "/test/sign-in";

/// Path of the test-only sign-out route.
const SIGN_OUT_PATH: &str = "/test/sign-out";

/// Storefront configuration for tests.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused".to_string()),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        pricing: PricingPolicy::default(),
        orders_per_page: 2,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A catalog product for tests.
#[must_use]
pub fn product(id: i64, price: i64, discount: Option<i64>, stock: Option<i32>) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        description: None,
        price: Decimal::from(price),
        discount_price: discount.map(Decimal::from),
        stock,
        image: None,
        created_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

#[derive(Deserialize)]
struct SignInRequest {
    id: UserId,
    name: String,
}

/// Stand-in for the external auth layer.
async fn test_sign_in(
    State(state): State<AppState<MemoryStorage>>,
    session: Session,
    Json(request): Json<SignInRequest>,
) -> Result<Json<Value>, toko_storefront::error::AppError> {
    let user = CurrentUser {
        id: request.id,
        name: request.name,
    };
    let merged = sign_in(&session, &state, &user).await?;
    Ok(Json(serde_json::json!({ "merged": merged })))
}

async fn test_sign_out(session: Session) -> Result<StatusCode, toko_storefront::error::AppError> {
    sign_out(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Response captured from the router.
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The body as UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

/// One browser talking to the storefront.
///
/// Keeps the session cookie between requests like a browser would.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// Send a request, with a JSON body if given.
    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            location,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Sign in as `user` through the test-only auth route.
    pub async fn sign_in(&mut self, user: i64, name: &str) -> u64 {
        let response = self
            .post(SIGN_IN_PATH, serde_json::json!({ "id": user, "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()["merged"].as_u64().unwrap()
    }

    /// Sign out through the test-only auth route.
    pub async fn sign_out(&mut self) {
        let response = self.send(Method::POST, SIGN_OUT_PATH, None).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    /// Cart line IDs shown on the cart page, newest first.
    pub async fn cart_item_ids(&mut self) -> Vec<i64> {
        let html = self.get("/cart").await.text();
        html.split("data-cart-item=\"")
            .skip(1)
            .map(|rest| rest.split('"').next().unwrap().parse().unwrap())
            .collect()
    }
}

/// A storefront backed by in-memory storage and sessions.
pub struct TestApp {
    pub storage: MemoryStorage,
    router: Router,
}

impl TestApp {
    /// Build the full storefront stack with an empty store.
    #[must_use]
    pub fn new() -> Self {
        let storage = MemoryStorage::new();
        let state = AppState::new(test_config(), storage.clone());
        let routes = routes::routes()
            .route(SIGN_IN_PATH, post(test_sign_in))
            .route(SIGN_OUT_PATH, post(test_sign_out));
        let router = toko_storefront::build_app(routes, state, MemoryStore::default());

        Self { storage, router }
    }

    /// Build the stack with a small catalog:
    ///
    /// - product 1: 100000, on sale for 80000, 10 in stock
    /// - product 2: 25000, stock not tracked
    /// - product 3: 50000, 2 in stock
    pub async fn with_catalog() -> Self {
        let app = Self::new();
        app.storage
            .insert_product(product(1, 100_000, Some(80_000), Some(10)))
            .await;
        app.storage.insert_product(product(2, 25_000, None, None)).await;
        app.storage
            .insert_product(product(3, 50_000, None, Some(2)))
            .await;
        app
    }

    /// A new browser with no cookies.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
