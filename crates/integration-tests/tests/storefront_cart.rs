//! Integration tests for the cart endpoints.
//!
//! Each test builds the full router over in-memory storage and drives it the
//! way the cart page script does.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use toko_integration_tests::TestApp;

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_anonymous_add_accumulates_quantity() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    let response = browser
        .post("/cart/add", json!({"product_id": 1, "quantity": 2}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({
            "success": true,
            "message": "Product added to cart successfully",
            "cart_count": 2
        })
    );

    let response = browser
        .post("/cart/add", json!({"product_id": 1, "quantity": 3}))
        .await;
    assert_eq!(response.json()["cart_count"], 5);

    assert_eq!(browser.cart_item_ids().await.len(), 1);
    assert_eq!(browser.get("/cart/count").await.json(), json!({"cart_count": 5}));
}

#[tokio::test]
async fn test_add_beyond_stock_reports_available_stock() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    let response = browser
        .post("/cart/add", json!({"product_id": 3, "quantity": 3}))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json(),
        json!({
            "success": false,
            "message": "Not enough stock available",
            "available_stock": 2
        })
    );
    assert_eq!(browser.get("/cart/count").await.json()["cart_count"], 0);
}

#[tokio::test]
async fn test_add_validation_failures() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    for body in [
        json!({"product_id": 1, "quantity": 0}),
        json!({"product_id": 99, "quantity": 1}),
        json!({"product_id": 1}),
        json!({"product_id": "one", "quantity": 1}),
    ] {
        let response = browser.post("/cart/add", body).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json()["success"], false);
    }

    let response = browser.send(Method::POST, "/cart/add", None).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(browser.get("/cart/count").await.json()["cart_count"], 0);
}

// =============================================================================
// Update / Remove / Clear
// =============================================================================

#[tokio::test]
async fn test_update_overwrites_quantity_and_formats_subtotal() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    browser
        .post("/cart/add", json!({"product_id": 1, "quantity": 5}))
        .await;
    let id = browser.cart_item_ids().await[0];

    let response = browser
        .post("/cart/update", json!({"cart_item_id": id, "quantity": 2}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({
            "success": true,
            "message": "Cart updated successfully",
            "cart_count": 2,
            "subtotal": "160.000"
        })
    );
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    browser
        .post("/cart/add", json!({"product_id": 2, "quantity": 1}))
        .await;
    let id = browser.cart_item_ids().await[0];

    let response = browser
        .post("/cart/update", json!({"cart_item_id": id, "quantity": 0}))
        .await;
    assert_eq!(response.json()["message"], "Item removed from cart");
    assert_eq!(response.json()["cart_count"], 0);
    assert_eq!(response.json()["subtotal"], "0");
    assert!(browser.cart_item_ids().await.is_empty());
}

#[tokio::test]
async fn test_remove_line() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    browser
        .post("/cart/add", json!({"product_id": 1, "quantity": 1}))
        .await;
    browser
        .post("/cart/add", json!({"product_id": 2, "quantity": 4}))
        .await;
    let ids = browser.cart_item_ids().await;

    let response = browser
        .post("/cart/remove", json!({"cart_item_id": ids[0]}))
        .await;
    assert_eq!(
        response.json(),
        json!({"success": true, "message": "Item removed from cart", "cart_count": 1})
    );
}

#[tokio::test]
async fn test_other_visitors_cannot_touch_a_cart() {
    let app = TestApp::with_catalog().await;
    let mut owner = app.client();
    let mut intruder = app.client();

    owner
        .post("/cart/add", json!({"product_id": 1, "quantity": 2}))
        .await;
    let id = owner.cart_item_ids().await[0];

    let response = intruder
        .post("/cart/update", json!({"cart_item_id": id, "quantity": 9}))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.json(),
        json!({"success": false, "message": "Unauthorized"})
    );

    let response = intruder
        .post("/cart/remove", json!({"cart_item_id": id}))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    assert_eq!(owner.get("/cart/count").await.json()["cart_count"], 2);
    assert_eq!(intruder.get("/cart/count").await.json()["cart_count"], 0);
}

#[tokio::test]
async fn test_missing_item_is_not_found() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    let response = browser
        .post("/cart/update", json!({"cart_item_id": 999, "quantity": 1}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["success"], false);

    let response = browser
        .post("/cart/remove", json!({"cart_item_id": 999}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    browser
        .post("/cart/add", json!({"product_id": 1, "quantity": 1}))
        .await;
    browser
        .post("/cart/add", json!({"product_id": 2, "quantity": 1}))
        .await;

    for _ in 0..2 {
        let response = browser.send(Method::POST, "/cart/clear", None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.json(),
            json!({"success": true, "message": "Cart cleared successfully"})
        );
    }
    assert!(browser.cart_item_ids().await.is_empty());
}

// =============================================================================
// Cart page
// =============================================================================

#[tokio::test]
async fn test_cart_page_shows_totals() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    browser
        .post("/cart/add", json!({"product_id": 1, "quantity": 2}))
        .await;

    let response = browser.get("/cart").await;
    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Rp 160.000"), "subtotal missing");
    assert!(html.contains("- Rp 40.000"), "discount missing");
    assert!(html.contains("Rp 10.000"), "shipping missing");
    assert!(html.contains("Rp 17.600"), "tax missing");
    assert!(html.contains("Rp 147.600"), "total missing");
    assert!(html.contains("2 items"));
}

#[tokio::test]
async fn test_empty_cart_page() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    let response = browser.get("/cart").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("Your cart is empty"));
}

// =============================================================================
// Sign-in merge
// =============================================================================

#[tokio::test]
async fn test_sign_in_merges_anonymous_cart() {
    let app = TestApp::with_catalog().await;

    // The user already has product 1 in their cart from another device.
    let mut laptop = app.client();
    laptop.sign_in(7, "Sari").await;
    laptop
        .post("/cart/add", json!({"product_id": 1, "quantity": 2}))
        .await;

    let mut phone = app.client();
    phone
        .post("/cart/add", json!({"product_id": 1, "quantity": 1}))
        .await;
    phone
        .post("/cart/add", json!({"product_id": 2, "quantity": 3}))
        .await;

    assert_eq!(phone.sign_in(7, "Sari").await, 2);
    assert_eq!(phone.get("/cart/count").await.json()["cart_count"], 6);
    assert_eq!(phone.cart_item_ids().await.len(), 2);
    assert_eq!(laptop.get("/cart/count").await.json()["cart_count"], 6);

    // Signing in again has nothing left to merge.
    assert_eq!(phone.sign_in(7, "Sari").await, 0);
    assert_eq!(phone.get("/cart/count").await.json()["cart_count"], 6);
}

#[tokio::test]
async fn test_sign_out_returns_to_empty_session_cart() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    browser
        .post("/cart/add", json!({"product_id": 1, "quantity": 2}))
        .await;
    assert_eq!(browser.sign_in(7, "Sari").await, 1);
    assert_eq!(browser.get("/cart/count").await.json()["cart_count"], 2);

    browser.sign_out().await;
    assert_eq!(browser.get("/cart/count").await.json()["cart_count"], 0);
    let response = browser.get("/orders").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    // The user's cart is still there on the next sign-in.
    assert_eq!(browser.sign_in(7, "Sari").await, 0);
    assert_eq!(browser.get("/cart/count").await.json()["cart_count"], 2);
}

#[tokio::test]
async fn test_sign_in_keeps_anonymous_cart_when_merge_would_overflow() {
    let app = TestApp::with_catalog().await;

    let mut laptop = app.client();
    laptop.sign_in(7, "Sari").await;
    laptop
        .post("/cart/add", json!({"product_id": 2, "quantity": 2_000_000_000}))
        .await;

    let mut phone = app.client();
    phone
        .post("/cart/add", json!({"product_id": 2, "quantity": 2_000_000_000}))
        .await;
    phone
        .post("/cart/add", json!({"product_id": 1, "quantity": 1}))
        .await;

    assert_eq!(phone.sign_in(7, "Sari").await, 0);
    assert_eq!(
        phone.get("/cart/count").await.json()["cart_count"],
        2_000_000_000_u64
    );

    phone.sign_out().await;
    assert_eq!(
        phone.get("/cart/count").await.json()["cart_count"],
        2_000_000_001_u64
    );
}

#[tokio::test]
async fn test_add_past_quantity_limit_is_rejected() {
    let app = TestApp::with_catalog().await;
    let mut browser = app.client();

    browser
        .post("/cart/add", json!({"product_id": 2, "quantity": 2_000_000_000}))
        .await;
    let response = browser
        .post("/cart/add", json!({"product_id": 2, "quantity": 200_000_000}))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["success"], false);
    assert_eq!(
        browser.get("/cart/count").await.json()["cart_count"],
        2_000_000_000_u64
    );
}

#[tokio::test]
async fn test_signed_in_cart_is_per_user() {
    let app = TestApp::with_catalog().await;
    let mut alice = app.client();
    let mut bob = app.client();
    alice.sign_in(1, "Alice").await;
    bob.sign_in(2, "Bob").await;

    alice
        .post("/cart/add", json!({"product_id": 2, "quantity": 1}))
        .await;
    let id = alice.cart_item_ids().await[0];

    let response = bob.post("/cart/remove", json!({"cart_item_id": id})).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(alice.get("/cart/count").await.json()["cart_count"], 1);
}
