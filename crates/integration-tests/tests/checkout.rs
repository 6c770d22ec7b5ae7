//! Integration tests for checkout and order history.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use goshop_integration_tests::{TestApp, TestOptions};

fn order(items: &[(i64, i64)]) -> Value {
    json!({
        "address": "Jl. Merdeka No. 1, Bandung",
        "payment_method": "xendit",
        "items": items
            .iter()
            .map(|(product_id, quantity)| json!({ "product_id": product_id, "quantity": quantity }))
            .collect::<Vec<_>>(),
    })
}

// ============================================================================
// Pricing & Stock
// ============================================================================

#[tokio::test]
async fn test_total_is_recomputed_from_catalog() {
    let app = TestApp::spawn().await;
    let kopi = app.add_product("Kopi Gayo", "15000", "Minuman", 5).await;
    let roti = app.add_product("Roti Bakar", "12500.50", "Makanan", 5).await;
    let token = app.customer_token("Ann", "ann@x.com").await;

    let mut body = order(&[(kopi.id.as_i64(), 2), (roti.id.as_i64(), 1)]);
    body["total"] = json!(1);

    let response = app.post_json("/api/checkout", Some(&token), &body).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["message"], "order created");
    let order_id = response.body["order_id"].as_i64().unwrap();
    let payment_url = response.body["payment_url"].as_str().unwrap();
    assert!(payment_url.starts_with("https://checkout.xendit.test/ORDER-"));

    let invoices = app.gateway.requests();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].amount, "42500.50".parse().unwrap());
    assert_eq!(invoices[0].order_id.as_i64(), order_id);
    assert!(
        invoices[0]
            .external_id
            .starts_with(&format!("ORDER-{order_id}-"))
    );

    let mine = app.get("/api/my/orders", Some(&token)).await;
    assert_eq!(mine.status, StatusCode::OK);
    let placed = &mine.body["data"][0];
    assert_eq!(placed["id"].as_i64(), Some(order_id));
    assert_eq!(placed["total"].as_f64(), Some(42500.5));
    assert_eq!(placed["status"], "Pending");
    assert_eq!(placed["customer"], "Ann");
    assert_eq!(placed["payment_url"], payment_url);
    assert_eq!(placed["items"].as_array().unwrap().len(), 2);
    assert_eq!(placed["items"][0]["name"], "Kopi Gayo");
    assert_eq!(placed["items"][0]["quantity"], 2);

    assert_eq!(app.stock_of(&kopi).await, Some(3));
    assert_eq!(app.stock_of(&roti).await, Some(4));
}

#[tokio::test]
async fn test_insufficient_stock_has_no_side_effects() {
    let app = TestApp::spawn().await;
    let kopi = app.add_product("Kopi Gayo", "15000", "Minuman", 5).await;
    let teh = app.add_product("Teh Tarik", "8000", "Minuman", 1).await;
    let token = app.customer_token("Ann", "ann@x.com").await;

    let response = app
        .post_json(
            "/api/checkout",
            Some(&token),
            &order(&[(kopi.id.as_i64(), 2), (teh.id.as_i64(), 2)]),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.error().contains("Teh Tarik"));

    assert_eq!(app.stock_of(&kopi).await, Some(5));
    assert_eq!(app.stock_of(&teh).await, Some(1));
    assert!(app.gateway.requests().is_empty());

    let mine = app.get("/api/my/orders", Some(&token)).await;
    assert_eq!(mine.body["data"], json!([]));
}

#[tokio::test]
async fn test_last_unit_can_be_bought_once() {
    let app = TestApp::spawn().await;
    let teh = app.add_product("Teh Tarik", "8000", "Minuman", 1).await;
    let token = app.customer_token("Ann", "ann@x.com").await;
    let body = order(&[(teh.id.as_i64(), 1)]);

    let first = app.post_json("/api/checkout", Some(&token), &body).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.post_json("/api/checkout", Some(&token), &body).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(app.stock_of(&teh).await, Some(0));
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_checkout_validation() {
    let app = TestApp::spawn().await;
    let kopi = app.add_product("Kopi Gayo", "15000", "Minuman", 5).await;
    let token = app.customer_token("Ann", "ann@x.com").await;

    let empty = app.post_json("/api/checkout", Some(&token), &order(&[])).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let zero = app
        .post_json("/api/checkout", Some(&token), &order(&[(kopi.id.as_i64(), 0)]))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let mut no_address = order(&[(kopi.id.as_i64(), 1)]);
    no_address["address"] = json!("   ");
    let no_address = app.post_json("/api/checkout", Some(&token), &no_address).await;
    assert_eq!(no_address.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_address.error(), "address is required");

    let unknown = app
        .post_json("/api/checkout", Some(&token), &order(&[(9999, 1)]))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    assert_eq!(app.stock_of(&kopi).await, Some(5));
}

// ============================================================================
// Payment Gateway
// ============================================================================

#[tokio::test]
async fn test_gateway_failure_leaves_order_pending() {
    let app = TestApp::spawn().await;
    let kopi = app.add_product("Kopi Gayo", "15000", "Minuman", 5).await;
    let token = app.customer_token("Ann", "ann@x.com").await;
    app.gateway.set_failing(true);

    let response = app
        .post_json("/api/checkout", Some(&token), &order(&[(kopi.id.as_i64(), 1)]))
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.error(), "failed to create payment");

    let mine = app.get("/api/my/orders", Some(&token)).await;
    let orders = mine.body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "Pending");
    assert!(orders[0]["payment_url"].is_null());
}

// ============================================================================
// Access
// ============================================================================

#[tokio::test]
async fn test_checkout_requires_token_by_default() {
    let app = TestApp::spawn().await;
    let kopi = app.add_product("Kopi Gayo", "15000", "Minuman", 5).await;

    let response = app
        .post_json("/api/checkout", None, &order(&[(kopi.id.as_i64(), 1)]))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "missing token");
    assert_eq!(app.stock_of(&kopi).await, Some(5));
}

#[tokio::test]
async fn test_guest_checkout_when_enabled() {
    let app = TestApp::spawn_with(TestOptions {
        guest_checkout: true,
    })
    .await;
    let kopi = app.add_product("Kopi Gayo", "15000", "Minuman", 5).await;

    let guest = app
        .post_json("/api/checkout", None, &order(&[(kopi.id.as_i64(), 1)]))
        .await;
    assert_eq!(guest.status, StatusCode::OK, "{:?}", guest.body);

    let token = app.customer_token("Ann", "ann@x.com").await;
    let signed_in = app
        .post_json("/api/checkout", Some(&token), &order(&[(kopi.id.as_i64(), 1)]))
        .await;
    assert_eq!(signed_in.status, StatusCode::OK);

    let admin = app.admin_token().await;
    let all = app.get("/api/admin/orders", Some(&admin)).await;
    let orders = all.body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["customer"], "Ann");
    assert!(orders[0]["user_id"].is_i64());
    assert_eq!(orders[1]["customer"], "Customer");
    assert!(orders[1]["user_id"].is_null());
}

#[tokio::test]
async fn test_order_history_is_per_user() {
    let app = TestApp::spawn().await;
    let kopi = app.add_product("Kopi Gayo", "15000", "Minuman", 10).await;
    let ann = app.customer_token("Ann", "ann@x.com").await;
    let budi = app.customer_token("Budi", "budi@x.com").await;

    for _ in 0..2 {
        app.post_json("/api/checkout", Some(&ann), &order(&[(kopi.id.as_i64(), 1)]))
            .await;
    }
    app.post_json("/api/checkout", Some(&budi), &order(&[(kopi.id.as_i64(), 1)]))
        .await;

    let ann_orders = app.get("/api/my/orders", Some(&ann)).await;
    let ann_orders = ann_orders.body["data"].as_array().unwrap().clone();
    assert_eq!(ann_orders.len(), 2);
    assert!(ann_orders.iter().all(|o| o["customer"] == "Ann"));
    assert!(ann_orders[0]["id"].as_i64() > ann_orders[1]["id"].as_i64());

    let budi_orders = app.get("/api/my/orders", Some(&budi)).await;
    assert_eq!(budi_orders.body["data"].as_array().unwrap().len(), 1);
}
