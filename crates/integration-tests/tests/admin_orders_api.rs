//! Integration tests for the admin JSON order API.
//!
//! Orders are placed through the storefront API, then driven through the
//! admin API. Requires both servers, a migrated database and `DATABASE_URL`.
//!
//! Run with: cargo test -p solera-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use solera_core::AdminRole;
use solera_integration_tests::{
    ProductFixture, admin_client, admin_url, client, order_request, pool, storefront_url,
};

/// Place an order through the storefront and return its admin API detail.
async fn place_order(admin: &Client, product: &ProductFixture, quantity: u32) -> Value {
    let resp = client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&order_request(product.variant_id, quantity))
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("Failed to parse response");
    let number = created["order_number"].as_str().expect("order_number missing");

    let resp = admin
        .get(format!("{}/api/orders?q={number}", admin_url()))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = resp.json().await.expect("Failed to parse response");
    let id = page["items"][0]["id"].as_i64().expect("order not listed");

    let resp = admin
        .get(format!("{}/api/orders/{id}", admin_url()))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse response")
}

async fn set_status(admin: &Client, id: i64, body: &Value) -> reqwest::Response {
    admin
        .post(format!("{}/api/orders/{id}/status", admin_url()))
        .json(body)
        .send()
        .await
        .expect("Failed to update status")
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_stats() {
    let pool = pool().await;
    let admin = admin_client(&pool, AdminRole::Viewer).await;

    let resp = admin
        .get(format!("{}/api/stats", admin_url()))
        .send()
        .await
        .expect("Failed to get stats");
    assert_eq!(resp.status(), StatusCode::OK);
    let stats: Value = resp.json().await.expect("Failed to parse response");
    assert!(stats["currency"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_order_moves_forward_and_never_back() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 5).await;
    let admin = admin_client(&pool, AdminRole::Admin).await;

    let order = place_order(&admin, &product, 1).await;
    let id = order["id"].as_i64().expect("id missing");
    assert_eq!(order["status"], "PENDING");
    assert!(
        order["next_statuses"]
            .as_array()
            .is_some_and(|s| s.contains(&json!("CONFIRMED")))
    );

    let resp = set_status(&admin, id, &json!({"status": "CONFIRMED", "note": "Ödeme alındı"})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(updated["status"], "CONFIRMED");

    let resp = set_status(
        &admin,
        id,
        &json!({"status": "SHIPPED", "carrier": "Yurtiçi Kargo", "tracking_number": "YK123456"}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let shipped: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(shipped["carrier"], "Yurtiçi Kargo");
    assert_eq!(shipped["tracking_number"], "YK123456");

    let resp = set_status(&admin, id, &json!({"status": "PENDING"})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["error"].is_string());

    let resp = set_status(&admin, id, &json!({"status": "CANCELLED"})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_cancelling_restocks() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 4).await;
    let admin = admin_client(&pool, AdminRole::Admin).await;

    let order = place_order(&admin, &product, 3).await;
    let id = order["id"].as_i64().expect("id missing");
    assert_eq!(product.stock(&pool).await, 1);

    let resp = set_status(&admin, id, &json!({"status": "CANCELLED"})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(product.stock(&pool).await, 4);
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_viewer_cannot_change_status() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 2).await;
    let viewer = admin_client(&pool, AdminRole::Viewer).await;

    let order = place_order(&viewer, &product, 1).await;
    let id = order["id"].as_i64().expect("id missing");

    let resp = set_status(&viewer, id, &json!({"status": "CONFIRMED"})).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_unknown_order_is_json_not_found() {
    let pool = pool().await;
    let admin = admin_client(&pool, AdminRole::Admin).await;

    let resp = admin
        .get(format!("{}/api/orders/2147483000", admin_url()))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["error"].is_string());
}
