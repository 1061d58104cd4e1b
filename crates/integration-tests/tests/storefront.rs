//! Integration tests for the storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`solera migrate`)
//! - The storefront running (cargo run -p solera-storefront)
//! - `DATABASE_URL` pointing at the same database
//!
//! Run with: cargo test -p solera-integration-tests -- --ignored

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use solera_integration_tests::{
    CouponFixture, ProductFixture, client, location, order_request, pool, storefront_url,
};

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("amount is not a decimal string")
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_home_sends_security_headers() {
    let resp = client()
        .get(format!("{}/", storefront_url()))
        .send()
        .await
        .expect("Failed to get home page");

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(
        headers
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_product_page_and_listing() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 5).await;
    let client = client();

    let resp = client
        .get(format!("{}{}", storefront_url(), product.path()))
        .send()
        .await
        .expect("Failed to get product page");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains(&product.sku) || body.contains("Test Sandalet"));

    let resp = client
        .get(format!("{}/shop/women?sort=newest", storefront_url()))
        .send()
        .await
        .expect("Failed to get listing");
    assert_eq!(resp.status(), StatusCode::OK);

    product.delete(&pool).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_product_and_gender_are_not_found() {
    let client = client();
    let base = storefront_url();

    let resp = client
        .get(format!("{base}/shop/women/no-such-sandal-anywhere"))
        .send()
        .await
        .expect("Failed to get product page");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .get(format!("{base}/shop/kids"))
        .send()
        .await
        .expect("Failed to get listing");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_add_to_cart_then_view() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 5).await;
    let client = client();
    let base = storefront_url();

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[
            ("variant_id", product.variant_id.as_i32().to_string()),
            ("quantity", "2".to_string()),
        ])
        .send()
        .await
        .expect("Failed to add to cart");
    assert!(resp.status().is_redirection());

    let resp = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Test Sandalet"));

    product.delete(&pool).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_with_empty_cart_goes_back_to_cart() {
    let resp = client()
        .get(format!("{}/checkout/review", storefront_url()))
        .send()
        .await
        .expect("Failed to get checkout");
    assert!(resp.status().is_redirection());
    assert!(location(&resp).starts_with("/cart"));
}

// ============================================================================
// Order API
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_order_api_places_order_and_tracks_it() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 3).await;
    let client = client();
    let base = storefront_url();

    let resp = client
        .post(format!("{base}/api/orders"))
        .json(&order_request(product.variant_id, 2))
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("Failed to parse response");

    let number = created["order_number"].as_str().unwrap_or_default();
    assert!(number.starts_with("SL"));
    let token = created["tracking_token"]
        .as_str()
        .expect("tracking_token missing");
    assert_eq!(product.stock(&pool).await, 1);

    let resp = client
        .get(format!("{base}/api/orders/{token}"))
        .send()
        .await
        .expect("Failed to track order");
    assert_eq!(resp.status(), StatusCode::OK);
    let tracked: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(tracked["order_number"], created["order_number"]);
    assert_eq!(tracked["status"], "PENDING");
    assert_eq!(tracked["items"][0]["sku"], product.sku.as_str());
    assert_eq!(tracked["items"][0]["quantity"], 2);

    let resp = client
        .get(format!("{base}/orders/{token}"))
        .send()
        .await
        .expect("Failed to get tracking page");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_order_api_rejects_more_than_stock() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 1).await;

    let resp = client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&order_request(product.variant_id, 2))
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["error"].is_string());
    assert_eq!(product.stock(&pool).await, 1);

    product.delete(&pool).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_order_api_reports_invalid_fields() {
    let mut request = order_request(solera_core::VariantId::new(1), 1);
    request["contact"]["email"] = Value::from("not-an-email");
    request["shipping"]["district"] = Value::from("Atlantis");

    let resp = client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&request)
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to parse response");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .map(|f| f.iter().filter_map(|e| e["field"].as_str()).collect())
        .unwrap_or_default();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"district"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_tracking_token_is_not_found() {
    let resp = client()
        .get(format!("{}/api/orders/not-a-real-token", storefront_url()))
        .send()
        .await
        .expect("Failed to track order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Coupons
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_coupon_usage_limit_holds_at_placement() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 5).await;
    let coupon = CouponFixture::create(&pool, 10, None, Some(1)).await;
    let client = client();
    let base = storefront_url();

    let mut request = order_request(product.variant_id, 1);
    request["coupon_code"] = Value::from(coupon.code.to_lowercase());

    let resp = client
        .post(format!("{base}/api/orders"))
        .json(&request)
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("Failed to parse response");
    let token = created["tracking_token"]
        .as_str()
        .expect("tracking_token missing");

    let tracked: Value = client
        .get(format!("{base}/api/orders/{token}"))
        .send()
        .await
        .expect("Failed to track order")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(decimal(&tracked["subtotal"]), Decimal::new(1000, 0));
    assert_eq!(decimal(&tracked["discount"]), Decimal::new(100, 0));
    assert_eq!(coupon.used_count(&pool).await, 1);

    let resp = client
        .post(format!("{base}/api/orders"))
        .json(&request)
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.contains("usage limit")),
        "{body}"
    );
    assert_eq!(coupon.used_count(&pool).await, 1);
    assert_eq!(product.stock(&pool).await, 4);

    coupon.delete(&pool).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_coupon_rejects_order() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 2).await;

    let mut request = order_request(product.variant_id, 1);
    request["coupon_code"] = Value::from("YOK-BOYLE-BIR-KOD");

    let resp = client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&request)
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.contains("not found")),
        "{body}"
    );
    assert_eq!(product.stock(&pool).await, 2);

    product.delete(&pool).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_coupon_below_minimum_on_small_cart() {
    let pool = pool().await;
    let product = ProductFixture::create(&pool, 5).await;
    let coupon = CouponFixture::create(&pool, 15, Some(Decimal::new(5000, 0)), None).await;
    let client = client();
    let base = storefront_url();

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[
            ("variant_id", product.variant_id.as_i32().to_string()),
            ("quantity", "1".to_string()),
        ])
        .send()
        .await
        .expect("Failed to add to cart");
    assert!(resp.status().is_redirection());

    let resp = client
        .post(format!("{base}/api/coupons/validate"))
        .json(&json!({"code": &coupon.code}))
        .send()
        .await
        .expect("Failed to validate coupon");
    assert_eq!(resp.status(), StatusCode::OK);
    let checked: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(checked["valid"], false);
    assert_eq!(checked["reason"]["reason"], "below_minimum");
    assert_eq!(decimal(&checked["discount"]), Decimal::ZERO);

    let resp = client
        .post(format!("{base}/cart/coupon"))
        .form(&[("code", coupon.code.as_str())])
        .send()
        .await
        .expect("Failed to apply coupon");
    assert_eq!(location(&resp), "/cart");

    let body = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains(&coupon.code));
    assert!(body.contains("minimum order"));

    coupon.delete(&pool).await;
    product.delete(&pool).await;
}
