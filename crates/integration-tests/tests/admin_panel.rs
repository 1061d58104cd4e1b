//! Integration tests for the admin panel.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`solera migrate`)
//! - The admin server running (cargo run -p solera-admin)
//! - `DATABASE_URL` pointing at the same database
//!
//! Run with: cargo test -p solera-integration-tests -- --ignored

use reqwest::StatusCode;

use solera_core::AdminRole;
use solera_db::CategoryRepository;
use solera_integration_tests::{admin_client, admin_url, client, location, pool, unique};

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_panel_redirects_to_login() {
    let client = client();
    for path in ["/", "/products", "/orders", "/settings"] {
        let resp = client
            .get(format!("{}{path}", admin_url()))
            .send()
            .await
            .expect("Failed to reach admin");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/auth/login", "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_api_without_session_is_unauthorized() {
    let resp = client()
        .get(format!("{}/api/stats", admin_url()))
        .send()
        .await
        .expect("Failed to reach admin");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_wrong_password_shows_login_again() {
    let resp = client()
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", "nobody@solera.test"), ("password", "Wrong-pass-123")])
        .send()
        .await
        .expect("Failed to post login");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("nobody@solera.test"));
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_login_then_logout() {
    let pool = pool().await;
    let client = admin_client(&pool, AdminRole::Admin).await;
    let base = admin_url();

    let resp = client
        .get(format!("{base}/"))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(location(&resp), "/auth/login");

    let resp = client
        .get(format!("{base}/"))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_viewer_can_read_but_not_write() {
    let pool = pool().await;
    let client = admin_client(&pool, AdminRole::Viewer).await;
    let base = admin_url();

    let resp = client
        .get(format!("{base}/categories"))
        .send()
        .await
        .expect("Failed to get categories");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/categories"))
        .form(&[("name", "Viewer Kategori"), ("slug", "viewer-kategori")])
        .send()
        .await
        .expect("Failed to post category");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_admin_users_page_is_super_admin_only() {
    let pool = pool().await;
    let base = admin_url();

    let admin = admin_client(&pool, AdminRole::Admin).await;
    let resp = admin
        .get(format!("{base}/admin-users"))
        .send()
        .await
        .expect("Failed to get admin users");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let super_admin = admin_client(&pool, AdminRole::SuperAdmin).await;
    let resp = super_admin
        .get(format!("{base}/admin-users"))
        .send()
        .await
        .expect("Failed to get admin users");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Catalog forms
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_category_create_and_duplicate_slug() {
    let pool = pool().await;
    let client = admin_client(&pool, AdminRole::Admin).await;
    let base = admin_url();
    let slug = format!("test-kategori-{}", unique());

    let form = [
        ("name", "Test Kategori"),
        ("slug", slug.as_str()),
        ("description", ""),
        ("sort_order", "9"),
    ];

    let resp = client
        .post(format!("{base}/categories"))
        .form(&form)
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/categories?success="));

    let resp = client
        .post(format!("{base}/categories"))
        .form(&form)
        .send()
        .await
        .expect("Failed to create category");
    assert!(location(&resp).starts_with("/categories?error="));

    let repo = CategoryRepository::new(&pool);
    let category = repo
        .get_by_slug(&slug)
        .await
        .expect("Failed to load category")
        .expect("Category was not created");
    assert_eq!(category.sort_order, 9);
    repo.delete(category.id)
        .await
        .expect("Failed to delete category");
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_product_form_rejects_bad_price() {
    let pool = pool().await;
    let client = admin_client(&pool, AdminRole::Admin).await;

    let resp = client
        .post(format!("{}/products", admin_url()))
        .form(&[
            ("name", "Fiyatsız"),
            ("slug", "fiyatsiz"),
            ("gender", "women"),
            ("base_price", "-5"),
        ])
        .send()
        .await
        .expect("Failed to post product");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Fiyatsız"));
}
