//! Integration tests for Solera.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database, apply migrations, start both servers
//! docker run -d -p 5432:5432 -e POSTGRES_PASSWORD=postgres postgres:17
//! solera migrate
//! cargo run -p solera-storefront &
//! cargo run -p solera-admin &
//!
//! # Run integration tests
//! cargo test -p solera-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - Same database the servers use (fixtures are written directly)
//! - `STOREFRONT_BASE_URL` - Default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - Default `http://localhost:3001`
//!
//! # Test Files
//!
//! - `storefront` - Catalog pages, cart, coupons, order API and tracking
//! - `admin_panel` - Login, roles, catalog forms
//! - `admin_orders_api` - JSON order API and status transitions

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, StatusCode, redirect};
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use solera_admin::services::AdminAuthService;
use solera_core::{AdminRole, CouponId, CouponKind, Gender, ProductId, VariantId};
use solera_db::models::{CouponInput, ProductInput, VariantInput};
use solera_db::{CouponRepository, ProductRepository};

/// Password given to every fixture admin.
pub const ADMIN_PASSWORD: &str = "Kum-saati-1987!";

/// Base URL for the storefront.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin panel.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client with a cookie jar that does not follow redirects, so tests
/// can assert on `Location`.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the database the servers use.
pub async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    solera_db::create_pool(&SecretString::from(url), 2)
        .await
        .expect("Failed to connect to database")
}

/// Short random suffix for unique slugs, SKUs and emails.
#[must_use]
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string().chars().take(10).collect()
}

/// Value of the `Location` header on a redirect.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// A product with one variant, written straight to the database.
pub struct ProductFixture {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub sku: String,
    pub slug: String,
    pub gender: Gender,
}

impl ProductFixture {
    /// Create an active women's product priced at 1000.00 with `stock` units.
    pub async fn create(pool: &PgPool, stock: i32) -> Self {
        let suffix = unique();
        let repo = ProductRepository::new(pool);
        let product = repo
            .create(&ProductInput {
                category_id: None,
                gender: Gender::Women,
                name: format!("Test Sandalet {suffix}"),
                slug: format!("test-sandalet-{suffix}"),
                description: "Integration test product".to_string(),
                material: None,
                base_price: Decimal::new(100_000, 2),
                compare_at_price: None,
                is_active: true,
                is_featured: false,
            })
            .await
            .expect("Failed to create product");

        let sku = format!("TEST-{}", suffix.to_uppercase());
        let variant = repo
            .add_variant(
                product.id,
                &VariantInput {
                    sku: sku.clone(),
                    size: "38".to_string(),
                    color: "Taba".to_string(),
                    color_hex: None,
                    price: None,
                    stock,
                    is_active: true,
                },
            )
            .await
            .expect("Failed to create variant");

        Self {
            product_id: product.id,
            variant_id: variant.id,
            sku,
            slug: product.slug,
            gender: product.gender,
        }
    }

    /// Storefront path of the product page.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/shop/{}/{}", self.gender, self.slug)
    }

    /// Current stock of the fixture variant.
    pub async fn stock(&self, pool: &PgPool) -> i32 {
        ProductRepository::new(pool)
            .get_detail(self.product_id)
            .await
            .expect("Failed to load product")
            .expect("Fixture product missing")
            .variants
            .iter()
            .find(|v| v.id == self.variant_id)
            .map(|v| v.stock)
            .expect("Fixture variant missing")
    }

    /// Remove the product (variants and images cascade).
    pub async fn delete(self, pool: &PgPool) {
        let _ = ProductRepository::new(pool).delete(self.product_id).await;
    }
}

/// A percentage coupon, written straight to the database.
pub struct CouponFixture {
    pub id: CouponId,
    pub code: String,
}

impl CouponFixture {
    /// Create an active `percent`% coupon with optional minimum subtotal and
    /// usage limit.
    pub async fn create(
        pool: &PgPool,
        percent: i64,
        min_subtotal: Option<Decimal>,
        usage_limit: Option<i32>,
    ) -> Self {
        let coupon = CouponRepository::new(pool)
            .create(&CouponInput {
                code: format!("TEST-{}", unique()),
                kind: CouponKind::Percentage,
                value: Decimal::new(percent, 0),
                min_subtotal,
                max_discount: None,
                usage_limit,
                starts_at: None,
                ends_at: None,
                is_active: true,
            })
            .await
            .expect("Failed to create coupon");

        Self {
            id: coupon.id,
            code: coupon.code,
        }
    }

    /// Times the coupon has been used.
    pub async fn used_count(&self, pool: &PgPool) -> i32 {
        CouponRepository::new(pool)
            .get_by_id(self.id)
            .await
            .expect("Failed to load coupon")
            .expect("Fixture coupon missing")
            .used_count
    }

    pub async fn delete(self, pool: &PgPool) {
        let _ = CouponRepository::new(pool).delete(self.id).await;
    }
}

/// Create an admin with `role` and return a client logged in as them.
pub async fn admin_client(pool: &PgPool, role: AdminRole) -> Client {
    let email = format!("test-{}@solera.test", unique());
    AdminAuthService::new(pool)
        .create_admin(&email, "Test Admin", role, ADMIN_PASSWORD)
        .await
        .expect("Failed to create admin");

    let client = client();
    let resp = client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", email.as_str()), ("password", ADMIN_PASSWORD)])
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    client
}

/// JSON body for `POST /api/orders` buying `quantity` of one variant.
#[must_use]
pub fn order_request(variant_id: VariantId, quantity: u32) -> serde_json::Value {
    serde_json::json!({
        "contact": {
            "email": format!("musteri-{}@example.com", unique()),
            "full_name": "Ayşe Yılmaz",
            "phone": "05551234567"
        },
        "shipping": {
            "city": "Muğla",
            "district": "Bodrum",
            "address_line": "Neyzen Tevfik Cd. 5",
            "postal_code": "48400"
        },
        "payment_method": "cash_on_delivery",
        "items": [{"variant_id": variant_id.as_i32(), "quantity": quantity}]
    })
}
