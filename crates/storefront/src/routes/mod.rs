//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page
//! GET  /health                     - Health check
//!
//! # Catalog
//! GET  /shop                       - All products (filters, sort, pagination)
//! GET  /shop/{gender}              - Products for women, men or unisex
//! GET  /shop/{gender}/{slug}       - Product detail (?color=&size=)
//! GET  /collections                - Collection listing
//! GET  /collections/{slug}         - Collection detail
//!
//! # Cart (HTMX fragments, redirect without HTMX)
//! GET  /cart                       - Cart page
//! POST /cart/add                   - Add a variant (triggers cart-updated)
//! POST /cart/update                - Change quantity
//! POST /cart/remove                - Remove a line
//! GET  /cart/count                 - Cart count badge
//! POST /cart/coupon                - Apply a coupon code
//! POST /cart/coupon/remove         - Remove the coupon
//!
//! # Checkout
//! GET  /checkout                   - Resume at the next incomplete step
//! GET  /checkout/contact           - Contact step
//! GET  /checkout/shipping          - Shipping address step
//! GET  /checkout/payment           - Payment method step
//! GET  /checkout/review            - Review
//! POST /checkout/place             - Place the order
//!
//! # Orders
//! GET  /orders/{token}             - Confirmation and tracking
//! GET  /track                      - Lookup by order number and email
//!
//! # Content
//! GET  /pages/{slug}               - Content page
//! GET  /faq                        - FAQ
//!
//! # Auth
//! GET  /auth/login                 - Login page
//! POST /auth/login                 - Login action
//! GET  /auth/register              - Register page
//! POST /auth/register              - Register action
//! POST /auth/logout                - Logout action
//!
//! # Account (requires auth)
//! GET  /account                    - Account overview
//! GET  /account/orders             - Order history
//!
//! # JSON API
//! POST /api/orders                 - Create an order
//! POST /api/coupons/validate       - Check a coupon against the cart
//! GET  /api/orders/{token}         - Order tracking
//! GET  /api/locations/cities       - Deliverable cities
//! GET  /api/locations/cities/{id}/districts
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod collections;
pub mod home;
pub mod orders;
pub mod pages;
pub mod products;
pub mod views;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Whether the request was sent by HTMX and expects a fragment.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Create the auth routes router.
///
/// Login and registration posts are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the catalog routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{gender}", get(products::by_gender))
        .route("/{gender}/{slug}", get(products::show))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{slug}", get(collections::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/coupon", post(cart::apply_coupon))
        .route("/coupon/remove", post(cart::remove_coupon))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::start))
        .route(
            "/contact",
            get(checkout::contact_page).post(checkout::contact),
        )
        .route(
            "/shipping",
            get(checkout::shipping_page).post(checkout::shipping),
        )
        .route(
            "/payment",
            get(checkout::payment_page).post(checkout::payment),
        )
        .route("/review", get(checkout::review))
        .route("/place", post(checkout::place))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/shop", shop_routes())
        .nest("/collections", collection_routes())
        // Cart and checkout
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        // Orders
        .route("/orders/{token}", get(orders::show))
        .route("/track", get(orders::track_page).post(orders::track))
        // Content
        .route("/pages/{slug}", get(pages::show))
        .route("/faq", get(pages::faq))
        // Accounts
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        // JSON API
        .nest("/api", api::router())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
