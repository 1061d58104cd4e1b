//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Dashboard
//! GET  /                                - Stats, recent orders, low stock
//!
//! # Auth
//! GET  /auth/login                      - Login page
//! POST /auth/login                      - Login action (rate limited)
//! POST /auth/logout                     - Logout
//!
//! # Catalog
//! GET  /products                        - Product listing (?q=&page=)
//! GET  /products/new                    - New product form
//! POST /products                        - Create product
//! GET  /products/{id}                   - Edit product, variants, images
//! POST /products/{id}                   - Update product
//! POST /products/{id}/delete            - Delete product
//! POST /products/{id}/variants          - Add variant
//! POST /products/{id}/variants/{vid}    - Update variant
//! POST /products/{id}/variants/{vid}/delete
//! POST /products/{id}/images            - Add image by URL
//! POST /products/{id}/images/{iid}/delete
//! GET  /categories                      - List with inline create/edit
//! POST /categories, /categories/{id}, /categories/{id}/delete
//! GET  /collections                     - Collection listing
//! GET  /collections/new, /collections/{id}
//! POST /collections, /collections/{id}, /collections/{id}/delete
//!
//! # Marketing
//! GET  /banners                         - List with inline create/edit
//! POST /banners, /banners/{id}, /banners/{id}/delete
//! GET  /coupons, /coupons/new, /coupons/{id}
//! POST /coupons, /coupons/{id}, /coupons/{id}/delete
//!
//! # Orders
//! GET  /orders                          - Listing (?status=&q=&page=)
//! GET  /orders/{id}                     - Detail with status history
//! POST /orders/{id}/status              - Move to the next status
//! POST /orders/{id}/paid                - Mark payment received
//!
//! # Customers
//! GET  /users                           - Customer listing
//! POST /users/{id}/activate, /users/{id}/deactivate
//!
//! # Content
//! GET  /pages, /pages/new, /pages/{id}
//! POST /pages, /pages/{id}, /pages/{id}/delete
//! GET  /faqs                            - List with inline create/edit
//! POST /faqs, /faqs/{id}, /faqs/{id}/delete
//!
//! # Settings
//! GET  /settings                        - Store settings
//! POST /settings                        - Update settings
//!
//! # Admin Users (super admin only)
//! GET  /admin-users                     - List admin users
//! POST /admin-users                     - Create admin user
//! POST /admin-users/{id}/delete         - Remove admin user
//!
//! # JSON API
//! GET  /api/stats                       - Dashboard numbers
//! GET  /api/orders                      - Order listing
//! GET  /api/orders/{id}                 - Order detail
//! POST /api/orders/{id}/status          - Status change
//! ```
//!
//! HTML forms only send GET and POST, so updates and deletes are POSTs to
//! the resource path. Handlers redirect afterwards with `?success=` or
//! `?error=`, which the next page shows as a notice.

pub mod admin_users;
pub mod api;
pub mod auth;
pub mod banners;
pub mod categories;
pub mod collections;
pub mod coupons;
pub mod dashboard;
pub mod faqs;
pub mod forms;
pub mod orders;
pub mod pagination;
pub mod pages;
pub mod products;
pub mod settings;
pub mod users;

use axum::{Router, response::Redirect, routing::get};
use serde::Deserialize;

use crate::state::AppState;

/// `?success=` / `?error=` left by the previous redirect.
#[derive(Debug, Default, Deserialize)]
pub struct Notice {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Notice {
    /// Split into the `success_message` and `error_message` template fields.
    #[must_use]
    pub fn into_messages(self) -> (Option<String>, Option<String>) {
        (
            self.success.filter(|m| !m.is_empty()),
            self.error.filter(|m| !m.is_empty()),
        )
    }
}

fn with_param(path: &str, key: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(message))
}

/// Redirect to `path` with a success notice.
#[must_use]
pub fn redirect_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_param(path, "success", message))
}

/// Redirect to `path` with an error notice.
#[must_use]
pub fn redirect_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_param(path, "error", message))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/", get(dashboard::dashboard))
        .merge(auth::router())
        // Catalog
        .merge(products::router())
        .merge(categories::router())
        .merge(collections::router())
        // Marketing
        .merge(banners::router())
        .merge(coupons::router())
        // Orders and customers
        .merge(orders::router())
        .merge(users::router())
        // Content
        .merge(pages::router())
        .merge(faqs::router())
        // Settings and team
        .merge(settings::router())
        .merge(admin_users::router())
        // JSON API
        .nest("/api", api::router())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn location(redirect: Redirect) -> String {
        redirect
            .into_response()
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_redirect_encodes_message() {
        assert_eq!(
            location(redirect_success("/products", "Saved & published")),
            "/products?success=Saved%20%26%20published"
        );
        assert_eq!(
            location(redirect_error("/orders?status=PENDING", "Nope")),
            "/orders?status=PENDING&error=Nope"
        );
    }

    #[test]
    fn test_blank_notice_is_none() {
        let notice = Notice {
            success: Some(String::new()),
            error: Some("Slug taken".to_string()),
        };
        assert_eq!(notice.into_messages(), (None, Some("Slug taken".to_string())));
    }
}
