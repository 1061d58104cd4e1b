//! Customer account route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use solera_core::UserId;
use solera_db::UserRepository;
use solera_db::models::UserSummary;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::{Notice, redirect_success};

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/{id}/activate", post(activate))
        .route("/users/{id}/deactivate", post(deactivate))
}

/// Query parameters for the customer list.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Customer listing row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub order_count: i64,
    pub is_active: bool,
    pub joined: String,
    pub orders_url: String,
}

impl From<&UserSummary> for UserRow {
    fn from(summary: &UserSummary) -> Self {
        let user = &summary.user;
        Self {
            id: user.id,
            email: user.email.to_string(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            order_count: summary.order_count,
            is_active: user.is_active,
            joined: filters::date(user.created_at),
            orders_url: format!("/orders?q={}", urlencoding::encode(user.email.as_str())),
        }
    }
}

fn matches(row: &UserRow, needle: &str) -> bool {
    row.email.to_lowercase().contains(needle) || row.full_name.to_lowercase().contains(needle)
}

/// Customer list template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub users: Vec<UserRow>,
    pub q: String,
}

/// Customer list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<UsersTemplate> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default().to_string();
    let needle = q.to_lowercase();

    let users = UserRepository::new(state.pool())
        .list()
        .await?
        .iter()
        .map(UserRow::from)
        .filter(|row| needle.is_empty() || matches(row, &needle))
        .collect();

    let (success_message, error_message) = Notice {
        success: query.success,
        error: query.error,
    }
    .into_messages();

    Ok(UsersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/users".to_string(),
        success_message,
        error_message,
        users,
        q,
    })
}

/// Allow a customer to sign in again.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn activate(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    UserRepository::new(state.pool()).set_active(id, true).await?;
    tracing::info!(user_id = %id, "customer activated");
    Ok(redirect_success("/users", "Customer activated"))
}

/// Block a customer from signing in. Their orders stay visible.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn deactivate(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    UserRepository::new(state.pool())
        .set_active(id, false)
        .await?;
    tracing::info!(user_id = %id, "customer deactivated");
    Ok(redirect_success("/users", "Customer deactivated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use solera_core::Email;
    use solera_db::models::User;

    #[test]
    fn test_user_row_links_to_orders() {
        let summary = UserSummary {
            user: User {
                id: UserId::new(4),
                email: Email::parse("ayse+yaz@example.com").unwrap_or_else(|e| panic!("{e}")),
                full_name: "Ayşe Demir".to_string(),
                phone: None,
                is_active: true,
                created_at: Utc::now(),
            },
            order_count: 3,
        };
        let row = UserRow::from(&summary);
        assert_eq!(row.orders_url, "/orders?q=ayse%2Byaz%40example.com");
        assert!(matches(&row, "demir"));
        assert!(!matches(&row, "yilmaz"));
    }
}
