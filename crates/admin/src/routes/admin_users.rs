//! Admin user management route handlers.
//!
//! Super admin only. New admins get a password chosen by the super admin;
//! there is no invite email.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use solera_core::{AdminRole, AdminUserId};
use solera_db::AdminUserRepository;
use solera_db::models::AdminUser;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireSuperAdmin;
use crate::services::AdminAuthService;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::{Notice, redirect_error, redirect_success};

const INDEX_PATH: &str = "/admin-users";

/// Build the admin users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin-users", get(index).post(create))
        .route("/admin-users/{id}/delete", post(delete))
}

/// New admin form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewAdminForm {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: String,
}

/// Admin listing row.
#[derive(Debug, Clone)]
pub struct AdminRow {
    pub id: AdminUserId,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub created: String,
    pub is_self: bool,
}

/// Human label for a role.
const fn role_label(role: AdminRole) -> &'static str {
    match role {
        AdminRole::SuperAdmin => "Super admin",
        AdminRole::Admin => "Admin",
        AdminRole::Viewer => "Viewer",
    }
}

impl AdminRow {
    fn new(admin: &AdminUser, current: AdminUserId) -> Self {
        Self {
            id: admin.id,
            name: admin.name.clone(),
            email: admin.email.to_string(),
            role: role_label(admin.role),
            created: filters::date(admin.created_at),
            is_self: admin.id == current,
        }
    }
}

/// Admin users page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin_users/index.html")]
pub struct AdminUsersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub admins: Vec<AdminRow>,
}

/// Admin users list handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<AdminUsersTemplate> {
    let admins = AdminUserRepository::new(state.pool()).list_all().await?;
    let (success_message, error_message) = notice.into_messages();

    Ok(AdminUsersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: INDEX_PATH.to_string(),
        success_message,
        error_message,
        admins: admins.iter().map(|a| AdminRow::new(a, admin.id)).collect(),
    })
}

/// Create an admin user.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Form(form): Form<NewAdminForm>,
) -> Result<Redirect> {
    let Ok(role) = form.role.parse::<AdminRole>() else {
        return Ok(redirect_error(INDEX_PATH, "Choose a role"));
    };

    match AdminAuthService::new(state.pool())
        .create_admin(&form.email, &form.name, role, &form.password)
        .await
    {
        Ok(created) => Ok(redirect_success(
            INDEX_PATH,
            &format!("Added {} as {}", created.email, role_label(created.role)),
        )),
        Err(e) => {
            let err = AppError::from(e);
            if err.status().is_server_error() {
                return Err(err);
            }
            Ok(redirect_error(INDEX_PATH, &err.public_message()))
        }
    }
}

/// Remove an admin user. A super admin cannot remove themselves, and the
/// last super admin always stays.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<AdminUserId>,
) -> Result<Redirect> {
    if id == admin.id {
        return Ok(redirect_error(INDEX_PATH, "You cannot remove your own account"));
    }

    let repo = AdminUserRepository::new(state.pool());
    let target = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Admin user {id} not found")))?;

    if target.role == AdminRole::SuperAdmin
        && repo.count_by_role(AdminRole::SuperAdmin).await? <= 1
    {
        return Ok(redirect_error(INDEX_PATH, "The last super admin cannot be removed"));
    }

    repo.delete(id).await?;
    tracing::info!(removed_admin_id = %id, "admin user removed");
    Ok(redirect_success(
        INDEX_PATH,
        &format!("Removed {}", target.email),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use solera_core::Email;

    #[test]
    fn test_admin_row_marks_self() {
        let admin = AdminUser {
            id: AdminUserId::new(2),
            email: Email::parse("deniz@solera.shop").unwrap_or_else(|e| panic!("{e}")),
            name: "Deniz".to_string(),
            role: AdminRole::Viewer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let row = AdminRow::new(&admin, AdminUserId::new(2));
        assert!(row.is_self);
        assert_eq!(row.role, "Viewer");
        assert!(!AdminRow::new(&admin, AdminUserId::new(1)).is_self);
    }
}
