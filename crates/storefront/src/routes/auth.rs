//! Authentication route handlers.
//!
//! Email and password login and registration for customers. Logging in or
//! out keeps the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use solera_db::models::User;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, Flash};
use crate::page::PageContext;
use crate::services::auth::{AuthService, Registration};
use crate::services::flash;
use crate::state::AppState;

/// Only same-site paths are accepted as a post-login destination.
#[must_use]
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path.to_string()
        }
        _ => "/account".to_string(),
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

/// `?next=` on the login and register pages.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub next: String,
    pub error: Option<String>,
}

fn session_user(user: User) -> CurrentUser {
    CurrentUser {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(ctx))]
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> Response {
    if ctx.is_logged_in() {
        return Redirect::to(&safe_next(query.next.as_deref())).into_response();
    }
    LoginTemplate {
        ctx,
        email: String::new(),
        next: safe_next(query.next.as_deref()),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, ctx, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());

    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            let current = session_user(user);
            set_current_user(&session, &current).await?;
            tracing::info!(user_id = %current.id, "customer logged in");
            flash::push(
                &session,
                Flash::info(format!("Welcome back, {}", current.first_name())),
            )
            .await?;
            Ok(Redirect::to(&next).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            if err.status().is_server_error() {
                return Err(err);
            }
            tracing::info!(reason = %err, "login rejected");
            Ok(LoginTemplate {
                ctx,
                email: form.email,
                next,
                error: Some(err.public_message()),
            }
            .into_response())
        }
    }
}

/// Log the customer out, keeping the cart.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    flash::push(&session, Flash::info("You have been logged out")).await?;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(ctx))]
pub async fn register_page(ctx: PageContext, Query(query): Query<NextQuery>) -> Response {
    if ctx.is_logged_in() {
        return Redirect::to("/account").into_response();
    }
    RegisterTemplate {
        ctx,
        email: String::new(),
        full_name: String::new(),
        phone: String::new(),
        next: safe_next(query.next.as_deref()),
        error: None,
    }
    .into_response()
}

/// Handle registration form submission. A new account is logged in at once.
#[instrument(skip(state, session, ctx, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());
    let registration = Registration {
        email: form.email.clone(),
        full_name: form.full_name.clone(),
        phone: form.phone.clone().filter(|p| !p.trim().is_empty()),
        password: form.password,
        password_confirm: form.password_confirm,
    };

    match AuthService::new(state.pool()).register(&registration).await {
        Ok(user) => {
            let current = session_user(user);
            set_current_user(&session, &current).await?;
            tracing::info!(user_id = %current.id, "customer registered");
            flash::push(
                &session,
                Flash::info(format!("Welcome to Solera, {}", current.first_name())),
            )
            .await?;
            Ok(Redirect::to(&next).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            if err.status().is_server_error() {
                return Err(err);
            }
            Ok(RegisterTemplate {
                ctx,
                email: form.email,
                full_name: form.full_name,
                phone: form.phone.unwrap_or_default(),
                next,
                error: Some(err.public_message()),
            }
            .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/checkout/contact")), "/checkout/contact");
        assert_eq!(safe_next(Some("/account/orders")), "/account/orders");
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("https://evil.example")), "/account");
        assert_eq!(safe_next(Some("//evil.example")), "/account");
        assert_eq!(safe_next(Some("/\\evil.example")), "/account");
        assert_eq!(safe_next(None), "/account");
    }
}
