//! Authentication route handlers for admin.
//!
//! Provides the login form and logout. Login posts are rate limited per
//! client IP.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalAdminAuth, clear_current_admin, login_rate_limiter, set_current_admin,
};
use crate::models::CurrentAdmin;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    let limited = Router::new()
        .route("/auth/login", post(login))
        .layer(login_rate_limiter());

    Router::new()
        .route("/auth/login", get(login_page))
        .route("/auth/logout", post(logout))
        .merge(limited)
}

/// Render the login page.
///
/// GET /auth/login
#[instrument(skip_all)]
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginPageTemplate {
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Check credentials and start an admin session.
///
/// POST /auth/login
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(admin) => {
            // New session ID on privilege change
            session.cycle_id().await?;
            set_current_admin(&session, &CurrentAdmin::from(admin)).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            if err.status().is_server_error() {
                return Err(err);
            }
            tracing::warn!(reason = %err, "admin login rejected");
            Ok(LoginPageTemplate {
                email: form.email,
                error: Some(err.public_message()),
            }
            .into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}
