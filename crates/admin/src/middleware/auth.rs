//! Authentication middleware and extractors for admin.
//!
//! Provides extractors for requiring admin authentication in route handlers.
//! The session only identifies the admin; every authenticated request
//! re-reads the account so deleted admins and role changes take effect
//! immediately.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use solera_db::AdminUserRepository;

use crate::error::set_sentry_user;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Extractor for handlers that change data. Viewers get 403 Forbidden.
pub struct RequireWriteAccess(pub CurrentAdmin);

/// Extractor that requires super admin authentication.
///
/// If the admin is not logged in, redirects to login.
/// If the admin is not a super admin, returns 403 Forbidden.
pub struct RequireSuperAdmin(pub CurrentAdmin);

/// Error returned when an admin extractor rejects the request.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Logged in but the role does not allow this.
    Forbidden(&'static str),
    /// Session store or database failure.
    Internal,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message).into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

fn not_logged_in(parts: &Parts) -> AdminAuthRejection {
    // Nested routers see a stripped URI
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |OriginalUri(uri)| uri.path());
    if path.starts_with("/api/") {
        AdminAuthRejection::Unauthorized
    } else {
        AdminAuthRejection::RedirectToLogin
    }
}

/// Load the session admin and confirm the account still exists.
async fn authenticate(
    parts: &Parts,
    state: &AppState,
) -> Result<CurrentAdmin, AdminAuthRejection> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;

    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| not_logged_in(parts))?;

    let stored = AdminUserRepository::new(state.pool())
        .get_by_id(admin.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, admin_id = %admin.id, "failed to re-check admin");
            AdminAuthRejection::Internal
        })?;

    let Some(stored) = stored else {
        tracing::warn!(admin_id = %admin.id, "session admin no longer exists");
        let _ = clear_current_admin(session).await;
        return Err(not_logged_in(parts));
    };

    let current = CurrentAdmin::from(stored);
    if current.role != admin.role || current.name != admin.name {
        set_current_admin(session, &current)
            .await
            .map_err(|_| AdminAuthRejection::Internal)?;
    }

    set_sentry_user(current.id.as_i32(), Some(current.email.as_str()));
    Ok(current)
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireWriteAccess {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let admin = authenticate(parts, state).await?;
        if !admin.can_write() {
            return Err(AdminAuthRejection::Forbidden(
                "Your role has read-only access",
            ));
        }
        Ok(Self(admin))
    }
}

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let admin = authenticate(parts, state).await?;
        if !admin.is_super_admin() {
            return Err(AdminAuthRejection::Forbidden(
                "Only super admins can access this resource",
            ));
        }
        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdminAuth`, this does not reject the request if the admin
/// is not logged in and does not touch the database.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_for(path: &str) -> Parts {
        Request::builder().uri(path).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_api_paths_get_401_not_redirect() {
        assert!(matches!(
            not_logged_in(&parts_for("/api/orders")),
            AdminAuthRejection::Unauthorized
        ));
        assert!(matches!(
            not_logged_in(&parts_for("/orders")),
            AdminAuthRejection::RedirectToLogin
        ));
    }

    #[test]
    fn test_forbidden_response() {
        let response = AdminAuthRejection::Forbidden("nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
