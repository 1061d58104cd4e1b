//! JSON API route handlers for admin.
//!
//! Same session and roles as the HTML panel. An expired session gets a 401
//! instead of a login redirect. Errors come back as `{"error": "..."}`.

pub mod orders;
pub mod stats;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use solera_db::RepositoryError;
use solera_db::models::StatusUpdateError;

use crate::error::AppError;
use crate::state::AppState;

/// Error response for API endpoints.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            error: msg.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.report();
        Self::new(err.status(), err.public_message())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        AppError::from(err).into()
    }
}

impl From<StatusUpdateError> for ApiError {
    fn from(err: StatusUpdateError) -> Self {
        AppError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Build the API router, nested under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats::show))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_hides_internal_details() {
        let err = ApiError::from(RepositoryError::DataCorruption("row 9".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error, "Internal server error");
    }

    #[test]
    fn test_api_error_status() {
        let err = ApiError::from(AppError::NotFound("Order 7 not found".to_string()));
        assert_eq!(err.error, "Order 7 not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let conflict = ApiError::from(RepositoryError::Conflict("Slug taken".to_string()));
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_api_error_body_has_only_message() {
        let err = ApiError::new(StatusCode::FORBIDDEN, "Read-only access");
        let body = serde_json::to_value(&err).unwrap_or_default();
        assert_eq!(body, serde_json::json!({"error": "Read-only access"}));
    }
}
