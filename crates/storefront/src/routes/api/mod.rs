//! JSON API route handlers.
//!
//! Errors come back as `{"error": "..."}` with the status the HTML routes
//! would use.

pub mod coupons;
pub mod locations;
pub mod orders;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use solera_db::RepositoryError;
use solera_db::models::PlaceOrderError;

use crate::error::AppError;
use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Error response for API endpoints.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldMessage>,
}

/// One invalid field.
#[derive(Debug, Serialize)]
pub struct FieldMessage {
    pub field: &'static str,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            error: msg.into(),
            fields: Vec::new(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.report();
        let mut api = Self::new(err.status(), err.public_message());
        if let AppError::Validation(errors) = err {
            api.error = "Validation failed".to_string();
            api.fields = errors
                .into_iter()
                .map(|e| FieldMessage {
                    field: e.field,
                    message: e.message,
                })
                .collect();
        }
        api
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        AppError::from(err).into()
    }
}

impl From<Arc<RepositoryError>> for ApiError {
    fn from(err: Arc<RepositoryError>) -> Self {
        AppError::from(err).into()
    }
}

impl From<PlaceOrderError> for ApiError {
    fn from(err: PlaceOrderError) -> Self {
        AppError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Build the API router.
///
/// Order creation and coupon validation are rate limited per client IP.
pub fn router() -> Router<AppState> {
    let limited = Router::new()
        .route("/orders", post(orders::create))
        .route("/coupons/validate", post(coupons::validate))
        .layer(api_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/orders/{token}", get(orders::show))
        .route("/locations/cities", get(locations::cities))
        .route("/locations/cities/{id}/districts", get(locations::districts))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_keeps_status_and_hides_details() {
        let err = ApiError::from(RepositoryError::DataCorruption("row 9".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error, "Internal server error");

        let err = ApiError::from(AppError::NotFound("Order not found".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_lists_fields() {
        let err = ApiError::from(AppError::Validation(vec![
            solera_core::checkout::FieldError {
                field: "email",
                message: "invalid email".to_string(),
            },
        ]));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["fields"][0]["field"], "email");
    }
}
