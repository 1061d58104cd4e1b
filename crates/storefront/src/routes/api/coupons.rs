//! Coupon API: check a code against the session cart without applying it.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use solera_core::pricing::CouponError;
use solera_db::repos::normalize_coupon_code;

use crate::routes::api::ApiError;
use crate::services::cart::{self, PricedCart, SessionCart};
use crate::state::AppState;

/// POST /api/coupons/validate body.
#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
}

/// POST /api/coupons/validate response.
#[derive(Debug, Serialize)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub code: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CouponError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidateCouponResponse {
    fn new(code: String, priced: &PricedCart) -> Self {
        let totals = &priced.totals;
        Self {
            valid: totals.coupon_error.is_none(),
            code,
            subtotal: totals.subtotal,
            discount: totals.discount,
            shipping: totals.shipping,
            total: totals.total,
            message: totals.coupon_error.as_ref().map(ToString::to_string),
            reason: totals.coupon_error.clone(),
        }
    }
}

/// Check a coupon code against the current cart.
///
/// POST /api/coupons/validate
///
/// The code is not stored in the session; applying it goes through the
/// cart form.
#[instrument(skip(state, session, req))]
pub async fn validate(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, ApiError> {
    let code = normalize_coupon_code(&req.code);
    if code.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Enter a coupon code",
        ));
    }

    let settings = state.settings().await?;
    let mut session_cart = SessionCart::load(&session).await;
    let priced = cart::price(state.pool(), &mut session_cart, Some(&code), &settings).await?;

    tracing::debug!(code = %code, valid = priced.totals.coupon_error.is_none(), "coupon checked");
    Ok(Json(ValidateCouponResponse::new(code, &priced)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use solera_db::models::StoreSettings;

    #[test]
    fn test_unknown_coupon_reports_reason() {
        let settings = StoreSettings::default();
        let priced = cart::assemble(
            &SessionCart::default(),
            &[],
            Some(("NOPE", None)),
            &settings,
            chrono::Utc::now(),
        );
        let response = ValidateCouponResponse::new("NOPE".to_string(), &priced);
        assert!(!response.valid);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["reason"]["reason"], "not_found");
        assert_eq!(json["message"], "coupon not found");
    }
}
