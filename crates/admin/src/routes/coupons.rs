//! Coupon management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use solera_core::checkout::FieldError;
use solera_core::{CouponId, CouponKind, CurrencyCode};
use solera_db::models::{Coupon, CouponInput};
use solera_db::repos::normalize_coupon_code;
use solera_db::{CouponRepository, RepositoryError, SettingsRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, amount_text, checkbox, describe};
use super::{Notice, redirect_success};

/// Longest coupon code accepted.
const MAX_CODE_LENGTH: usize = 32;

/// Build the coupons router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/coupons", get(index).post(create))
        .route("/coupons/new", get(new))
        .route("/coupons/{id}", get(edit).post(update))
        .route("/coupons/{id}/delete", post(delete))
}

// =============================================================================
// Form
// =============================================================================

/// Coupon form, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CouponForm {
    pub code: String,
    pub kind: String,
    pub value: String,
    pub min_subtotal: String,
    pub max_discount: String,
    pub usage_limit: String,
    pub starts_at: String,
    pub ends_at: String,
    pub is_active: Option<String>,
}

impl From<&Coupon> for CouponForm {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            kind: coupon.kind.as_str().to_string(),
            value: coupon.value.to_string(),
            min_subtotal: amount_text(coupon.min_subtotal),
            max_discount: amount_text(coupon.max_discount),
            usage_limit: coupon
                .usage_limit
                .map(|limit| limit.to_string())
                .unwrap_or_default(),
            starts_at: filters::datetime_local(coupon.starts_at),
            ends_at: filters::datetime_local(coupon.ends_at),
            is_active: coupon.is_active.then(|| "on".to_string()),
        }
    }
}

impl CouponForm {
    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self) -> std::result::Result<CouponInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();

        let code = normalize_coupon_code(&self.code);
        if code.is_empty() {
            errors.add("code", "is required");
        } else if code.chars().count() > MAX_CODE_LENGTH
            || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.add(
                "code",
                format!("use up to {MAX_CODE_LENGTH} letters, digits, - or _"),
            );
        }

        let kind = self.kind.parse::<CouponKind>().unwrap_or_else(|_| {
            errors.add("kind", "choose percentage or fixed amount");
            CouponKind::Fixed
        });
        let value = errors.decimal("value", &self.value);
        if value.is_zero() && !self.value.trim().is_empty() {
            errors.add("value", "must be greater than zero");
        }
        if kind == CouponKind::Percentage && value > Decimal::ONE_HUNDRED {
            errors.add("value", "a percentage cannot exceed 100");
        }

        let min_subtotal = errors.optional_decimal("min_subtotal", &self.min_subtotal);
        let max_discount = errors.optional_decimal("max_discount", &self.max_discount);
        let usage_limit = errors.optional_integer("usage_limit", &self.usage_limit);
        if usage_limit.is_some_and(|limit| limit < 1) {
            errors.add("usage_limit", "must be at least 1");
        }
        let starts_at = errors.optional_datetime("starts_at", &self.starts_at);
        let ends_at = errors.optional_datetime("ends_at", &self.ends_at);
        errors.date_range("ends_at", starts_at, ends_at);

        errors.finish(CouponInput {
            code,
            kind,
            value,
            min_subtotal,
            max_discount,
            usage_limit,
            starts_at,
            ends_at,
            is_active: checkbox(self.is_active.as_ref()),
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Coupon listing row.
#[derive(Debug, Clone)]
pub struct CouponRow {
    pub url: String,
    pub code: String,
    pub discount: String,
    pub minimum: String,
    pub usage: String,
    pub window: String,
    pub state: &'static str,
    pub state_class: &'static str,
}

impl CouponRow {
    fn new(coupon: &Coupon, currency: CurrencyCode) -> Self {
        let discount = match coupon.kind {
            CouponKind::Percentage => {
                let mut text = format!("{}%", coupon.value.normalize());
                if let Some(cap) = coupon.max_discount {
                    text.push_str(&format!(" (max {})", filters::price(cap, currency)));
                }
                text
            }
            CouponKind::Fixed => filters::price(coupon.value, currency),
        };
        let usage = coupon.usage_limit.map_or_else(
            || coupon.used_count.to_string(),
            |limit| format!("{} / {limit}", coupon.used_count),
        );
        let window = match (coupon.starts_at, coupon.ends_at) {
            (None, None) => "Always".to_string(),
            (Some(start), None) => format!("From {}", filters::date(start)),
            (None, Some(end)) => format!("Until {}", filters::date(end)),
            (Some(start), Some(end)) => {
                format!("{} to {}", filters::date(start), filters::date(end))
            }
        };
        let (state, state_class) = coupon_state(coupon);

        Self {
            url: format!("/coupons/{}", coupon.id),
            code: coupon.code.clone(),
            discount,
            minimum: coupon
                .min_subtotal
                .map(|min| filters::price(min, currency))
                .unwrap_or_default(),
            usage,
            window,
            state,
            state_class,
        }
    }
}

/// Label and badge class describing whether a coupon can be redeemed now.
fn coupon_state(coupon: &Coupon) -> (&'static str, &'static str) {
    let now = Utc::now();
    if !coupon.is_active {
        ("Disabled", "badge-muted")
    } else if coupon.starts_at.is_some_and(|start| now < start) {
        ("Scheduled", "badge-info")
    } else if coupon.ends_at.is_some_and(|end| end < now) {
        ("Expired", "badge-muted")
    } else if coupon
        .usage_limit
        .is_some_and(|limit| coupon.used_count >= limit)
    {
        ("Used up", "badge-warning")
    } else {
        ("Live", "badge-success")
    }
}

/// Coupon list template.
#[derive(Template, WebTemplate)]
#[template(path = "coupons/index.html")]
pub struct CouponsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub coupons: Vec<CouponRow>,
}

/// New/edit coupon template.
#[derive(Template, WebTemplate)]
#[template(path = "coupons/form.html")]
pub struct CouponFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub coupon_id: Option<CouponId>,
    pub used_count: i32,
    pub form: CouponForm,
    pub currency_symbol: &'static str,
}

async fn form_page(
    state: &AppState,
    admin: &CurrentAdmin,
    coupon: Option<&Coupon>,
    form: CouponForm,
    notice: Notice,
) -> Result<CouponFormTemplate> {
    let currency = SettingsRepository::new(state.pool()).load().await?.currency;
    let (success_message, error_message) = notice.into_messages();

    Ok(CouponFormTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: "/coupons".to_string(),
        success_message,
        error_message,
        coupon_id: coupon.map(|c| c.id),
        used_count: coupon.map_or(0, |c| c.used_count),
        form,
        currency_symbol: currency.symbol(),
    })
}

fn failed(message: String) -> Notice {
    Notice {
        success: None,
        error: Some(message),
    }
}

async fn load(state: &AppState, id: CouponId) -> Result<Coupon> {
    CouponRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Coupon {id} not found")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Coupon list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<CouponsIndexTemplate> {
    let currency = SettingsRepository::new(state.pool()).load().await?.currency;
    let coupons = CouponRepository::new(state.pool()).list().await?;
    let (success_message, error_message) = notice.into_messages();

    Ok(CouponsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/coupons".to_string(),
        success_message,
        error_message,
        coupons: coupons.iter().map(|c| CouponRow::new(c, currency)).collect(),
    })
}

/// New coupon page handler.
#[instrument(skip(admin, state))]
pub async fn new(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
) -> Result<CouponFormTemplate> {
    let form = CouponForm {
        kind: CouponKind::Percentage.as_str().to_string(),
        is_active: Some("on".to_string()),
        ..CouponForm::default()
    };
    form_page(&state, &admin, None, form, Notice::default()).await
}

/// Create a coupon.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let message = match form.to_input() {
        Ok(input) => match CouponRepository::new(state.pool()).create(&input).await {
            Ok(coupon) => {
                tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "coupon created");
                return Ok(
                    redirect_success("/coupons", &format!("Coupon {} created", coupon.code))
                        .into_response(),
                );
            }
            Err(RepositoryError::Conflict(message)) => message,
            Err(e) => return Err(e.into()),
        },
        Err(errors) => describe(&errors),
    };

    Ok(form_page(&state, &admin, None, form, failed(message))
        .await?
        .into_response())
}

/// Edit coupon page handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
    Query(notice): Query<Notice>,
) -> Result<CouponFormTemplate> {
    let coupon = load(&state, id).await?;
    let form = CouponForm::from(&coupon);
    form_page(&state, &admin, Some(&coupon), form, notice).await
}

/// Update a coupon. The usage count is left alone.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let coupon = load(&state, id).await?;

    let message = match form.to_input() {
        Ok(input) => match CouponRepository::new(state.pool()).update(id, &input).await {
            Ok(saved) => {
                return Ok(
                    redirect_success("/coupons", &format!("Coupon {} saved", saved.code))
                        .into_response(),
                );
            }
            Err(RepositoryError::Conflict(message)) => message,
            Err(e) => return Err(e.into()),
        },
        Err(errors) => describe(&errors),
    };

    Ok(form_page(&state, &admin, Some(&coupon), form, failed(message))
        .await?
        .into_response())
}

/// Delete a coupon. Orders keep the code they were placed with.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<Redirect> {
    CouponRepository::new(state.pool()).delete(id).await?;
    tracing::info!(coupon_id = %id, "coupon deleted");
    Ok(redirect_success("/coupons", "Coupon deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn form() -> CouponForm {
        CouponForm {
            code: " yaz10 ".to_string(),
            kind: "percentage".to_string(),
            value: "10".to_string(),
            is_active: Some("on".to_string()),
            ..CouponForm::default()
        }
    }

    fn coupon() -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "YAZ10".to_string(),
            kind: CouponKind::Percentage,
            value: Decimal::new(10, 0),
            min_subtotal: None,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            starts_at: None,
            ends_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_code_is_normalized() {
        let input = form().to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.code, "YAZ10");
        assert_eq!(input.kind, CouponKind::Percentage);
        assert_eq!(input.usage_limit, None);
    }

    #[test]
    fn test_percentage_over_hundred_rejected() {
        let coupon = CouponForm {
            value: "120".to_string(),
            ..form()
        };
        let errors = coupon.to_input().err().unwrap_or_default();
        assert_eq!(errors.first().map(|e| e.field), Some("value"));

        let fixed = CouponForm {
            kind: "fixed".to_string(),
            value: "120".to_string(),
            ..form()
        };
        assert!(fixed.to_input().is_ok());
    }

    #[test]
    fn test_code_characters() {
        let coupon = CouponForm {
            code: "YAZ 10!".to_string(),
            ..form()
        };
        assert!(coupon.to_input().is_err());
    }

    #[test]
    fn test_usage_limit_must_be_positive() {
        let coupon = CouponForm {
            usage_limit: "0".to_string(),
            ..form()
        };
        assert!(coupon.to_input().is_err());
    }

    #[test]
    fn test_coupon_state() {
        assert_eq!(coupon_state(&coupon()).0, "Live");

        let mut used_up = coupon();
        used_up.usage_limit = Some(5);
        used_up.used_count = 5;
        assert_eq!(coupon_state(&used_up).0, "Used up");

        let mut expired = coupon();
        expired.ends_at = Some(Utc::now() - Duration::days(1));
        assert_eq!(coupon_state(&expired).0, "Expired");

        let mut disabled = expired;
        disabled.is_active = false;
        assert_eq!(coupon_state(&disabled).0, "Disabled");
    }

    #[test]
    fn test_coupon_row_describes_discount() {
        let mut capped = coupon();
        capped.max_discount = Some(Decimal::new(250, 0));
        capped.usage_limit = Some(100);
        capped.used_count = 12;
        let row = CouponRow::new(&capped, CurrencyCode::TRY);
        assert_eq!(row.discount, "10% (max ₺250.00)");
        assert_eq!(row.usage, "12 / 100");
        assert_eq!(row.window, "Always");
    }
}
