//! Store settings route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use solera_core::checkout::FieldError;
use solera_core::{CurrencyCode, Email};
use solera_db::SettingsRepository;
use solera_db::models::StoreSettings;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, amount_text, describe, optional_text};
use super::{Notice, redirect_success};

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(show).post(update))
}

/// Settings form, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub store_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub currency: String,
    pub flat_shipping_rate: String,
    pub free_shipping_threshold: String,
    pub announcement: String,
    pub low_stock_threshold: String,
}

impl From<&StoreSettings> for SettingsForm {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            contact_email: settings.contact_email.clone(),
            contact_phone: settings.contact_phone.clone(),
            currency: settings.currency.code().to_string(),
            flat_shipping_rate: settings.flat_shipping_rate.to_string(),
            free_shipping_threshold: amount_text(settings.free_shipping_threshold),
            announcement: settings.announcement.clone().unwrap_or_default(),
            low_stock_threshold: settings.low_stock_threshold.to_string(),
        }
    }
}

impl SettingsForm {
    /// Validate and convert into settings.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_settings(&self) -> std::result::Result<StoreSettings, Vec<FieldError>> {
        let mut errors = FormErrors::new();

        let store_name = errors.required("store_name", &self.store_name);
        let contact_email = match Email::parse(self.contact_email.trim()) {
            Ok(email) => email.into_inner(),
            Err(e) => {
                errors.add("contact_email", e.to_string());
                String::new()
            }
        };
        let currency = self.currency.parse::<CurrencyCode>().unwrap_or_else(|_| {
            errors.add("currency", "is not supported");
            CurrencyCode::default()
        });
        let flat_shipping_rate = errors.decimal("flat_shipping_rate", &self.flat_shipping_rate);
        let free_shipping_threshold =
            errors.optional_decimal("free_shipping_threshold", &self.free_shipping_threshold);
        let low_stock_threshold = errors.integer("low_stock_threshold", &self.low_stock_threshold, 3);
        if low_stock_threshold < 0 {
            errors.add("low_stock_threshold", "cannot be negative");
        }

        errors.finish(StoreSettings {
            store_name,
            contact_email,
            contact_phone: self.contact_phone.trim().to_string(),
            currency,
            flat_shipping_rate,
            free_shipping_threshold,
            announcement: optional_text(&self.announcement),
            low_stock_threshold,
        })
    }
}

/// Currency select option.
#[derive(Debug, Clone)]
pub struct CurrencyOption {
    pub code: &'static str,
    pub label: String,
    pub selected: bool,
}

fn currency_options(selected: &str) -> Vec<CurrencyOption> {
    CurrencyCode::ALL
        .into_iter()
        .map(|currency| CurrencyOption {
            code: currency.code(),
            label: format!("{} ({})", currency.code(), currency.symbol()),
            selected: currency.code() == selected,
        })
        .collect()
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub form: SettingsForm,
    pub currencies: Vec<CurrencyOption>,
}

impl SettingsTemplate {
    fn new(admin: &CurrentAdmin, form: SettingsForm, notice: Notice) -> Self {
        let (success_message, error_message) = notice.into_messages();
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/settings".to_string(),
            success_message,
            error_message,
            currencies: currency_options(&form.currency),
            form,
        }
    }
}

/// Settings page handler.
#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<SettingsTemplate> {
    let settings = SettingsRepository::new(state.pool()).load().await?;
    Ok(SettingsTemplate::new(
        &admin,
        SettingsForm::from(&settings),
        notice,
    ))
}

/// Save store settings.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    match form.to_settings() {
        Ok(settings) => {
            SettingsRepository::new(state.pool()).save(&settings).await?;
            tracing::info!("store settings saved");
            Ok(redirect_success("/settings", "Settings saved").into_response())
        }
        Err(errors) => {
            let notice = Notice {
                success: None,
                error: Some(describe(&errors)),
            };
            Ok(SettingsTemplate::new(&admin, form, notice).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_form_round_trips_defaults() {
        let defaults = StoreSettings::default();
        let form = SettingsForm::from(&defaults);
        assert_eq!(
            form.to_settings().unwrap_or_else(|e| panic!("{e:?}")),
            defaults
        );
    }

    #[test]
    fn test_blank_threshold_disables_free_shipping() {
        let form = SettingsForm {
            free_shipping_threshold: String::new(),
            flat_shipping_rate: "59,90".to_string(),
            ..SettingsForm::from(&StoreSettings::default())
        };
        let settings = form.to_settings().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(settings.free_shipping_threshold, None);
        assert_eq!(settings.flat_shipping_rate, Decimal::new(5990, 2));
    }

    #[test]
    fn test_rejects_unknown_currency_and_bad_email() {
        let form = SettingsForm {
            currency: "JPY".to_string(),
            contact_email: "not-an-email".to_string(),
            ..SettingsForm::from(&StoreSettings::default())
        };
        let fields: Vec<_> = form
            .to_settings()
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["contact_email", "currency"]);
    }

    #[test]
    fn test_currency_options_mark_selection() {
        let options = currency_options("EUR");
        assert_eq!(options.len(), 4);
        assert!(options.iter().any(|o| o.selected && o.code == "EUR"));
    }
}
