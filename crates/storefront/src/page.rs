//! Per-request data every full page layout needs.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use solera_db::models::StoreSettings;

use crate::middleware::CspNonce;
use crate::models::{CurrentUser, Flash, session_keys};
use crate::services::{cart::SessionCart, flash};
use crate::state::AppState;

/// Layout data: header, footer, cart badge and flash message.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub nonce: String,
    pub store_name: String,
    pub announcement: Option<String>,
    pub contact_email: String,
    pub contact_phone: String,
    pub cart_count: u32,
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub settings: StoreSettings,
}

impl PageContext {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.user.as_ref().map_or("", CurrentUser::first_name)
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let settings = state.settings().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "store settings unavailable, using defaults");
            StoreSettings::default()
        });

        let (cart_count, user, flash) = match parts.extensions.get::<Session>() {
            Some(session) => (
                SessionCart::load(session).await.item_count(),
                session
                    .get::<CurrentUser>(session_keys::CURRENT_USER)
                    .await
                    .ok()
                    .flatten(),
                flash::take(session).await,
            ),
            None => (0, None, None),
        };

        Ok(Self {
            nonce,
            store_name: settings.store_name.clone(),
            announcement: settings.announcement.clone().filter(|a| !a.trim().is_empty()),
            contact_email: settings.contact_email.clone(),
            contact_phone: settings.contact_phone.clone(),
            cart_count,
            user,
            flash,
            settings,
        })
    }
}
