//! Home page banner route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use solera_core::BannerId;
use solera_core::checkout::FieldError;
use solera_db::BannerRepository;
use solera_db::models::{Banner, BannerInput};

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, checkbox, describe, optional_text};
use super::{Notice, redirect_error, redirect_success};

const INDEX_PATH: &str = "/banners";

/// Build the banners router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/banners", get(index).post(create))
        .route("/banners/{id}", post(update))
        .route("/banners/{id}/delete", post(delete))
}

/// Banner form. Schedule fields come from `datetime-local` inputs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BannerForm {
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub link_url: String,
    pub position: String,
    pub is_active: Option<String>,
    pub starts_at: String,
    pub ends_at: String,
}

impl BannerForm {
    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self) -> std::result::Result<BannerInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();
        let title = errors.required("title", &self.title);
        let image_url = errors.required("image_url", &self.image_url);
        let position = errors.integer("position", &self.position, 0);
        let starts_at = errors.optional_datetime("starts_at", &self.starts_at);
        let ends_at = errors.optional_datetime("ends_at", &self.ends_at);
        errors.date_range("ends_at", starts_at, ends_at);

        errors.finish(BannerInput {
            title,
            subtitle: optional_text(&self.subtitle),
            image_url,
            link_url: optional_text(&self.link_url),
            position,
            is_active: checkbox(self.is_active.as_ref()),
            starts_at,
            ends_at,
        })
    }
}

/// Banner row with its edit form values.
#[derive(Debug, Clone)]
pub struct BannerRow {
    pub id: BannerId,
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub link_url: String,
    pub position: i32,
    pub is_active: bool,
    pub is_live: bool,
    pub starts_at: String,
    pub ends_at: String,
}

impl From<&Banner> for BannerRow {
    fn from(banner: &Banner) -> Self {
        Self {
            id: banner.id,
            title: banner.title.clone(),
            subtitle: banner.subtitle.clone().unwrap_or_default(),
            image_url: banner.image_url.clone(),
            link_url: banner.link_url.clone().unwrap_or_default(),
            position: banner.position,
            is_active: banner.is_active,
            is_live: banner.is_live(Utc::now()),
            starts_at: filters::datetime_local(banner.starts_at),
            ends_at: filters::datetime_local(banner.ends_at),
        }
    }
}

/// Banner list template.
#[derive(Template, WebTemplate)]
#[template(path = "banners/index.html")]
pub struct BannersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub banners: Vec<BannerRow>,
}

/// Banner list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<BannersTemplate> {
    let banners = BannerRepository::new(state.pool()).list_all().await?;
    let (success_message, error_message) = notice.into_messages();

    Ok(BannersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: INDEX_PATH.to_string(),
        success_message,
        error_message,
        banners: banners.iter().map(BannerRow::from).collect(),
    })
}

/// Create a banner.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(form): Form<BannerForm>,
) -> Result<Redirect> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(redirect_error(INDEX_PATH, &describe(&errors))),
    };
    let banner = BannerRepository::new(state.pool()).create(&input).await?;
    tracing::info!(banner_id = %banner.id, "banner created");
    Ok(redirect_success(INDEX_PATH, "Banner created"))
}

/// Update a banner.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
    Form(form): Form<BannerForm>,
) -> Result<Redirect> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(redirect_error(INDEX_PATH, &describe(&errors))),
    };
    BannerRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(redirect_success(INDEX_PATH, "Banner saved"))
}

/// Delete a banner.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
) -> Result<Redirect> {
    BannerRepository::new(state.pool()).delete(id).await?;
    tracing::info!(banner_id = %id, "banner deleted");
    Ok(redirect_success(INDEX_PATH, "Banner deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> BannerForm {
        BannerForm {
            title: "Yaz Koleksiyonu".to_string(),
            image_url: "/static/img/banners/summer.jpg".to_string(),
            is_active: Some("on".to_string()),
            ..BannerForm::default()
        }
    }

    #[test]
    fn test_unscheduled_banner() {
        let input = form().to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert!(input.is_active);
        assert_eq!(input.starts_at, None);
        assert_eq!(input.link_url, None);
    }

    #[test]
    fn test_schedule_must_end_after_start() {
        let banner = BannerForm {
            starts_at: "2026-06-01T09:00".to_string(),
            ends_at: "2026-05-01T09:00".to_string(),
            ..form()
        };
        let errors = banner.to_input().err().unwrap_or_default();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.field), Some("ends_at"));
    }

    #[test]
    fn test_bad_datetime_is_reported() {
        let banner = BannerForm {
            starts_at: "tomorrow".to_string(),
            ..form()
        };
        assert!(banner.to_input().is_err());
    }
}
