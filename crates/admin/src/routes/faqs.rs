//! FAQ entry route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use solera_core::FaqId;
use solera_core::checkout::FieldError;
use solera_db::FaqRepository;
use solera_db::models::{Faq, FaqInput};

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, checkbox, describe};
use super::{Notice, redirect_error, redirect_success};

const INDEX_PATH: &str = "/faqs";

/// Build the FAQ router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/faqs", get(index).post(create))
        .route("/faqs/{id}", post(update))
        .route("/faqs/{id}/delete", post(delete))
}

/// FAQ form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FaqForm {
    pub question: String,
    pub answer: String,
    pub sort_order: String,
    pub is_active: Option<String>,
}

impl FaqForm {
    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self) -> std::result::Result<FaqInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();
        let question = errors.required("question", &self.question);
        let answer = errors.required("answer", &self.answer);
        let sort_order = errors.integer("sort_order", &self.sort_order, 0);

        errors.finish(FaqInput {
            question,
            answer,
            sort_order,
            is_active: checkbox(self.is_active.as_ref()),
        })
    }
}

/// FAQ list template.
#[derive(Template, WebTemplate)]
#[template(path = "faqs/index.html")]
pub struct FaqsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub faqs: Vec<Faq>,
}

/// FAQ list handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<FaqsTemplate> {
    let faqs = FaqRepository::new(state.pool()).list_all().await?;
    let (success_message, error_message) = notice.into_messages();

    Ok(FaqsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: INDEX_PATH.to_string(),
        success_message,
        error_message,
        faqs,
    })
}

/// Create a FAQ entry.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(form): Form<FaqForm>,
) -> Result<Redirect> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(redirect_error(INDEX_PATH, &describe(&errors))),
    };
    FaqRepository::new(state.pool()).create(&input).await?;
    Ok(redirect_success(INDEX_PATH, "Question added"))
}

/// Update a FAQ entry.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<FaqId>,
    Form(form): Form<FaqForm>,
) -> Result<Redirect> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(redirect_error(INDEX_PATH, &describe(&errors))),
    };
    FaqRepository::new(state.pool()).update(id, &input).await?;
    Ok(redirect_success(INDEX_PATH, "Question saved"))
}

/// Delete a FAQ entry.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<FaqId>,
) -> Result<Redirect> {
    FaqRepository::new(state.pool()).delete(id).await?;
    Ok(redirect_success(INDEX_PATH, "Question deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faq_form() {
        let form = FaqForm {
            question: "  Kargo ücreti ne kadar? ".to_string(),
            answer: "750 TL üzeri ücretsiz.".to_string(),
            sort_order: "2".to_string(),
            is_active: Some("on".to_string()),
        };
        let input = form.to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.question, "Kargo ücreti ne kadar?");
        assert_eq!(input.sort_order, 2);
        assert!(input.is_active);
    }

    #[test]
    fn test_faq_form_requires_answer() {
        let form = FaqForm {
            question: "Q".to_string(),
            ..FaqForm::default()
        };
        assert!(form.to_input().is_err());
    }
}
