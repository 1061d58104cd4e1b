//! Content page route handlers.
//!
//! Pages are written in Markdown and rendered by the storefront at
//! `/pages/{slug}`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use solera_core::PageId;
use solera_core::checkout::FieldError;
use solera_db::models::{Page, PageInput};
use solera_db::{PageRepository, RepositoryError};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, checkbox, describe};
use super::{Notice, redirect_success};

/// Build the pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", get(index).post(create))
        .route("/pages/new", get(new))
        .route("/pages/{id}", get(edit).post(update))
        .route("/pages/{id}/delete", post(delete))
}

/// Page form, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageForm {
    pub title: String,
    pub slug: String,
    pub body_markdown: String,
    pub is_published: Option<String>,
}

impl From<&Page> for PageForm {
    fn from(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            slug: page.slug.clone(),
            body_markdown: page.body_markdown.clone(),
            is_published: page.is_published.then(|| "on".to_string()),
        }
    }
}

impl PageForm {
    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self) -> std::result::Result<PageInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();
        let title = errors.required("title", &self.title);
        let slug = errors.slug("slug", &self.slug, &title);
        // Normalise line endings from the textarea
        let body_markdown = self.body_markdown.replace("\r\n", "\n");
        if body_markdown.trim().is_empty() {
            errors.add("body_markdown", "is required");
        }

        errors.finish(PageInput {
            slug,
            title,
            body_markdown,
            is_published: checkbox(self.is_published.as_ref()),
        })
    }
}

/// Page listing row.
#[derive(Debug, Clone)]
pub struct PageRow {
    pub url: String,
    pub title: String,
    pub path: String,
    pub is_published: bool,
    pub updated: String,
}

impl From<&Page> for PageRow {
    fn from(page: &Page) -> Self {
        Self {
            url: format!("/pages/{}", page.id),
            title: page.title.clone(),
            path: format!("/pages/{}", page.slug),
            is_published: page.is_published,
            updated: filters::datetime(page.updated_at),
        }
    }
}

/// Page list template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/index.html")]
pub struct PagesIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub pages: Vec<PageRow>,
}

/// New/edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/form.html")]
pub struct PageFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub page_id: Option<PageId>,
    pub form: PageForm,
    pub storefront_url: Option<String>,
}

impl PageFormTemplate {
    fn new(
        state: &AppState,
        admin: &CurrentAdmin,
        page: Option<&Page>,
        form: PageForm,
        notice: Notice,
    ) -> Self {
        let (success_message, error_message) = notice.into_messages();
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/pages".to_string(),
            success_message,
            error_message,
            page_id: page.map(|p| p.id),
            storefront_url: page
                .filter(|p| p.is_published)
                .and_then(|p| state.storefront_link(&format!("/pages/{}", p.slug))),
            form,
        }
    }
}

fn failed(message: String) -> Notice {
    Notice {
        success: None,
        error: Some(message),
    }
}

async fn load(state: &AppState, id: PageId) -> Result<Page> {
    PageRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {id} not found")))
}

/// Page list handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<PagesIndexTemplate> {
    let pages = PageRepository::new(state.pool()).list_all().await?;
    let (success_message, error_message) = notice.into_messages();

    Ok(PagesIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/pages".to_string(),
        success_message,
        error_message,
        pages: pages.iter().map(PageRow::from).collect(),
    })
}

/// New page handler.
#[instrument(skip(admin, state))]
pub async fn new(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
) -> PageFormTemplate {
    PageFormTemplate::new(&state, &admin, None, PageForm::default(), Notice::default())
}

/// Create a page.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> Result<Response> {
    let message = match form.to_input() {
        Ok(input) => match PageRepository::new(state.pool()).create(&input).await {
            Ok(page) => {
                tracing::info!(page_id = %page.id, slug = %page.slug, "page created");
                return Ok(
                    redirect_success(&format!("/pages/{}", page.id), "Page created")
                        .into_response(),
                );
            }
            Err(RepositoryError::Conflict(message)) => message,
            Err(e) => return Err(e.into()),
        },
        Err(errors) => describe(&errors),
    };

    Ok(PageFormTemplate::new(&state, &admin, None, form, failed(message)).into_response())
}

/// Edit page handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
    Query(notice): Query<Notice>,
) -> Result<PageFormTemplate> {
    let page = load(&state, id).await?;
    let form = PageForm::from(&page);
    Ok(PageFormTemplate::new(&state, &admin, Some(&page), form, notice))
}

/// Update a page.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
    Form(form): Form<PageForm>,
) -> Result<Response> {
    let page = load(&state, id).await?;

    let message = match form.to_input() {
        Ok(input) => match PageRepository::new(state.pool()).update(id, &input).await {
            Ok(_) => {
                return Ok(redirect_success(&format!("/pages/{id}"), "Page saved").into_response());
            }
            Err(RepositoryError::Conflict(message)) => message,
            Err(e) => return Err(e.into()),
        },
        Err(errors) => describe(&errors),
    };

    Ok(PageFormTemplate::new(&state, &admin, Some(&page), form, failed(message)).into_response())
}

/// Delete a page.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> Result<Redirect> {
    PageRepository::new(state.pool()).delete(id).await?;
    tracing::info!(page_id = %id, "page deleted");
    Ok(redirect_success("/pages", "Page deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_form() {
        let form = PageForm {
            title: "Kargo ve İade".to_string(),
            body_markdown: "# Kargo\r\n\r\nSiparişler 2 iş gününde kargoda.".to_string(),
            ..PageForm::default()
        };
        let input = form.to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.slug, "kargo-ve-iade");
        assert!(!input.body_markdown.contains('\r'));
        assert!(!input.is_published);
    }

    #[test]
    fn test_page_form_requires_body() {
        let form = PageForm {
            title: "Boş".to_string(),
            ..PageForm::default()
        };
        let errors = form.to_input().err().unwrap_or_default();
        assert_eq!(errors.first().map(|e| e.field), Some("body_markdown"));
    }
}
