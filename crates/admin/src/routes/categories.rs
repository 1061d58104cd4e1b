//! Category management route handlers.
//!
//! Categories are few, so they are listed, created and edited on one page.

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

use solera_core::CategoryId;
use solera_core::checkout::FieldError;
use solera_db::models::{Category, CategoryInput};
use solera_db::{CategoryRepository, RepositoryError};

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, describe, optional_text};
use super::{Notice, redirect_error, redirect_success};

const INDEX_PATH: &str = "/categories";

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index).post(create))
        .route("/categories/{id}", post(update))
        .route("/categories/{id}/delete", post(delete))
}

/// Category form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sort_order: String,
}

impl CategoryForm {
    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self) -> std::result::Result<CategoryInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();
        let name = errors.required("name", &self.name);
        let slug = errors.slug("slug", &self.slug, &name);
        let sort_order = errors.integer("sort_order", &self.sort_order, 0);

        errors.finish(CategoryInput {
            name,
            slug,
            description: optional_text(&self.description),
            sort_order,
        })
    }
}

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub categories: Vec<Category>,
}

/// Category list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<CategoriesTemplate> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    let (success_message, error_message) = notice.into_messages();

    Ok(CategoriesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: INDEX_PATH.to_string(),
        success_message,
        error_message,
        categories,
    })
}

/// Turn a save result into a redirect back to the list.
fn saved(result: std::result::Result<Category, RepositoryError>, verb: &str) -> Result<Redirect> {
    match result {
        Ok(category) => Ok(redirect_success(
            INDEX_PATH,
            &format!("{} {verb}", category.name),
        )),
        Err(RepositoryError::Conflict(message)) => Ok(redirect_error(INDEX_PATH, &message)),
        Err(e) => Err(e.into()),
    }
}

/// Create a category.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    match form.to_input() {
        Ok(input) => saved(
            CategoryRepository::new(state.pool()).create(&input).await,
            "created",
        ),
        Err(errors) => Ok(redirect_error(INDEX_PATH, &describe(&errors))),
    }
}

/// Update a category.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    match form.to_input() {
        Ok(input) => saved(
            CategoryRepository::new(state.pool())
                .update(id, &input)
                .await,
            "saved",
        ),
        Err(errors) => Ok(redirect_error(INDEX_PATH, &describe(&errors))),
    }
}

/// Delete a category. Its products stay, uncategorized.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Redirect> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    tracing::info!(category_id = %id, "category deleted");
    Ok(redirect_success(INDEX_PATH, "Category deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_form_defaults() {
        let form = CategoryForm {
            name: "Parmak Arası".to_string(),
            ..CategoryForm::default()
        };
        let input = form.to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.slug, "parmak-arasi");
        assert_eq!(input.sort_order, 0);
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_category_form_requires_name() {
        let errors = CategoryForm::default().to_input().err().unwrap_or_default();
        assert!(errors.iter().any(|e| e.field == "name"));
    }
}
