//! Collection management route handlers.
//!
//! The edit form lists every product with a checkbox. Checked products
//! become the collection's members in listing order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tracing::instrument;

use solera_core::checkout::FieldError;
use solera_core::pagination::Page;
use solera_core::{CollectionId, ProductId};
use solera_db::models::{Collection, CollectionInput};
use solera_db::{CollectionRepository, ProductRepository, RepositoryError};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, checkbox, describe, optional_text};
use super::{Notice, redirect_success};

/// Products offered as members on the edit form.
const MEMBER_CHOICES: u32 = 100;

/// Build the collections router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections", get(index).post(create))
        .route("/collections/new", get(new))
        .route("/collections/{id}", get(edit).post(update))
        .route("/collections/{id}/delete", post(delete))
}

// =============================================================================
// Form
// =============================================================================

/// Collection form. Member checkboxes repeat the `product_ids` key, so the
/// form is read from raw pairs.
#[derive(Debug, Clone, Default)]
pub struct CollectionForm {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
    pub sort_order: String,
    pub is_active: Option<String>,
    pub product_ids: Vec<String>,
}

impl CollectionForm {
    /// Collect submitted pairs. Unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = value,
                "slug" => form.slug = value,
                "description" => form.description = value,
                "image_url" => form.image_url = value,
                "sort_order" => form.sort_order = value,
                "is_active" => form.is_active = Some(value),
                "product_ids" => form.product_ids.push(value),
                _ => {}
            }
        }
        form
    }

    fn from_collection(collection: &Collection, members: &[ProductId]) -> Self {
        Self {
            name: collection.name.clone(),
            slug: collection.slug.clone(),
            description: collection.description.clone(),
            image_url: collection.image_url.clone().unwrap_or_default(),
            sort_order: collection.sort_order.to_string(),
            is_active: collection.is_active.then(|| "on".to_string()),
            product_ids: members.iter().map(ToString::to_string).collect(),
        }
    }

    /// Validate and convert into repository input plus the member list.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(
        &self,
    ) -> std::result::Result<(CollectionInput, Vec<ProductId>), Vec<FieldError>> {
        let mut errors = FormErrors::new();
        let name = errors.required("name", &self.name);
        let slug = errors.slug("slug", &self.slug, &name);
        let sort_order = errors.integer("sort_order", &self.sort_order, 0);
        let image_url = optional_text(&self.image_url);

        let mut members = Vec::with_capacity(self.product_ids.len());
        for raw in &self.product_ids {
            match raw.trim().parse::<i32>() {
                Ok(id) if !members.contains(&ProductId::new(id)) => {
                    members.push(ProductId::new(id));
                }
                Ok(_) => {}
                Err(_) => errors.add("products", "contains an unknown product"),
            }
        }

        errors.finish((
            CollectionInput {
                name,
                slug,
                description: self.description.trim().to_string(),
                image_url,
                is_active: checkbox(self.is_active.as_ref()),
                sort_order,
            },
            members,
        ))
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product checkbox on the collection form.
#[derive(Debug, Clone)]
pub struct MemberChoice {
    pub id: ProductId,
    pub name: String,
    pub gender: &'static str,
    pub is_active: bool,
    pub checked: bool,
}

/// Collection list template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub collections: Vec<Collection>,
}

/// New/edit collection template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/form.html")]
pub struct CollectionFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub collection_id: Option<CollectionId>,
    pub form: CollectionForm,
    pub choices: Vec<MemberChoice>,
}

async fn render_form(
    state: &AppState,
    admin: &CurrentAdmin,
    collection_id: Option<CollectionId>,
    form: CollectionForm,
    notice: Notice,
) -> Result<CollectionFormTemplate> {
    let products = ProductRepository::new(state.pool())
        .list_all(None, Page::new(Some(1), MEMBER_CHOICES))
        .await?;
    let choices = products
        .items
        .iter()
        .map(|product| MemberChoice {
            id: product.id,
            name: product.name.clone(),
            gender: product.gender.label(),
            is_active: product.is_active,
            checked: form.product_ids.contains(&product.id.to_string()),
        })
        .collect();
    let (success_message, error_message) = notice.into_messages();

    Ok(CollectionFormTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: "/collections".to_string(),
        success_message,
        error_message,
        collection_id,
        form,
        choices,
    })
}

fn failed(error_message: String) -> Notice {
    Notice {
        success: None,
        error: Some(error_message),
    }
}

/// Save the collection and its members, returning a message the admin can
/// act on when the save is refused.
async fn save(
    state: &AppState,
    id: Option<CollectionId>,
    form: &CollectionForm,
) -> Result<std::result::Result<Collection, String>> {
    let (input, members) = match form.to_input() {
        Ok(parsed) => parsed,
        Err(errors) => return Ok(Err(describe(&errors))),
    };

    let repo = CollectionRepository::new(state.pool());
    let saved = match id {
        Some(id) => repo.update(id, &input).await,
        None => repo.create(&input).await,
    };
    let collection = match saved {
        Ok(collection) => collection,
        Err(RepositoryError::Conflict(message)) => return Ok(Err(message)),
        Err(e) => return Err(e.into()),
    };

    repo.set_members(collection.id, &members).await?;
    tracing::info!(
        collection_id = %collection.id,
        members = members.len(),
        "collection saved"
    );
    Ok(Ok(collection))
}

// =============================================================================
// Handlers
// =============================================================================

/// Collection list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<CollectionsIndexTemplate> {
    let collections = CollectionRepository::new(state.pool()).list_all().await?;
    let (success_message, error_message) = notice.into_messages();

    Ok(CollectionsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/collections".to_string(),
        success_message,
        error_message,
        collections,
    })
}

/// New collection page handler.
#[instrument(skip(admin, state))]
pub async fn new(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
) -> Result<CollectionFormTemplate> {
    let form = CollectionForm {
        is_active: Some("on".to_string()),
        ..CollectionForm::default()
    };
    render_form(&state, &admin, None, form, Notice::default()).await
}

/// Create a collection.
#[instrument(skip(admin, state, pairs), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = CollectionForm::from_pairs(pairs);
    match save(&state, None, &form).await? {
        Ok(collection) => Ok(redirect_success(
            &format!("/collections/{}", collection.id),
            "Collection created",
        )
        .into_response()),
        Err(message) => Ok(render_form(&state, &admin, None, form, failed(message))
            .await?
            .into_response()),
    }
}

/// Edit collection page handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    Query(notice): Query<Notice>,
) -> Result<CollectionFormTemplate> {
    let repo = CollectionRepository::new(state.pool());
    let collection = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collection {id} not found")))?;
    let members = repo.member_ids(id).await?;

    let form = CollectionForm::from_collection(&collection, &members);
    render_form(&state, &admin, Some(id), form, notice).await
}

/// Update a collection and replace its members.
#[instrument(skip(admin, state, pairs), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = CollectionForm::from_pairs(pairs);
    match save(&state, Some(id), &form).await? {
        Ok(_) => Ok(redirect_success(&format!("/collections/{id}"), "Collection saved")
            .into_response()),
        Err(message) => Ok(render_form(&state, &admin, Some(id), form, failed(message))
            .await?
            .into_response()),
    }
}

/// Delete a collection. Its products are untouched.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> Result<Redirect> {
    CollectionRepository::new(state.pool()).delete(id).await?;
    tracing::info!(collection_id = %id, "collection deleted");
    Ok(redirect_success("/collections", "Collection deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_product_ids_keep_order() {
        let form = CollectionForm::from_pairs(pairs(&[
            ("name", "Yaz 2026"),
            ("product_ids", "7"),
            ("product_ids", "3"),
            ("product_ids", "7"),
            ("is_active", "on"),
        ]));
        let (input, members) = form.to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.slug, "yaz-2026");
        assert!(input.is_active);
        assert_eq!(members, vec![ProductId::new(7), ProductId::new(3)]);
    }

    #[test]
    fn test_unchecked_active_box_means_hidden() {
        let form = CollectionForm::from_pairs(pairs(&[("name", "Arşiv")]));
        let (input, members) = form.to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert!(!input.is_active);
        assert!(members.is_empty());
    }

    #[test]
    fn test_garbage_product_id_is_rejected() {
        let form = CollectionForm::from_pairs(pairs(&[("name", "X"), ("product_ids", "abc")]));
        assert!(form.to_input().is_err());
    }
}
