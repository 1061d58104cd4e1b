//! Product management route handlers.
//!
//! A product is edited on one page together with its size/color variants
//! and its images. Variants and images have their own small forms that
//! post back and redirect to the product page.

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

use solera_core::checkout::FieldError;
use solera_core::pagination::Page;
use solera_core::{CategoryId, Gender, ImageId, ProductId, VariantId};
use solera_db::models::{
    Category, ImageInput, Product, ProductDetail, ProductImage, ProductInput, ProductSummary,
    Variant, VariantInput,
};
use solera_db::{CategoryRepository, ProductRepository, RepositoryError, SettingsRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{FormErrors, amount_text, checkbox, describe, optional_text};
use super::pagination::{PER_PAGE, PageLinks};
use super::{Notice, redirect_error, redirect_success};

/// Longest product name accepted.
const MAX_NAME_LENGTH: usize = 200;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new))
        .route("/products/{id}", get(edit).post(update))
        .route("/products/{id}/delete", post(delete))
        .route("/products/{id}/variants", post(add_variant))
        .route("/products/{id}/variants/{variant_id}", post(update_variant))
        .route(
            "/products/{id}/variants/{variant_id}/delete",
            post(delete_variant),
        )
        .route("/products/{id}/images", post(add_image))
        .route("/products/{id}/images/{image_id}/delete", post(delete_image))
}

// =============================================================================
// Forms
// =============================================================================

/// Query parameters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Product form, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub slug: String,
    pub gender: String,
    pub category_id: String,
    pub description: String,
    pub material: String,
    pub base_price: String,
    pub compare_at_price: String,
    pub is_active: Option<String>,
    pub is_featured: Option<String>,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        let on = || "on".to_string();
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            gender: product.gender.as_str().to_string(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            description: product.description.clone(),
            material: product.material.clone().unwrap_or_default(),
            base_price: product.base_price.to_string(),
            compare_at_price: amount_text(product.compare_at_price),
            is_active: product.is_active.then(on),
            is_featured: product.is_featured.then(on),
        }
    }
}

impl ProductForm {
    /// Blank form for a new product, active by default.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            gender: Gender::Women.as_str().to_string(),
            is_active: Some("on".to_string()),
            ..Self::default()
        }
    }

    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self) -> std::result::Result<ProductInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();

        let name = errors.required("name", &self.name);
        if name.chars().count() > MAX_NAME_LENGTH {
            errors.add(
                "name",
                format!("must be at most {MAX_NAME_LENGTH} characters"),
            );
        }
        let slug = errors.slug("slug", &self.slug, &name);
        let gender = self.gender.parse::<Gender>().unwrap_or_else(|_| {
            errors.add("gender", "choose women, men or unisex");
            Gender::Unisex
        });
        let category_id = errors
            .optional_integer("category_id", &self.category_id)
            .map(CategoryId::new);

        let base_price = errors.decimal("base_price", &self.base_price);
        if base_price.is_zero() && !self.base_price.trim().is_empty() {
            errors.add("base_price", "must be greater than zero");
        }
        let compare_at_price = errors.optional_decimal("compare_at_price", &self.compare_at_price);
        if compare_at_price.is_some_and(|compare| compare <= base_price) {
            errors.add("compare_at_price", "must be higher than the price");
        }

        errors.finish(ProductInput {
            category_id,
            gender,
            name,
            slug,
            description: self.description.trim().to_string(),
            material: optional_text(&self.material),
            base_price,
            compare_at_price,
            is_active: checkbox(self.is_active.as_ref()),
            is_featured: checkbox(self.is_featured.as_ref()),
        })
    }
}

/// Variant form, used for both adding and editing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VariantForm {
    pub sku: String,
    pub size: String,
    pub color: String,
    pub color_hex: String,
    pub price: String,
    pub stock: String,
    pub is_active: Option<String>,
}

/// Whether `value` is a `#rrggbb` color.
fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value.chars().skip(1).all(|c| c.is_ascii_hexdigit())
}

impl VariantForm {
    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self) -> std::result::Result<VariantInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();

        let sku = errors.required("sku", &self.sku).to_ascii_uppercase();
        let size = errors.required("size", &self.size);
        let color = errors.required("color", &self.color);
        let color_hex = optional_text(&self.color_hex).map(|hex| hex.to_ascii_lowercase());
        if color_hex.as_deref().is_some_and(|hex| !is_hex_color(hex)) {
            errors.add("color_hex", "must look like #a0522d");
        }
        let price = errors.optional_decimal("price", &self.price);
        let stock = errors.integer("stock", &self.stock, 0);
        if stock < 0 {
            errors.add("stock", "cannot be negative");
        }

        errors.finish(VariantInput {
            sku,
            size,
            color,
            color_hex,
            price,
            stock,
            is_active: checkbox(self.is_active.as_ref()),
        })
    }
}

/// Image form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageForm {
    pub url: String,
    pub alt: String,
    pub position: String,
}

impl ImageForm {
    /// Validate and convert into repository input. Images go last unless a
    /// position is given.
    ///
    /// # Errors
    ///
    /// Returns one error per invalid field.
    pub fn to_input(&self, next_position: i32) -> std::result::Result<ImageInput, Vec<FieldError>> {
        let mut errors = FormErrors::new();

        let url = errors.required("url", &self.url);
        if !url.is_empty() && !(url.starts_with("https://") || url.starts_with('/')) {
            errors.add("url", "must be an https:// address or a /static path");
        }
        let position = errors.integer("position", &self.position, next_position);

        errors.finish(ImageInput {
            url,
            alt: self.alt.trim().to_string(),
            position,
        })
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Product listing row.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub url: String,
    pub name: String,
    pub gender: &'static str,
    pub category: String,
    pub price: String,
    pub stock: i64,
    pub is_active: bool,
    pub image_url: Option<String>,
}

impl ProductRow {
    fn new(summary: &ProductSummary, currency: solera_core::CurrencyCode) -> Self {
        Self {
            url: format!("/products/{}", summary.id),
            name: summary.name.clone(),
            gender: summary.gender.label(),
            category: summary.category_name.clone().unwrap_or_default(),
            price: filters::price(summary.base_price, currency),
            stock: summary.total_stock,
            is_active: summary.is_active,
            image_url: summary.image_url.clone(),
        }
    }
}

/// Select option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn category_options(categories: &[Category], selected: &str) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|category| {
            let value = category.id.to_string();
            SelectOption {
                selected: value == selected,
                value,
                label: category.name.clone(),
            }
        })
        .collect()
}

fn gender_options(selected: &str) -> Vec<SelectOption> {
    Gender::ALL
        .into_iter()
        .map(|gender| SelectOption {
            value: gender.as_str().to_string(),
            label: gender.label().to_string(),
            selected: gender.as_str() == selected,
        })
        .collect()
}

/// Variant row with its inline edit form values.
#[derive(Debug, Clone)]
pub struct VariantRow {
    pub id: VariantId,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub color_hex: String,
    pub price: String,
    pub stock: i32,
    pub is_active: bool,
    pub is_low: bool,
}

impl VariantRow {
    fn new(variant: &Variant, low_stock_threshold: i32) -> Self {
        Self {
            id: variant.id,
            sku: variant.sku.clone(),
            size: variant.size.clone(),
            color: variant.color.clone(),
            color_hex: variant.color_hex.clone().unwrap_or_default(),
            price: amount_text(variant.price),
            stock: variant.stock,
            is_active: variant.is_active,
            is_low: variant.is_active && variant.stock <= low_stock_threshold,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub products: Vec<ProductRow>,
    pub q: String,
    pub pagination: PageLinks,
}

/// New/edit product template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub product_id: Option<ProductId>,
    pub form: ProductForm,
    pub genders: Vec<SelectOption>,
    pub categories: Vec<SelectOption>,
    pub variants: Vec<VariantRow>,
    pub images: Vec<ProductImage>,
    pub storefront_url: Option<String>,
}

/// Everything needed to render the product form.
struct FormPage<'a> {
    admin: &'a CurrentAdmin,
    detail: Option<&'a ProductDetail>,
    form: ProductForm,
    success_message: Option<String>,
    error_message: Option<String>,
}

async fn render_form(state: &AppState, page: FormPage<'_>) -> Result<ProductFormTemplate> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    let threshold = SettingsRepository::new(state.pool())
        .load()
        .await?
        .low_stock_threshold;

    let (product_id, variants, images, storefront_url) = match page.detail {
        Some(detail) => (
            Some(detail.product.id),
            detail
                .variants
                .iter()
                .map(|v| VariantRow::new(v, threshold))
                .collect(),
            detail.images.clone(),
            detail
                .product
                .is_active
                .then(|| {
                    state.storefront_link(&format!(
                        "/shop/{}/{}",
                        detail.product.gender, detail.product.slug
                    ))
                })
                .flatten(),
        ),
        None => (None, Vec::new(), Vec::new(), None),
    };

    Ok(ProductFormTemplate {
        admin_user: AdminUserView::from(page.admin),
        current_path: "/products".to_string(),
        success_message: page.success_message,
        error_message: page.error_message,
        product_id,
        genders: gender_options(&page.form.gender),
        categories: category_options(&categories, &page.form.category_id),
        form: page.form,
        variants,
        images,
        storefront_url,
    })
}

async fn load_detail(state: &AppState, id: ProductId) -> Result<ProductDetail> {
    ProductRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
}

/// Message for a failed save that the admin can fix.
fn save_error(err: RepositoryError) -> Result<String> {
    match err {
        RepositoryError::Conflict(message) => Ok(message),
        other => Err(other.into()),
    }
}

// =============================================================================
// Product Handlers
// =============================================================================

/// Product list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<ProductsIndexTemplate> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default().to_string();
    let currency = SettingsRepository::new(state.pool()).load().await?.currency;

    let products = ProductRepository::new(state.pool())
        .list_all(Some(q.as_str()), Page::new(query.page, PER_PAGE))
        .await?;

    let pagination = PageLinks::new(&products, "/products", &[("q", &q)]);
    let (success_message, error_message) = Notice {
        success: query.success,
        error: query.error,
    }
    .into_messages();

    Ok(ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        success_message,
        error_message,
        products: products
            .items
            .iter()
            .map(|p| ProductRow::new(p, currency))
            .collect(),
        q,
        pagination,
    })
}

/// New product page handler.
#[instrument(skip(admin, state))]
pub async fn new(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
) -> Result<ProductFormTemplate> {
    render_form(
        &state,
        FormPage {
            admin: &admin,
            detail: None,
            form: ProductForm::blank(),
            success_message: None,
            error_message: None,
        },
    )
    .await
}

/// Create a product, then continue on its edit page to add variants.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let error_message = match form.to_input() {
        Ok(input) => match ProductRepository::new(state.pool()).create(&input).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "product created");
                return Ok(redirect_success(
                    &format!("/products/{}", product.id),
                    "Product created. Add its sizes and colors below.",
                )
                .into_response());
            }
            Err(e) => save_error(e)?,
        },
        Err(errors) => describe(&errors),
    };

    let page = FormPage {
        admin: &admin,
        detail: None,
        form,
        success_message: None,
        error_message: Some(error_message),
    };
    Ok(render_form(&state, page).await?.into_response())
}

/// Edit product page handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(notice): Query<Notice>,
) -> Result<ProductFormTemplate> {
    let detail = load_detail(&state, id).await?;
    let (success_message, error_message) = notice.into_messages();
    let page = FormPage {
        admin: &admin,
        detail: Some(&detail),
        form: ProductForm::from(&detail.product),
        success_message,
        error_message,
    };
    render_form(&state, page).await
}

/// Update a product.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let detail = load_detail(&state, id).await?;

    let error_message = match form.to_input() {
        Ok(input) => match ProductRepository::new(state.pool()).update(id, &input).await {
            Ok(_) => {
                tracing::info!(product_id = %id, "product updated");
                return Ok(redirect_success(&format!("/products/{id}"), "Product saved")
                    .into_response());
            }
            Err(e) => save_error(e)?,
        },
        Err(errors) => describe(&errors),
    };

    let page = FormPage {
        admin: &admin,
        detail: Some(&detail),
        form,
        success_message: None,
        error_message: Some(error_message),
    };
    Ok(render_form(&state, page).await?.into_response())
}

/// Delete a product with its variants and images. Past orders keep their
/// line snapshots.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "product deleted");
    Ok(redirect_success("/products", "Product deleted"))
}

// =============================================================================
// Variant Handlers
// =============================================================================

/// Add a variant to a product.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn add_variant(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Form(form): Form<VariantForm>,
) -> Result<Redirect> {
    let back = format!("/products/{id}");
    load_detail(&state, id).await?;

    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(redirect_error(&back, &describe(&errors))),
    };

    match ProductRepository::new(state.pool())
        .add_variant(id, &input)
        .await
    {
        Ok(variant) => {
            tracing::info!(product_id = %id, variant_id = %variant.id, "variant added");
            Ok(redirect_success(&back, &format!("Added {}", variant.sku)))
        }
        Err(e) => Ok(redirect_error(&back, &save_error(e)?)),
    }
}

/// Update a variant's SKU, options, price, stock or visibility.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update_variant(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path((id, variant_id)): Path<(ProductId, VariantId)>,
    Form(form): Form<VariantForm>,
) -> Result<Redirect> {
    let back = format!("/products/{id}");
    let detail = load_detail(&state, id).await?;
    if detail.variant(variant_id).is_none() {
        return Err(AppError::NotFound(format!("Variant {variant_id} not found")));
    }

    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(redirect_error(&back, &describe(&errors))),
    };

    match ProductRepository::new(state.pool())
        .update_variant(variant_id, &input)
        .await
    {
        Ok(variant) => Ok(redirect_success(&back, &format!("Saved {}", variant.sku))),
        Err(e) => Ok(redirect_error(&back, &save_error(e)?)),
    }
}

/// Delete a variant.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete_variant(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path((id, variant_id)): Path<(ProductId, VariantId)>,
) -> Result<Redirect> {
    let detail = load_detail(&state, id).await?;
    if detail.variant(variant_id).is_none() {
        return Err(AppError::NotFound(format!("Variant {variant_id} not found")));
    }

    ProductRepository::new(state.pool())
        .delete_variant(variant_id)
        .await?;
    Ok(redirect_success(&format!("/products/{id}"), "Variant deleted"))
}

// =============================================================================
// Image Handlers
// =============================================================================

/// Add an image by URL.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn add_image(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Form(form): Form<ImageForm>,
) -> Result<Redirect> {
    let back = format!("/products/{id}");
    let detail = load_detail(&state, id).await?;
    let next_position = detail
        .images
        .iter()
        .map(|image| image.position + 1)
        .max()
        .unwrap_or(0);

    let input = match form.to_input(next_position) {
        Ok(input) => input,
        Err(errors) => return Ok(redirect_error(&back, &describe(&errors))),
    };

    ProductRepository::new(state.pool())
        .add_image(id, &input)
        .await?;
    Ok(redirect_success(&back, "Image added"))
}

/// Remove an image.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete_image(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path((id, image_id)): Path<(ProductId, ImageId)>,
) -> Result<Redirect> {
    let detail = load_detail(&state, id).await?;
    if !detail.images.iter().any(|image| image.id == image_id) {
        return Err(AppError::NotFound(format!("Image {image_id} not found")));
    }

    ProductRepository::new(state.pool())
        .delete_image(image_id)
        .await?;
    Ok(redirect_success(&format!("/products/{id}"), "Image removed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product_form() -> ProductForm {
        ProductForm {
            name: "Kapadokya Deri Sandalet".to_string(),
            base_price: "1249.90".to_string(),
            ..ProductForm::blank()
        }
    }

    #[test]
    fn test_product_form_derives_slug() {
        let input = product_form().to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.slug, "kapadokya-deri-sandalet");
        assert_eq!(input.gender, Gender::Women);
        assert_eq!(input.base_price, Decimal::new(124_990, 2));
        assert!(input.is_active);
        assert!(!input.is_featured);
        assert_eq!(input.category_id, None);
    }

    #[test]
    fn test_compare_at_price_must_exceed_price() {
        let form = ProductForm {
            compare_at_price: "1000".to_string(),
            ..product_form()
        };
        let errors = form.to_input().err().unwrap_or_default();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.field), Some("compare_at_price"));
    }

    #[test]
    fn test_product_form_reports_every_bad_field() {
        let form = ProductForm {
            name: String::new(),
            gender: "kids".to_string(),
            base_price: "abc".to_string(),
            ..ProductForm::default()
        };
        let fields: Vec<_> = form
            .to_input()
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"gender"));
        assert!(fields.contains(&"base_price"));
    }

    #[test]
    fn test_variant_form() {
        let form = VariantForm {
            sku: " sl-bod-38-tab ".to_string(),
            size: "38".to_string(),
            color: "Taba".to_string(),
            color_hex: "#A0522D".to_string(),
            price: String::new(),
            stock: "12".to_string(),
            is_active: Some("on".to_string()),
        };
        let input = form.to_input().unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.sku, "SL-BOD-38-TAB");
        assert_eq!(input.color_hex.as_deref(), Some("#a0522d"));
        assert_eq!(input.price, None);
        assert_eq!(input.stock, 12);
    }

    #[test]
    fn test_variant_form_rejects_negative_stock_and_bad_hex() {
        let form = VariantForm {
            sku: "X".to_string(),
            size: "38".to_string(),
            color: "Siyah".to_string(),
            color_hex: "black".to_string(),
            stock: "-1".to_string(),
            ..VariantForm::default()
        };
        let fields: Vec<_> = form
            .to_input()
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["color_hex", "stock"]);
    }

    #[test]
    fn test_image_form_position_defaults_to_end() {
        let form = ImageForm {
            url: "https://cdn.solera.shop/bodrum-1.jpg".to_string(),
            alt: "Bodrum, side".to_string(),
            position: String::new(),
        };
        let input = form.to_input(3).unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(input.position, 3);

        let insecure = ImageForm {
            url: "http://example.com/a.jpg".to_string(),
            ..ImageForm::default()
        };
        assert!(insecure.to_input(0).is_err());
    }

    #[test]
    fn test_gender_options_select_current() {
        let options = gender_options("men");
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(options.iter().any(|o| o.selected && o.value == "men"));
    }
}
