//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, RawQuery, State},
    response::IntoResponse,
};
use tracing::instrument;

use solera_core::pagination::Page;
use solera_db::{CollectionRepository, ProductRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::page::PageContext;
use crate::routes::products::ListingQuery;
use crate::routes::views::{CollectionTile, PageLinks, ProductCard};
use crate::state::AppState;

const PER_PAGE: u32 = 24;

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub ctx: PageContext,
    pub collections: Vec<CollectionTile>,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub products: Vec<ProductCard>,
    pub pagination: PageLinks,
}

/// Display all active collections.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let collections = CollectionRepository::new(state.pool()).list_active().await?;

    Ok(CollectionsIndexTemplate {
        ctx,
        collections: collections.iter().map(CollectionTile::from).collect(),
    })
}

/// Display one collection with its products.
///
/// Accepts the same query parameters as the product listing.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let collection = CollectionRepository::new(state.pool())
        .get_active_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collection not found: {slug}")))?;

    let query = ListingQuery::parse(raw.as_deref());
    let mut filter = query.to_filter(None);
    filter.collection = Some(collection.slug.clone());

    let results = ProductRepository::new(state.pool())
        .search(&filter, Page::new(query.page, PER_PAGE))
        .await?;
    let path = format!("/collections/{}", collection.slug);

    Ok(CollectionShowTemplate {
        products: ProductCard::list(&results.items, ctx.settings.currency),
        pagination: PageLinks::new(&results, &path, &query.to_query_string()),
        name: collection.name,
        description: collection.description,
        image_url: collection.image_url,
        ctx,
    })
}
