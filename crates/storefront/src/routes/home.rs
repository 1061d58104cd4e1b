//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use solera_core::Gender;
use solera_db::models::Banner;
use solera_db::{BannerRepository, CollectionRepository, ProductRepository};

use crate::error::Result;
use crate::filters;
use crate::page::PageContext;
use crate::routes::views::{CollectionTile, ProductCard};
use crate::state::AppState;

/// Featured products on the home page.
const FEATURED_LIMIT: i64 = 8;

/// A slide in the hero carousel.
#[derive(Debug, Clone)]
pub struct HeroSlide {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
}

impl From<Banner> for HeroSlide {
    fn from(banner: Banner) -> Self {
        Self {
            title: banner.title,
            subtitle: banner.subtitle,
            image_url: banner.image_url,
            link_url: banner.link_url,
        }
    }
}

/// Gender entry point under the hero.
#[derive(Debug, Clone)]
pub struct GenderLink {
    pub label: &'static str,
    pub url: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub slides: Vec<HeroSlide>,
    pub featured: Vec<ProductCard>,
    pub collections: Vec<CollectionTile>,
    pub genders: Vec<GenderLink>,
}

/// Display the home page.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let banner_repo = BannerRepository::new(state.pool());
    let product_repo = ProductRepository::new(state.pool());
    let collection_repo = CollectionRepository::new(state.pool());
    let (banners, featured, collections) = tokio::try_join!(
        banner_repo.list_live(),
        product_repo.featured(FEATURED_LIMIT),
        collection_repo.list_active(),
    )?;

    Ok(HomeTemplate {
        slides: banners.into_iter().map(HeroSlide::from).collect(),
        featured: ProductCard::list(&featured, ctx.settings.currency),
        collections: collections.iter().map(CollectionTile::from).collect(),
        genders: Gender::ALL
            .into_iter()
            .map(|g| GenderLink {
                label: g.label(),
                url: format!("/shop/{}", g.as_str()),
            })
            .collect(),
        ctx,
    })
}
