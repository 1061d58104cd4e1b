//! Content page and FAQ route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use solera_db::{FaqRepository, PageRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::page::PageContext;
use crate::services::markdown;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub body_html: String,
    pub updated_at: String,
}

/// FAQ entry with rendered answer.
#[derive(Debug, Clone)]
pub struct FaqView {
    pub question: String,
    pub answer_html: String,
}

/// FAQ page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/faq.html")]
pub struct FaqTemplate {
    pub ctx: PageContext,
    pub faqs: Vec<FaqView>,
}

/// Display a published content page.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let page = PageRepository::new(state.pool())
        .get_published(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page not found: {slug}")))?;

    Ok(ContentPageTemplate {
        ctx,
        body_html: markdown::render(&page.body_markdown),
        updated_at: filters::date(page.updated_at),
        title: page.title,
    })
}

/// Display the FAQ.
#[instrument(skip(state, ctx))]
pub async fn faq(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let faqs = FaqRepository::new(state.pool()).list_active().await?;

    Ok(FaqTemplate {
        ctx,
        faqs: faqs
            .into_iter()
            .map(|f| FaqView {
                answer_html: markdown::render(&f.answer),
                question: f.question,
            })
            .collect(),
    })
}
