//! `sitemap.xml` and `robots.txt`.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::Result;
use crate::seo;
use crate::state::AppState;

/// Sitemap built from the live catalog.
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let backend = state.backend();
    let categories = backend.categories().await?;
    let products = backend.products().await?;
    let xml = seo::sitemap(
        &state.config().base_url,
        &categories,
        &products,
        chrono::Utc::now().date_naive(),
    );
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        seo::robots(&state.config().base_url),
    )
}
