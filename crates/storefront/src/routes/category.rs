//! Category page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;
use yakimoto_core::catalog::capitalize;

use super::products::ProductCardView;
use crate::error::Result;
use crate::filters;
use crate::layout::Layout;
use crate::middleware::CspNonce;
use crate::seo::PageMeta;
use crate::state::AppState;

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "category/show.html")]
pub struct CategoryShowTemplate {
    pub layout: Layout,
    pub display_name: String,
    /// Page path, where quick-add returns to
    pub path: String,
    pub products: Vec<ProductCardView>,
}

/// Display the products linked to a category.
///
/// An unknown category renders an empty listing, as the backend answers
/// with an empty list rather than a 404.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let products = state.backend().products_in_category(&name).await?;
    let config = state.config();
    let meta = PageMeta::category(&config.base_url, &config.shop.name, &name);

    Ok(CategoryShowTemplate {
        layout: Layout::build(&state, &session, nonce, meta, Vec::new()).await,
        display_name: capitalize(&name),
        path: format!("/category/{}", urlencoding::encode(&name)),
        products: products
            .iter()
            .map(|p| ProductCardView::new(p, state.images()))
            .collect(),
    })
}
