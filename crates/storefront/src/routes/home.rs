//! Home page route handler.
//!
//! The page degrades section by section: a backend failure hides the
//! affected section instead of failing the whole page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;
use yakimoto_core::catalog::{self, Category, ProductGroup};
use yakimoto_core::images::ImageUrls;

use super::products::ProductCardView;
use crate::filters;
use crate::layout::Layout;
use crate::middleware::CspNonce;
use crate::seo::{self, PageMeta};
use crate::state::AppState;

/// Hero panels shown for the featured category.
const HERO_PANELS: usize = 4;

/// Category tile.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub display_name: String,
    pub href: String,
    pub image_url: Option<String>,
}

impl CategoryView {
    #[must_use]
    pub fn new(category: &Category, images: &ImageUrls) -> Self {
        Self {
            name: category.name.clone(),
            display_name: category.display_name(),
            href: format!("/category/{}", urlencoding::encode(&category.name)),
            image_url: category
                .image_filename
                .as_deref()
                .filter(|f| !f.is_empty())
                .map(|f| images.thumbnail(f)),
        }
    }
}

/// A hero panel: attribute label plus the representative product.
#[derive(Clone)]
pub struct HeroPanel {
    pub label: String,
    pub product: ProductCardView,
}

impl HeroPanel {
    fn new(group: &ProductGroup, images: &ImageUrls) -> Self {
        Self {
            label: group.label.clone(),
            product: ProductCardView::new(&group.product, images),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryView>,
    pub featured_title: Option<String>,
    pub hero: Vec<HeroPanel>,
}

/// Display the home page.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let backend = state.backend();
    let images = state.images();
    let config = state.config();

    let mut categories = backend.categories().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load categories for home page: {e}");
        Vec::new()
    });
    catalog::sort_for_display(&mut categories);

    let (featured_title, hero) = match config.shop.featured_category.as_deref() {
        Some(featured) => match backend.grouped_products(featured).await {
            Ok(products) => {
                let hero: Vec<HeroPanel> = catalog::group_by_attributes(&products, HERO_PANELS)
                    .iter()
                    .map(|g| HeroPanel::new(g, images))
                    .collect();
                (Some(catalog::capitalize(featured)), hero)
            }
            Err(e) => {
                tracing::warn!(category = featured, "Failed to load hero products: {e}");
                (None, Vec::new())
            }
        },
        None => (None, Vec::new()),
    };

    let meta = PageMeta::home(&config.base_url, &config.shop.name);
    let mut layout = Layout::build(&state, &session, nonce, meta, Vec::new()).await;
    match backend.products().await {
        Ok(products) => {
            layout = layout.with_structured_data(seo::json_ld(&seo::store_json_ld(
                &config.base_url,
                &config.shop.name,
                images,
                &products,
            )));
        }
        Err(e) => tracing::warn!("Skipping store structured data: {e}"),
    }

    HomeTemplate {
        layout,
        categories: categories
            .iter()
            .map(|c| CategoryView::new(c, images))
            .collect(),
        featured_title,
        hero,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_category_view() {
        let category: Category = serde_json::from_value(json!({
            "id": 2, "name": "bälten", "image_filename": "belts.JPG"
        }))
        .unwrap();
        let view = CategoryView::new(&category, &ImageUrls::new("http://api"));
        assert_eq!(view.display_name, "Bälten");
        assert_eq!(view.href, "/category/b%C3%A4lten");
        assert_eq!(
            view.image_url.as_deref(),
            Some("http://api/thumbnails/belts_thumb.jpg")
        );
    }
}
