//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;
use yakimoto_core::ProductId;
use yakimoto_core::catalog::Product;
use yakimoto_core::images::ImageUrls;

use crate::error::{AppError, Result};
use crate::filters;
use crate::layout::Layout;
use crate::middleware::CspNonce;
use crate::seo::{self, PageMeta};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// A size button or option.
#[derive(Clone)]
pub struct SizeView {
    pub label: String,
    pub quantity: u32,
}

impl SizeView {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// Product card shown in listings, category pages, and hero panels.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub price: String,
    pub sale_price: Option<String>,
    pub discount_label: Option<u32>,
    pub stock_label: &'static str,
    pub stock_class: &'static str,
    pub available: bool,
    pub is_new: bool,
    pub sizes: Vec<SizeView>,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, images: &ImageUrls) -> Self {
        let stock = product.stock_status();
        Self {
            id: product.id,
            name: product.name.clone(),
            image_url: product.primary_image().map(|f| images.thumbnail(f)),
            price: product.price.display(),
            sale_price: product.effective_sale_price().map(|p| p.display()),
            discount_label: product.discount_label(),
            stock_label: stock.label(),
            stock_class: stock.css_class(),
            available: stock.is_available(),
            is_new: product.is_new,
            sizes: size_views(product),
        }
    }

    #[must_use]
    pub fn href(&self) -> String {
        format!("/products/{}", self.id)
    }
}

fn size_views(product: &Product) -> Vec<SizeView> {
    product
        .sizes
        .iter()
        .map(|(label, stock)| SizeView {
            label: label.to_string(),
            quantity: stock.total(),
        })
        .collect()
}

/// One gallery image.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub thumbnail_url: String,
}

/// Full product detail.
#[derive(Clone)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub description: String,
    pub images: Vec<ImageView>,
    pub main_image_url: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub gsm: Option<String>,
    pub age_group: Option<String>,
    /// Effective unit price as a plain number, for the live line total
    pub unit_price: String,
}

impl ProductDetailView {
    fn new(product: &Product, images: &ImageUrls, shop_name: &str) -> Self {
        Self {
            card: ProductCardView::new(product, images),
            description: seo::product_description(product, shop_name),
            images: product
                .images
                .iter()
                .map(|f| ImageView {
                    url: images.full(f),
                    thumbnail_url: images.thumbnail(f),
                })
                .collect(),
            main_image_url: product.primary_image().map(|f| images.full(f)),
            category: product.primary_category().map(str::to_owned),
            color: product.color.clone(),
            gsm: product.gsm.clone(),
            age_group: product.age_group.clone(),
            unit_price: product.effective_price().to_plain_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetailView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display every product.
#[instrument(skip(state, session, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let products = state.backend().products().await?;
    let config = state.config();
    let meta = PageMeta::new(
        &config.base_url,
        "/products",
        format!("Alla produkter - {}", config.shop.name),
        format!(
            "Judogi, judodräkter och bälten för barn och vuxna från {}. Snabb leverans från Sverige.",
            config.shop.name
        ),
    );

    Ok(ProductsIndexTemplate {
        layout: Layout::build(&state, &session, nonce, meta, Vec::new()).await,
        products: products
            .iter()
            .map(|p| ProductCardView::new(p, state.images()))
            .collect(),
    })
}

/// Display a product with its sizes and structured data.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("product {id}")))?;
    let product = state.backend().product(id).await?;

    let config = state.config();
    let images = state.images();
    let meta = PageMeta::product(
        &config.base_url,
        &config.shop.name,
        &product,
        product.primary_image().map(|f| images.full(f)),
    );
    let json_ld = seo::json_ld(&seo::product_json_ld(
        &config.base_url,
        &config.shop.name,
        images,
        &product,
    ));

    Ok(ProductShowTemplate {
        layout: Layout::build(&state, &session, nonce, meta, Vec::new())
            .await
            .with_structured_data(json_ld),
        product: ProductDetailView::new(&product, images, &config.shop.name),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_card_view_for_sale_product() {
        let product: Product = serde_json::from_value(json!({
            "id": 3,
            "name": "Judogi Elite",
            "price": 1200,
            "discount_percent": 25,
            "sizes": {"160": {"online": 0, "club": 0}, "170": {"online": 1, "club": 1}},
            "images": ["elite.png", "elite2.jpg"],
            "main_image": "elite2.jpg"
        }))
        .unwrap();
        let images = ImageUrls::new("http://api");
        let card = ProductCardView::new(&product, &images);

        assert_eq!(card.href(), "/products/3");
        assert_eq!(card.price, "1200 kr");
        assert_eq!(card.sale_price.as_deref(), Some("900 kr"));
        assert_eq!(card.discount_label, Some(25));
        assert_eq!(card.stock_label, "Lågt i lager");
        assert_eq!(
            card.image_url.as_deref(),
            Some("http://api/thumbnails/elite2_thumb.jpg")
        );
        assert_eq!(card.sizes.len(), 2);
        assert!(!card.sizes[0].is_available());
        assert!(card.sizes[1].is_available());
    }

    #[test]
    fn test_detail_view_keeps_image_order() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "name": "Bälte",
            "price": 149,
            "images": ["b.png", "a.jpg"]
        }))
        .unwrap();
        let view = ProductDetailView::new(&product, &ImageUrls::new("http://api"), "Yakimoto Dojo");
        assert_eq!(view.images[0].url, "http://api/uploads/b.png");
        assert_eq!(view.images[1].thumbnail_url, "http://api/thumbnails/a_thumb.jpg");
        assert_eq!(view.unit_price, "149");
        assert_eq!(view.card.stock_label, "Slut i lager");
    }
}
