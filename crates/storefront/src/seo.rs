//! Page metadata, schema.org structured data, sitemap, and robots.txt.
//!
//! Copy is Swedish and keyword-aware: category titles pick up the search
//! terms customers use for the three main product families (judogi, judo
//! suits, belts).

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde_json::{Value, json};
use yakimoto_core::CURRENCY_CODE;
use yakimoto_core::catalog::{Category, Product, capitalize};
use yakimoto_core::images::ImageUrls;

use crate::analytics::escape_script_json;

const STORE_DESCRIPTION: &str = "Judodräkter för barn och vuxna, bälten, träningsoveraller. \
Snabb leverans från Sverige. Köp judo dräkt barn, judo dräkt vuxen, judogi sverige, \
bjj gi sverige, judo bälte. Kimono judo Alingsås.";

/// `<head>` metadata for one page.
#[derive(Debug, Clone)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    /// Absolute canonical URL
    pub canonical: String,
    pub robots: &'static str,
    /// Open Graph type
    pub og_type: &'static str,
    pub image: Option<String>,
}

impl PageMeta {
    #[must_use]
    pub fn new(base_url: &str, path: &str, title: String, description: String) -> Self {
        Self {
            title,
            description,
            canonical: canonical_url(base_url, path),
            robots: "index, follow",
            og_type: "website",
            image: None,
        }
    }

    /// Pages that should never appear in search results (cart, confirmation).
    #[must_use]
    pub const fn noindex(mut self) -> Self {
        self.robots = "noindex, follow";
        self
    }

    #[must_use]
    pub fn home(base_url: &str, shop_name: &str) -> Self {
        Self::new(
            base_url,
            "/",
            format!("{shop_name} | Judogi, Judodräkter & Judo Bälten"),
            STORE_DESCRIPTION.to_string(),
        )
    }

    #[must_use]
    pub fn checkout(base_url: &str, shop_name: &str, pickup_location: &str) -> Self {
        Self::new(
            base_url,
            "/checkout",
            format!("Kassa - {shop_name} | Judo Gi & Judo Dräkt"),
            format!(
                "Slutför din beställning på {shop_name}. Högkvalitativ judo utrustning för {pickup_location}."
            ),
        )
    }

    /// Title and description for a category page, based on keywords in
    /// the category name.
    #[must_use]
    pub fn category(base_url: &str, shop_name: &str, name: &str) -> Self {
        let display = capitalize(name);
        let (title, description) = match ProductFamily::from_name(name) {
            Some(ProductFamily::Gi) => (
                format!("Judogi Sverige & Kimono - {display} | {shop_name}"),
                format!(
                    "Köp {name} (judogi, kimono) från {shop_name}. Högkvalitativa judo gi för träning och tävling. Snabb leverans från Sverige."
                ),
            ),
            Some(ProductFamily::Suit) => (
                format!("Judodräkter - {display} | {shop_name}"),
                format!(
                    "Köp {name} (judodräkter) för barn och vuxna från {shop_name}. Högkvalitativ judo utrustning. Snabb leverans från Sverige."
                ),
            ),
            Some(ProductFamily::Belt) => (
                format!("Judo Bälte & Bälten - {display} | {shop_name}"),
                format!(
                    "Köp {name} (judo bälte, judo bälten) från {shop_name}. Högkvalitativa bälten för alla nivåer. Snabb leverans från Sverige."
                ),
            ),
            None => (
                format!("{display} - {shop_name}"),
                format!(
                    "Köp {name} från {shop_name}. Högkvalitativa produkter med snabb leverans från Sverige."
                ),
            ),
        };
        Self::new(
            base_url,
            &format!("/category/{}", urlencoding::encode(name)),
            title,
            description,
        )
    }

    #[must_use]
    pub fn product(base_url: &str, shop_name: &str, product: &Product, image: Option<String>) -> Self {
        let mut meta = Self::new(
            base_url,
            &format!("/products/{}", product.id),
            format!("{} | {shop_name}", product.name),
            product_description(product, shop_name),
        );
        meta.og_type = "product";
        meta.image = image;
        meta
    }
}

/// Product family recognised from a category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductFamily {
    Gi,
    Suit,
    Belt,
}

impl ProductFamily {
    fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("gi") || lower.contains("kimono") {
            Some(Self::Gi)
        } else if lower.contains("dräkt") {
            Some(Self::Suit)
        } else if lower.contains("bälte") {
            Some(Self::Belt)
        } else {
            None
        }
    }

    const fn schema_category(self) -> &'static str {
        match self {
            Self::Gi => "Judogi / Kimono",
            Self::Suit => "Judodräkt",
            Self::Belt => "Judo Bälte",
        }
    }
}

fn canonical_url(base_url: &str, path: &str) -> String {
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    if path == "/" {
        base_url.to_string()
    } else {
        format!("{base_url}{path}")
    }
}

fn is_children(age_group: &str) -> bool {
    let lower = age_group.to_lowercase();
    lower == "barn" || lower == "children"
}

/// The product's own description, or one synthesized from its attributes.
#[must_use]
pub fn product_description(product: &Product, shop_name: &str) -> String {
    if let Some(description) = product.description.as_deref().filter(|d| !d.trim().is_empty()) {
        return description.to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    if let Some(category) = product.primary_category() {
        let lower = category.to_lowercase();
        let family = if lower.contains("gi") {
            "Judogi"
        } else if lower.contains("dräkt") {
            "Judodräkt"
        } else if lower.contains("bälte") {
            "Judo bälte"
        } else {
            category
        };
        parts.push(family.to_string());
    }
    if let Some(color) = product.color.as_deref() {
        parts.push(color.to_string());
    }
    if let Some(age_group) = product.age_group.as_deref() {
        parts.push(if is_children(age_group) { "för barn" } else { "för vuxna" }.to_string());
    }
    if let Some(gsm) = product.gsm.as_deref() {
        parts.push(format!("{gsm} GSM"));
    }

    let mut description = product.name.clone();
    if !parts.is_empty() {
        let _ = write!(description, " - {}", parts.join(", "));
    }
    let _ = write!(
        description,
        ". Högkvalitativ judo utrustning från {shop_name}. Snabb leverans från Sverige. Perfekt för träning och tävling."
    );
    description
}

/// schema.org category for a product.
#[must_use]
pub fn schema_category(product: &Product) -> &'static str {
    product
        .primary_category()
        .and_then(ProductFamily::from_name)
        .map_or("Judo Equipment", ProductFamily::schema_category)
}

fn seller(base_url: &str, shop_name: &str) -> Value {
    json!({
        "@type": "Organization",
        "name": shop_name,
        "url": base_url,
    })
}

fn offer(base_url: &str, shop_name: &str, product: &Product) -> Value {
    json!({
        "@type": "Offer",
        "price": product.effective_price().to_plain_string(),
        "priceCurrency": CURRENCY_CODE,
        "availability": product.stock_status().schema_org(),
        "url": format!("{base_url}/products/{}", product.id),
        "seller": seller(base_url, shop_name),
    })
}

/// JSON-LD `Product` for a product detail page.
#[must_use]
pub fn product_json_ld(base_url: &str, shop_name: &str, images: &ImageUrls, product: &Product) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "name": product.name,
        "description": product_description(product, shop_name),
        "image": product.images.iter().map(|f| images.full(f)).collect::<Vec<_>>(),
        "brand": { "@type": "Brand", "name": shop_name },
        "category": schema_category(product),
        "offers": offer(base_url, shop_name, product),
    })
}

/// JSON-LD `Store` for the home page, listing every product as an offer.
#[must_use]
pub fn store_json_ld(base_url: &str, shop_name: &str, images: &ImageUrls, products: &[Product]) -> Value {
    let logo = format!("{base_url}/static/images/logo.svg");
    let offers: Vec<Value> = products
        .iter()
        .map(|product| {
            let image = product
                .primary_image()
                .map_or_else(|| logo.clone(), |f| images.full(f));
            let mut offer = offer(base_url, shop_name, product);
            offer["itemOffered"] = json!({
                "@type": "Product",
                "name": product.name,
                "description": product_description(product, shop_name),
                "image": image,
                "brand": { "@type": "Brand", "name": shop_name },
                "category": schema_category(product),
            });
            offer
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "Store",
        "name": shop_name,
        "description": STORE_DESCRIPTION,
        "url": base_url,
        "logo": logo,
        "address": {
            "@type": "PostalAddress",
            "addressLocality": "Alingsås",
            "addressRegion": "Västra Götaland",
            "addressCountry": "SE",
        },
        "sameAs": [base_url],
        "offers": offers,
    })
}

/// Serialize structured data for an inline `<script type="application/ld+json">`.
#[must_use]
pub fn json_ld(value: &Value) -> String {
    escape_script_json(&value.to_string())
}

// =============================================================================
// Sitemap
// =============================================================================

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn push_url(xml: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    let _ = write!(
        xml,
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{lastmod}</lastmod>\n    <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n",
        xml_escape(loc)
    );
}

/// Build `sitemap.xml`: home, categories, products, then cart and checkout.
#[must_use]
pub fn sitemap(base_url: &str, categories: &[Category], products: &[Product], today: NaiveDate) -> String {
    let lastmod = today.format("%Y-%m-%d").to_string();
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    push_url(&mut xml, base_url, &lastmod, "weekly", "1.0");
    for category in categories {
        let loc = format!("{base_url}/category/{}", urlencoding::encode(&category.name));
        push_url(&mut xml, &loc, &lastmod, "weekly", "0.9");
    }
    for product in products {
        let loc = format!("{base_url}/products/{}", product.id);
        push_url(&mut xml, &loc, &lastmod, "monthly", "0.8");
    }
    for page in ["cart", "checkout"] {
        push_url(&mut xml, &format!("{base_url}/{page}"), &lastmod, "monthly", "0.3");
    }

    xml.push_str("</urlset>");
    xml
}

/// `robots.txt` pointing crawlers at the sitemap.
#[must_use]
pub fn robots(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /cart/\nDisallow: /checkout/\n\nSitemap: {base_url}/sitemap.xml\n"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const BASE: &str = "https://yakimoto.se";

    fn product(value: Value) -> Product {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_category_keyword_titles() {
        let gi = PageMeta::category(BASE, "Yakimoto Dojo", "judogi");
        assert_eq!(gi.title, "Judogi Sverige & Kimono - Judogi | Yakimoto Dojo");

        let suit = PageMeta::category(BASE, "Yakimoto Dojo", "judodräkter");
        assert_eq!(suit.title, "Judodräkter - Judodräkter | Yakimoto Dojo");

        let belt = PageMeta::category(BASE, "Yakimoto Dojo", "bälten");
        assert_eq!(belt.title, "Judo Bälte & Bälten - Bälten | Yakimoto Dojo");

        let other = PageMeta::category(BASE, "Yakimoto Dojo", "väskor");
        assert_eq!(other.title, "Väskor - Yakimoto Dojo");
        assert_eq!(
            other.description,
            "Köp väskor från Yakimoto Dojo. Högkvalitativa produkter med snabb leverans från Sverige."
        );
        assert_eq!(other.canonical, "https://yakimoto.se/category/v%C3%A4skor");
    }

    #[test]
    fn test_synthesized_description() {
        let p = product(json!({
            "id": 1,
            "name": "Fighter",
            "price": 899,
            "categories": [{"id": 1, "name": "judogi"}],
            "color": "vit",
            "age_group": "barn",
            "gsm": "550"
        }));
        assert_eq!(
            product_description(&p, "Yakimoto Dojo"),
            "Fighter - Judogi, vit, för barn, 550 GSM. Högkvalitativ judo utrustning från Yakimoto Dojo. Snabb leverans från Sverige. Perfekt för träning och tävling."
        );
        assert_eq!(schema_category(&p), "Judogi / Kimono");
    }

    #[test]
    fn test_own_description_wins() {
        let p = product(json!({
            "id": 1, "name": "Bälte", "price": 149, "description": "Ett vitt bälte."
        }));
        assert_eq!(product_description(&p, "Yakimoto Dojo"), "Ett vitt bälte.");
        assert_eq!(schema_category(&p), "Judo Equipment");
    }

    #[test]
    fn test_product_json_ld_uses_effective_price() {
        let p = product(json!({
            "id": 4,
            "name": "Gi",
            "price": 1000,
            "sale_price": 800,
            "sizes": {"170": 3},
            "images": ["a.jpg"]
        }));
        let images = ImageUrls::new("https://api.yakimoto.se");
        let ld = product_json_ld(BASE, "Yakimoto Dojo", &images, &p);
        assert_eq!(ld["offers"]["price"], "800");
        assert_eq!(ld["offers"]["priceCurrency"], "SEK");
        assert_eq!(ld["offers"]["availability"], "https://schema.org/InStock");
        assert_eq!(ld["image"][0], "https://api.yakimoto.se/uploads/a.jpg");
    }

    #[test]
    fn test_json_ld_escapes_script_end() {
        let out = json_ld(&json!({"name": "</script>"}));
        assert!(!out.contains("</script>"));
    }

    #[test]
    fn test_sitemap_priorities() {
        let categories: Vec<Category> =
            serde_json::from_value(json!([{"id": 1, "name": "bälten"}])).unwrap();
        let products = vec![product(json!({"id": 9, "name": "Gi", "price": 100}))];
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let xml = sitemap(BASE, &categories, &products, today);

        assert!(xml.contains("<loc>https://yakimoto.se</loc>"));
        assert!(xml.contains("<loc>https://yakimoto.se/category/b%C3%A4lten</loc>"));
        assert!(xml.contains("<loc>https://yakimoto.se/products/9</loc>"));
        assert!(xml.contains("<priority>0.9</priority>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert_eq!(xml.matches("<priority>0.3</priority>").count(), 2);
        assert!(xml.contains("<lastmod>2024-05-01</lastmod>"));
        assert!(xml.ends_with("</urlset>"));
    }

    #[test]
    fn test_robots_links_sitemap() {
        assert!(robots(BASE).contains("Sitemap: https://yakimoto.se/sitemap.xml"));
    }
}
