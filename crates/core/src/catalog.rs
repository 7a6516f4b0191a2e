//! Products and categories as served by the shop backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::inventory::SizeInventory;
use crate::pricing::{self, Discount};
use crate::types::{CategoryId, Price, ProductId, StockStatus};

/// Category reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// A product with its stock, images, and categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub sale_price: Option<Price>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub discount_percent: Option<i64>,
    #[serde(default)]
    pub sizes: SizeInventory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<CategoryRef>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gsm: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age_group: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_new: bool,
}

impl Product {
    #[must_use]
    pub fn discount(&self) -> Discount {
        Discount::from_stored(self.sale_price, self.discount_percent)
    }

    /// Sale price, only when it is a real reduction of the list price.
    #[must_use]
    pub fn effective_sale_price(&self) -> Option<Price> {
        pricing::effective_sale_price(self.price, self.sale_price, self.discount_percent)
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.effective_sale_price().is_some()
    }

    /// What a customer pays per unit right now.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        self.effective_sale_price().unwrap_or(self.price)
    }

    /// Percentage saved, for the sale badge.
    #[must_use]
    pub fn discount_label(&self) -> Option<u32> {
        self.effective_sale_price()
            .map(|sale| pricing::discount_percent_label(self.price, sale))
    }

    #[must_use]
    pub fn stock_status(&self) -> StockStatus {
        self.sizes.stock_status()
    }

    /// The main image, falling back to the first uploaded one.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.main_image
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.images.first().map(String::as_str))
    }

    /// Name of the first linked category, else the legacy `category` column.
    #[must_use]
    pub fn primary_category(&self) -> Option<&str> {
        self.categories
            .first()
            .map(|c| c.name.as_str())
            .or(self.category.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Whether the product is linked to a category, compared case-insensitively.
    #[must_use]
    pub fn in_category(&self, name: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(name))
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image_filename: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

impl Category {
    /// Name with its first letter capitalized, as shown in navigation.
    #[must_use]
    pub fn display_name(&self) -> String {
        capitalize(&self.name)
    }
}

/// Order categories by `display_order` (missing counts as 0), then by id.
pub fn sort_for_display(categories: &mut [Category]) {
    categories.sort_by_key(|c| (c.display_order.unwrap_or(0), c.id));
}

/// One hero panel: a representative product for an attribute combination.
#[derive(Debug, Clone)]
pub struct ProductGroup {
    pub label: String,
    pub product: Product,
}

/// Group products by (age group, color, GSM) in first-seen order and keep the
/// first product of each group, at most `limit` groups.
///
/// Labels read like `Children Blue 550GSM`; products without any of the three
/// attributes are labelled with their own name.
#[must_use]
pub fn group_by_attributes(products: &[Product], limit: usize) -> Vec<ProductGroup> {
    let mut seen: Vec<String> = Vec::new();
    let mut groups = Vec::new();

    for product in products {
        let age_group = product.age_group.as_deref().unwrap_or("").trim();
        let color = product.color.as_deref().unwrap_or("").trim();
        let gsm = product.gsm.as_deref().unwrap_or("").trim();

        let key = format!(
            "{}_{}_{}",
            age_group.to_lowercase(),
            color.to_lowercase(),
            gsm.to_lowercase()
        );
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let mut parts = Vec::new();
        if !age_group.is_empty() {
            parts.push(capitalize(age_group));
        }
        if !color.is_empty() {
            parts.push(capitalize(color));
        }
        if !gsm.is_empty() {
            parts.push(format!("{gsm}GSM"));
        }
        let label = if parts.is_empty() {
            product.name.clone()
        } else {
            parts.join(" ")
        };

        groups.push(ProductGroup {
            label,
            product: product.clone(),
        });
        if groups.len() == limit {
            break;
        }
    }

    groups
}

/// Uppercase the first character, leaving the rest untouched.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// The backend is loose about column types: `gsm` may be a number, `is_new` an
// integer, and optional text a null or an empty string.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(value: Value) -> Product {
        serde_json::from_value(value).unwrap()
    }

    fn gi(id: i64, age_group: &str, color: &str, gsm: Value) -> Product {
        product(json!({
            "id": id,
            "name": format!("Gi {id}"),
            "price": 899,
            "age_group": age_group,
            "color": color,
            "gsm": gsm,
        }))
    }

    #[test]
    fn test_deserializes_backend_product() {
        let p = product(json!({
            "id": 3,
            "name": "Judogi Yakimoto",
            "price": 1000,
            "sale_price": 900,
            "discount_percent": 20,
            "sizes": "{\"170\": {\"online\": 2, \"club\": 1}}",
            "images": ["a.jpg", "b.png"],
            "main_image": "b.png",
            "categories": [{"id": 1, "name": "judo"}],
            "category": "judo",
            "color": "white",
            "gsm": 750,
            "age_group": null,
            "description": "",
            "is_new": 1
        }));
        assert_eq!(p.sizes.quantity("170"), 3);
        assert_eq!(p.gsm.as_deref(), Some("750"));
        assert_eq!(p.description, None);
        assert!(p.is_new);
        assert_eq!(p.effective_sale_price(), Some(Price::from_kronor(800)));
        assert_eq!(p.effective_price(), Price::from_kronor(800));
        assert_eq!(p.discount_label(), Some(20));
        assert_eq!(p.primary_image(), Some("b.png"));
        assert_eq!(p.primary_category(), Some("judo"));
        assert_eq!(p.stock_status(), StockStatus::InStock);
    }

    #[test]
    fn test_minimal_product_defaults() {
        let p = product(json!({"id": 1, "name": "Bälte", "price": 149, "images": null}));
        assert!(p.sizes.is_empty());
        assert!(!p.is_on_sale());
        assert_eq!(p.effective_price(), Price::from_kronor(149));
        assert_eq!(p.primary_image(), None);
        assert_eq!(p.stock_status(), StockStatus::OutOfStock);
    }

    #[test]
    fn test_primary_image_falls_back_to_first() {
        let p = product(json!({"id": 1, "name": "x", "price": 1, "images": ["first.jpg"], "main_image": null}));
        assert_eq!(p.primary_image(), Some("first.jpg"));
    }

    #[test]
    fn test_in_category_ignores_case() {
        let p = product(json!({"id": 1, "name": "x", "price": 1, "categories": [{"id": 2, "name": "Judo"}]}));
        assert!(p.in_category("judo"));
        assert!(!p.in_category("karate"));
    }

    #[test]
    fn test_sort_categories_for_display() {
        let mut categories: Vec<Category> = serde_json::from_value(json!([
            {"id": 3, "name": "karate", "display_order": 2},
            {"id": 2, "name": "judo", "display_order": null},
            {"id": 1, "name": "bälten", "display_order": 0},
        ]))
        .unwrap();
        sort_for_display(&mut categories);
        let names: Vec<_> = categories.iter().map(Category::display_name).collect();
        assert_eq!(names, ["Bälten", "Judo", "Karate"]);
    }

    #[test]
    fn test_group_by_attributes_labels_and_dedups() {
        let products = [
            gi(1, "children", "blue", json!(550)),
            gi(2, "Children", "Blue", json!("550")),
            gi(3, "", "white", json!(750)),
            product(json!({"id": 4, "name": "Zori", "price": 199})),
        ];
        let groups = group_by_attributes(&products, 4);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Children Blue 550GSM", "White 750GSM", "Zori"]);
        assert_eq!(groups.first().unwrap().product.id, ProductId::new(1));
    }

    #[test]
    fn test_group_by_attributes_limit() {
        let products: Vec<_> = (1..=6)
            .map(|i| gi(i, "adult", "white", json!(i * 100)))
            .collect();
        assert_eq!(group_by_attributes(&products, 4).len(), 4);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("ädelsten"), "Ädelsten");
        assert_eq!(capitalize(""), "");
    }
}
