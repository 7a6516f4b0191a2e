//! Request bodies for backend mutations.
//!
//! Product and category writes are multipart forms (they may carry images);
//! inventory moves are plain URL-encoded forms.

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use yakimoto_core::CategoryId;
use yakimoto_core::Price;
use yakimoto_core::inventory::{Location, SizeInventory};
use yakimoto_core::pricing::Discount;

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    fn into_part(self) -> Result<Part, reqwest::Error> {
        let part = Part::bytes(self.bytes).file_name(self.filename);
        match self.content_type {
            Some(content_type) => part.mime_str(&content_type),
            None => Ok(part),
        }
    }
}

/// A validated product as sent on create and update.
#[derive(Debug, Clone)]
pub struct ProductSubmission {
    pub name: String,
    pub price: Price,
    pub sizes: SizeInventory,
    pub category_ids: Vec<CategoryId>,
    /// Legacy single category column, kept in sync with the first linked category.
    pub category: Option<String>,
    pub color: Option<String>,
    pub gsm: Option<String>,
    pub age_group: Option<String>,
    pub description: Option<String>,
    pub discount: Discount,
    pub images: Vec<Upload>,
}

impl ProductSubmission {
    /// Build the multipart body.
    ///
    /// Optional fields are left out rather than sent empty; the backend
    /// reads a missing discount as "no discount". `category_ids` is always
    /// sent so that unchecking every category clears the links.
    ///
    /// # Errors
    ///
    /// Returns an error if an image carries an invalid content type.
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let category_ids = self
            .category_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let (sale_price, discount_percent) = self.discount.form_fields();

        let mut form = Form::new()
            .text("name", self.name)
            .text("price", self.price.to_plain_string())
            .text("sizes", self.sizes.to_json_string())
            .text("category_ids", category_ids);

        let optional = [
            ("category", self.category),
            ("color", self.color),
            ("gsm", self.gsm),
            ("age_group", self.age_group),
            ("description", self.description),
            ("sale_price", sale_price),
            ("discount_percent", discount_percent),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                form = form.text(field, value);
            }
        }

        for image in self.images {
            form = form.part("images", image.into_part()?);
        }
        Ok(form)
    }
}

/// A category as sent on create and update.
#[derive(Debug, Clone)]
pub struct CategorySubmission {
    pub name: String,
    pub image: Option<Upload>,
}

impl CategorySubmission {
    /// Build the multipart body.
    ///
    /// # Errors
    ///
    /// Returns an error if the image carries an invalid content type.
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let form = Form::new().text("name", self.name);
        match self.image {
            Some(image) => Ok(form.part("image", image.into_part()?)),
            None => Ok(form),
        }
    }
}

/// Move units of one size between stock locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryMove {
    pub size: String,
    pub quantity: u32,
    #[serde(rename = "from_location")]
    pub from: Location,
    #[serde(rename = "to_location")]
    pub to: Location,
}

impl InventoryMove {
    /// Apply the move to a copy of `sizes`, so it can be rejected before it
    /// reaches the backend.
    ///
    /// # Errors
    ///
    /// Returns the same errors the backend would: equal locations, a zero
    /// quantity, an unknown size, or too little stock at the source.
    pub fn apply(
        &self,
        sizes: &SizeInventory,
    ) -> Result<SizeInventory, yakimoto_core::inventory::InventoryError> {
        let mut moved = sizes.clone();
        moved.move_between(&self.size, i64::from(self.quantity), self.from, self.to)?;
        Ok(moved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use yakimoto_core::inventory::{InventoryError, SizeStock};

    use super::*;

    fn sizes() -> SizeInventory {
        [("170".to_string(), SizeStock { online: 2, club: 1 })]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_inventory_move_form_encoding() {
        let body = serde_json::to_value(InventoryMove {
            size: "170".to_string(),
            quantity: 2,
            from: Location::Online,
            to: Location::Club,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "size": "170",
                "quantity": 2,
                "from_location": "online",
                "to_location": "club"
            })
        );
    }

    #[test]
    fn test_apply_leaves_original_untouched() {
        let original = sizes();
        let moved = InventoryMove {
            size: "170".to_string(),
            quantity: 2,
            from: Location::Online,
            to: Location::Club,
        }
        .apply(&original)
        .unwrap();
        assert_eq!(moved.quantity_at("170", Location::Club), 3);
        assert_eq!(original.quantity_at("170", Location::Club), 1);
    }

    #[test]
    fn test_apply_rejects_overdraw() {
        let err = InventoryMove {
            size: "170".to_string(),
            quantity: 2,
            from: Location::Club,
            to: Location::Online,
        }
        .apply(&sizes())
        .unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            }
        ));
    }
}
