//! Shopping cart kept in the visitor's session.
//!
//! A line is identified by `(product_id, selected_size)`. Each line carries a
//! snapshot of the product taken when it was added, including `available`,
//! the stock ceiling the quantity can never exceed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::{Price, ProductId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("size {size} of {name} is out of stock")]
    OutOfStock { name: String, size: String },

    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("item is not in the cart")]
    NotInCart,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub selected_size: String,
    pub quantity: u32,
    pub available: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CartItem {
    /// Snapshot `product` in `size`, priced at what the customer pays today.
    #[must_use]
    pub fn from_product(product: &Product, size: &str, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.effective_price(),
            selected_size: size.to_owned(),
            quantity,
            available: product.sizes.quantity(size),
            image: product.primary_image().map(str::to_owned),
            category: product.primary_category().map(str::to_owned),
            color: product.color.clone(),
        }
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    fn is(&self, product_id: ProductId, size: &str) -> bool {
        self.product_id == product_id && self.selected_size == size
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId, size: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.is(product_id, size))
    }

    /// Add a line, merging with an existing line for the same product and size.
    ///
    /// The merged quantity is capped at the newest `available`. Returns the
    /// quantity of the line after the add.
    ///
    /// # Errors
    ///
    /// `ZeroQuantity` for a zero quantity, `OutOfStock` when nothing is
    /// available in that size.
    pub fn add(&mut self, item: CartItem) -> Result<u32, CartError> {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if item.available == 0 {
            return Err(CartError::OutOfStock {
                name: item.name,
                size: item.selected_size,
            });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.is(item.product_id, &item.selected_size))
        {
            existing.available = item.available;
            existing.unit_price = item.unit_price;
            existing.quantity = existing
                .quantity
                .saturating_add(item.quantity)
                .min(existing.available);
            return Ok(existing.quantity);
        }

        let quantity = item.quantity.min(item.available);
        self.items.push(CartItem { quantity, ..item });
        Ok(quantity)
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// `NotInCart` if no line matches.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self
                .remove(product_id, size)
                .map(|_| ())
                .ok_or(CartError::NotInCart);
        }
        let line = self
            .items
            .iter_mut()
            .find(|line| line.is(product_id, size))
            .ok_or(CartError::NotInCart)?;
        line.quantity = quantity.min(line.available);
        Ok(())
    }

    pub fn remove(&mut self, product_id: ProductId, size: &str) -> Option<CartItem> {
        let index = self.items.iter().position(|line| line.is(product_id, size))?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of units across all lines (the badge number).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |acc, item| acc.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: i64, size: &str, quantity: u32, available: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Produkt {id}"),
            unit_price: Price::from_kronor(499),
            selected_size: size.to_owned(),
            quantity,
            available,
            image: None,
            category: None,
            color: None,
        }
    }

    #[test]
    fn test_add_dedups_by_product_and_size() {
        let mut cart = Cart::new();
        cart.add(item(1, "170", 1, 5)).unwrap();
        cart.add(item(1, "170", 2, 5)).unwrap();
        cart.add(item(1, "180", 1, 5)).unwrap();
        cart.add(item(2, "170", 1, 5)).unwrap();

        assert_eq!(cart.line_count(), 3);
        assert_eq!(cart.get(ProductId::new(1), "170").unwrap().quantity, 3);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_add_caps_at_available() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(item(1, "170", 4, 3)).unwrap(), 3);
        assert_eq!(cart.add(item(1, "170", 1, 3)).unwrap(), 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_rejects_out_of_stock_and_zero() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add(item(1, "170", 1, 0)),
            Err(CartError::OutOfStock { .. })
        ));
        assert_eq!(cart.add(item(1, "170", 0, 5)), Err(CartError::ZeroQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        cart.add(item(1, "170", 1, 4)).unwrap();
        cart.update_quantity(ProductId::new(1), "170", 10).unwrap();
        assert_eq!(cart.item_count(), 4);
        cart.update_quantity(ProductId::new(1), "170", 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(
            cart.update_quantity(ProductId::new(1), "170", 1),
            Err(CartError::NotInCart)
        );
    }

    #[test]
    fn test_subtotal_is_quantity_times_price() {
        let mut cart = Cart::new();
        cart.add(item(1, "170", 2, 5)).unwrap();
        cart.add(CartItem {
            unit_price: Price::from_kronor(150),
            ..item(2, "M", 3, 5)
        })
        .unwrap();
        assert_eq!(cart.subtotal(), Price::from_kronor(499 * 2 + 150 * 3));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(item(1, "170", 1, 5)).unwrap();
        cart.add(item(2, "170", 1, 5)).unwrap();
        assert!(cart.remove(ProductId::new(1), "170").is_some());
        assert!(cart.remove(ProductId::new(1), "170").is_none());
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Price::zero());
    }

    #[test]
    fn test_from_product_snapshots_sale_price_and_stock() {
        let product: Product = serde_json::from_value(json!({
            "id": 9,
            "name": "Judogi",
            "price": 1000,
            "discount_percent": 10,
            "sizes": {"170": {"online": 1, "club": 2}},
            "images": ["gi.jpg"],
            "categories": [{"id": 1, "name": "judo"}],
            "color": "white"
        }))
        .unwrap();
        let line = CartItem::from_product(&product, "170", 1);
        assert_eq!(line.unit_price, Price::from_kronor(900));
        assert_eq!(line.available, 3);
        assert_eq!(line.image.as_deref(), Some("gi.jpg"));
        assert_eq!(line.category.as_deref(), Some("judo"));
        assert_eq!(CartItem::from_product(&product, "999", 1).available, 0);
    }

    #[test]
    fn test_session_roundtrip_keeps_lines() {
        let mut cart = Cart::new();
        cart.add(item(1, "170", 2, 5)).unwrap();
        let stored = serde_json::to_value(&cart).unwrap();
        let restored: Cart = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, cart);
    }
}
