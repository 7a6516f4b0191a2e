//! Cache types for catalog reads.

use std::sync::Arc;

use yakimoto_core::ProductId;
use yakimoto_core::catalog::{Category, Product};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    /// Products linked to a category, by category name.
    CategoryProducts(String),
    /// Products for the grouped hero panels, by category name.
    Grouped(String),
    Categories,
    PublishableKey,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Categories(Arc<Vec<Category>>),
    PublishableKey(Option<String>),
}
