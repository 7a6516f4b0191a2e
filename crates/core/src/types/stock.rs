//! Stock status shown next to products.

use serde::{Deserialize, Serialize};

/// Highest total quantity that still counts as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 2;

/// Availability label derived from the total quantity of a product or size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    /// `0` is out of stock, `1..=2` is low stock, anything above is in stock.
    #[must_use]
    pub const fn from_quantity(quantity: u32) -> Self {
        match quantity {
            0 => Self::OutOfStock,
            q if q <= LOW_STOCK_THRESHOLD => Self::LowStock,
            _ => Self::InStock,
        }
    }

    /// Label shown in the shop.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => "Slut i lager",
            Self::LowStock => "Lågt i lager",
            Self::InStock => "I lager",
        }
    }

    /// CSS modifier used by the templates.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::OutOfStock => "out-of-stock",
            Self::LowStock => "low-stock",
            Self::InStock => "in-stock",
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        !matches!(self, Self::OutOfStock)
    }

    /// schema.org availability URL for structured data.
    #[must_use]
    pub const fn schema_org(&self) -> &'static str {
        match self {
            Self::OutOfStock => "https://schema.org/OutOfStock",
            Self::LowStock => "https://schema.org/LimitedAvailability",
            Self::InStock => "https://schema.org/InStock",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(StockStatus::from_quantity(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(1), StockStatus::LowStock);
        assert_eq!(StockStatus::from_quantity(2), StockStatus::LowStock);
        assert_eq!(StockStatus::from_quantity(3), StockStatus::InStock);
    }

    #[test]
    fn test_labels() {
        assert_eq!(StockStatus::OutOfStock.to_string(), "Slut i lager");
        assert_eq!(StockStatus::LowStock.label(), "Lågt i lager");
        assert_eq!(StockStatus::InStock.label(), "I lager");
        assert!(!StockStatus::OutOfStock.is_available());
    }
}
