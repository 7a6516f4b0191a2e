//! Discount rules.
//!
//! A product is on sale either by a percentage or by a fixed sale price, never
//! both. When the admin form carries both, the percentage wins and the fixed
//! price is dropped.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use crate::types::Price;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("{field} is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("discount percent must be between 1 and 99, got {0}")]
    PercentOutOfRange(i64),

    #[error("sale price must be whole kronor, got {0}")]
    FractionalSalePrice(String),

    #[error("sale price must be lower than the price")]
    SalePriceNotBelowPrice,

    #[error("price must be positive")]
    NonPositivePrice,
}

/// How a product is discounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discount {
    #[default]
    None,
    Percent(u8),
    SalePrice(Price),
}

impl Discount {
    /// Build a discount from the raw admin form fields.
    ///
    /// Blank fields count as absent and zero counts as "no discount".
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable numbers, a percent outside `1..=99`,
    /// or a fixed sale price that is not whole kronor or not below `price`.
    pub fn from_form(
        price: Price,
        sale_price: Option<&str>,
        discount_percent: Option<&str>,
    ) -> Result<Self, PricingError> {
        if !price.is_positive() {
            return Err(PricingError::NonPositivePrice);
        }

        if let Some(raw) = non_blank(discount_percent) {
            let percent: i64 = raw.parse().map_err(|_| PricingError::InvalidNumber {
                field: "discount_percent",
                value: raw.to_owned(),
            })?;
            if percent != 0 {
                let percent = u8::try_from(percent)
                    .ok()
                    .filter(|p| (1..=99).contains(p))
                    .ok_or(PricingError::PercentOutOfRange(percent))?;
                return Ok(Self::Percent(percent));
            }
        }

        if let Some(raw) = non_blank(sale_price) {
            let sale = Price::parse(raw).map_err(|_| PricingError::InvalidNumber {
                field: "sale_price",
                value: raw.to_owned(),
            })?;
            if !sale.amount().fract().is_zero() {
                return Err(PricingError::FractionalSalePrice(raw.to_owned()));
            }
            if sale.amount().is_zero() {
                return Ok(Self::None);
            }
            if !sale.is_positive() || sale >= price {
                return Err(PricingError::SalePriceNotBelowPrice);
            }
            return Ok(Self::SalePrice(sale));
        }

        Ok(Self::None)
    }

    /// Reconstruct the discount stored on a product.
    #[must_use]
    pub fn from_stored(sale_price: Option<Price>, discount_percent: Option<i64>) -> Self {
        match discount_percent.and_then(|p| u8::try_from(p).ok()) {
            Some(p) if (1..=99).contains(&p) => Self::Percent(p),
            _ => sale_price
                .filter(Price::is_positive)
                .map_or(Self::None, Self::SalePrice),
        }
    }

    /// The price a customer pays while this discount applies, or `None` when
    /// the discount does not produce a real reduction.
    #[must_use]
    pub fn sale_price(&self, price: Price) -> Option<Price> {
        let sale = match self {
            Self::None => return None,
            Self::Percent(pct) => percent_off(price, *pct),
            Self::SalePrice(sale) => *sale,
        };
        (sale.is_positive() && sale < price).then_some(sale)
    }

    /// Form values to send to the backend: `(sale_price, discount_percent)`.
    #[must_use]
    pub fn form_fields(&self) -> (Option<String>, Option<String>) {
        match self {
            Self::None => (None, None),
            Self::Percent(pct) => (None, Some(pct.to_string())),
            Self::SalePrice(sale) => (Some(sale.to_plain_string()), None),
        }
    }
}

/// `trunc(price × (100 − pct) / 100)`, matching how the backend stores it.
fn percent_off(price: Price, pct: u8) -> Price {
    let factor = Decimal::from(100 - u32::from(pct.min(100)));
    Price::new((price.amount() * factor / Decimal::ONE_HUNDRED).trunc())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Sale price the storefront should show for a product as stored: the
/// percentage first, then a fixed sale price, otherwise none.
#[must_use]
pub fn effective_sale_price(
    price: Price,
    sale_price: Option<Price>,
    discount_percent: Option<i64>,
) -> Option<Price> {
    Discount::from_stored(sale_price, discount_percent).sale_price(price)
}

/// Rounded percentage saved, for "-20%" badges.
#[must_use]
pub fn discount_percent_label(price: Price, sale: Price) -> u32 {
    if !price.is_positive() || sale >= price {
        return 0;
    }
    let pct = (price.amount() - sale.amount()) / price.amount() * Decimal::ONE_HUNDRED;
    pct.round().to_u32().unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kr(amount: i64) -> Price {
        Price::from_kronor(amount)
    }

    #[test]
    fn test_percent_wins_over_fixed_sale_price() {
        let discount = Discount::from_form(kr(1000), Some("700"), Some("20")).unwrap();
        assert_eq!(discount, Discount::Percent(20));
        assert_eq!(discount.form_fields(), (None, Some("20".to_owned())));
    }

    #[test]
    fn test_fixed_sale_price_when_no_percent() {
        let discount = Discount::from_form(kr(1000), Some("700"), Some("")).unwrap();
        assert_eq!(discount, Discount::SalePrice(kr(700)));
        assert_eq!(discount.form_fields(), (Some("700".to_owned()), None));
    }

    #[test]
    fn test_zero_percent_falls_back_to_sale_price() {
        let discount = Discount::from_form(kr(1000), Some("700"), Some("0")).unwrap();
        assert_eq!(discount, Discount::SalePrice(kr(700)));
    }

    #[test]
    fn test_blank_fields_mean_no_discount() {
        assert_eq!(Discount::from_form(kr(1000), None, None).unwrap(), Discount::None);
        assert_eq!(
            Discount::from_form(kr(1000), Some(" "), Some("")).unwrap(),
            Discount::None
        );
        assert_eq!(Discount::from_form(kr(1000), Some("0"), None).unwrap(), Discount::None);
    }

    #[test]
    fn test_fixed_sale_price_must_be_whole_kronor() {
        assert_eq!(
            Discount::from_form(kr(1000), Some("499,50"), None),
            Err(PricingError::FractionalSalePrice("499,50".to_owned()))
        );
        let discount = Discount::from_form(kr(1000), Some("499,00"), None).unwrap();
        assert_eq!(discount.form_fields(), (Some("499".to_owned()), None));
    }

    #[test]
    fn test_form_errors() {
        assert_eq!(
            Discount::from_form(kr(1000), None, Some("100")),
            Err(PricingError::PercentOutOfRange(100))
        );
        assert_eq!(
            Discount::from_form(kr(1000), None, Some("-5")),
            Err(PricingError::PercentOutOfRange(-5))
        );
        assert_eq!(
            Discount::from_form(kr(1000), Some("1000"), None),
            Err(PricingError::SalePriceNotBelowPrice)
        );
        assert!(matches!(
            Discount::from_form(kr(1000), None, Some("tio")),
            Err(PricingError::InvalidNumber { field: "discount_percent", .. })
        ));
        assert_eq!(
            Discount::from_form(Price::zero(), None, Some("10")),
            Err(PricingError::NonPositivePrice)
        );
    }

    #[test]
    fn test_percent_sale_price_truncates() {
        assert_eq!(Discount::Percent(15).sale_price(kr(499)), Some(kr(424)));
        assert_eq!(Discount::Percent(50).sale_price(kr(1)), None);
    }

    #[test]
    fn test_effective_sale_price_prefers_percent() {
        assert_eq!(effective_sale_price(kr(1000), Some(kr(900)), Some(20)), Some(kr(800)));
        assert_eq!(effective_sale_price(kr(1000), Some(kr(900)), None), Some(kr(900)));
        assert_eq!(effective_sale_price(kr(1000), Some(kr(1200)), None), None);
        assert_eq!(effective_sale_price(kr(1000), None, Some(0)), None);
        assert_eq!(effective_sale_price(kr(1000), None, None), None);
    }

    #[test]
    fn test_discount_percent_label_rounds() {
        assert_eq!(discount_percent_label(kr(499), kr(424)), 15);
        assert_eq!(discount_percent_label(kr(300), kr(200)), 33);
        assert_eq!(discount_percent_label(kr(300), kr(300)), 0);
    }
}
