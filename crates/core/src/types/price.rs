//! Prices in Swedish kronor.
//!
//! The shop sells only in SEK, so a price is a bare decimal amount. Arithmetic
//! uses [`Decimal`] to avoid float drift in totals; on the wire a price is a
//! plain JSON number because the backend stores integers and multiplies totals
//! by 100 for the payment gateway.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

/// ISO 4217 code for every amount in the shop.
pub const CURRENCY_CODE: &str = "SEK";

/// An amount in SEK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole kronor.
    #[must_use]
    pub fn from_kronor(kronor: i64) -> Self {
        Self(Decimal::from(kronor))
    }

    /// Zero kronor.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Parse a price typed into a form. Accepts `499`, `499.50` and `499,50`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number.
    pub fn parse(input: &str) -> Result<Self, rust_decimal::Error> {
        Decimal::from_str(&input.trim().replace(',', ".")).map(Self)
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    #[must_use]
    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Amount in öre, as the payment gateway expects.
    #[must_use]
    pub fn as_ore(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED).round().to_i64()
    }

    /// Format for display, e.g. `499 kr` or `499,50 kr`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.0.round_dp(2).normalize();
        if rounded.fract().is_zero() {
            format!("{} kr", rounded.trunc())
        } else {
            format!("{rounded:.2} kr").replace('.', ",")
        }
    }

    /// Plain amount for form inputs and JSON-LD (`499` or `499.5`).
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let amount = self.0.normalize();
        if amount.fract().is_zero()
            && let Some(whole) = amount.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        serializer.serialize_f64(amount.to_f64().unwrap_or_default())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_whole_kronor() {
        assert_eq!(Price::from_kronor(499).display(), "499 kr");
        assert_eq!(Price::zero().display(), "0 kr");
    }

    #[test]
    fn test_display_fractional_uses_comma() {
        assert_eq!(Price::parse("499.5").unwrap().display(), "499,50 kr");
    }

    #[test]
    fn test_parse_accepts_swedish_decimal_comma() {
        assert_eq!(Price::parse(" 12,25 ").unwrap(), Price::parse("12.25").unwrap());
        assert!(Price::parse("tolv").is_err());
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_kronor(499).times(2), Price::from_kronor(82)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_kronor(1080));
    }

    #[test]
    fn test_serializes_as_json_number() {
        assert_eq!(serde_json::to_string(&Price::from_kronor(581)).unwrap(), "581");
        assert_eq!(serde_json::to_string(&Price::parse("9.5").unwrap()).unwrap(), "9.5");
    }

    #[test]
    fn test_deserializes_numbers_and_floats() {
        let p: Price = serde_json::from_str("499").unwrap();
        assert_eq!(p, Price::from_kronor(499));
        let p: Price = serde_json::from_str("499.0").unwrap();
        assert_eq!(p.display(), "499 kr");
    }

    #[test]
    fn test_as_ore() {
        assert_eq!(Price::from_kronor(581).as_ore(), Some(58_100));
    }
}
