//! Stock per size, split between the online shop and the club.
//!
//! The backend has stored three generations of the `sizes` column: a bare
//! number per size, `{quantity, location}`, and the current `{online, club}`.
//! [`SizeInventory`] accepts all of them and always writes the current shape.

use core::fmt;
use core::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::types::StockStatus;

/// Errors from inventory mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("source and destination locations must differ")]
    SameLocation,

    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("size {0} not found")]
    SizeNotFound(String),

    #[error("Insufficient stock at {location}: {available} available, {requested} requested")]
    InsufficientStock {
        location: Location,
        available: u32,
        requested: u32,
    },

    #[error("unknown stock location: {0}")]
    UnknownLocation(String),
}

/// Where a unit of stock physically sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Online,
    Club,
}

impl Location {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Club => "club",
        }
    }

    /// Swedish label for the admin panel.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Online => "Webbshop",
            Self::Club => "Klubben",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "online" => Ok(Self::Online),
            "club" => Ok(Self::Club),
            other => Err(InventoryError::UnknownLocation(other.to_owned())),
        }
    }
}

/// Quantities of one size at each location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    pub online: u32,
    pub club: u32,
}

impl SizeStock {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.online.saturating_add(self.club)
    }

    #[must_use]
    pub const fn at(&self, location: Location) -> u32 {
        match location {
            Location::Online => self.online,
            Location::Club => self.club,
        }
    }

    const fn slot(&mut self, location: Location) -> &mut u32 {
        match location {
            Location::Online => &mut self.online,
            Location::Club => &mut self.club,
        }
    }

    /// Normalize any stored shape of a single size entry.
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) if map.contains_key("online") || map.contains_key("club") => Self {
                online: map.get("online").map_or(0, count),
                club: map.get("club").map_or(0, count),
            },
            Value::Object(map) if map.contains_key("quantity") => {
                let quantity = map.get("quantity").map_or(0, count);
                match map.get("location").and_then(Value::as_str) {
                    Some("club") => Self {
                        online: 0,
                        club: quantity,
                    },
                    Some("online") | None => Self {
                        online: quantity,
                        club: 0,
                    },
                    Some(_) => Self::default(),
                }
            }
            Value::Object(_) => Self::default(),
            other => Self {
                online: count(other),
                club: 0,
            },
        }
    }
}

/// Read a stored count leniently: numbers, numeric strings, null. Negative or
/// unreadable values count as zero.
#[allow(clippy::cast_possible_truncation)]
fn count(value: &Value) -> u32 {
    let raw = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    raw.map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

/// Ordered map of size label to stock.
///
/// Sizes keep the order the backend returned them in, which is the order the
/// shop staff entered them (e.g. `110, 120, 130`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeInventory {
    entries: Vec<(String, SizeStock)>,
}

impl SizeInventory {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SizeStock)> {
        self.entries.iter().map(|(size, stock)| (size.as_str(), stock))
    }

    #[must_use]
    pub fn contains(&self, size: &str) -> bool {
        self.get(size).is_some()
    }

    #[must_use]
    pub fn get(&self, size: &str) -> Option<&SizeStock> {
        self.entries
            .iter()
            .find(|(label, _)| label == size)
            .map(|(_, stock)| stock)
    }

    fn get_mut(&mut self, size: &str) -> Option<&mut SizeStock> {
        self.entries
            .iter_mut()
            .find(|(label, _)| label == size)
            .map(|(_, stock)| stock)
    }

    /// Insert or replace a size, keeping its original position on replace.
    pub fn insert(&mut self, size: impl Into<String>, stock: SizeStock) {
        let size = size.into();
        if let Some(existing) = self.get_mut(&size) {
            *existing = stock;
        } else {
            self.entries.push((size, stock));
        }
    }

    pub fn remove(&mut self, size: &str) -> Option<SizeStock> {
        let index = self.entries.iter().position(|(label, _)| label == size)?;
        Some(self.entries.remove(index).1)
    }

    /// Total quantity of a size across both locations; 0 for unknown sizes.
    #[must_use]
    pub fn quantity(&self, size: &str) -> u32 {
        self.get(size).map_or(0, SizeStock::total)
    }

    #[must_use]
    pub fn quantity_at(&self, size: &str, location: Location) -> u32 {
        self.get(size).map_or(0, |stock| stock.at(location))
    }

    /// Set the quantity of a size at one location, creating the size if it is
    /// new. Negative quantities are stored as zero.
    pub fn set_quantity(&mut self, size: &str, quantity: i64, location: Location) {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if let Some(stock) = self.get_mut(size) {
            *stock.slot(location) = quantity;
        } else {
            let mut stock = SizeStock::default();
            *stock.slot(location) = quantity;
            self.entries.push((size.to_owned(), stock));
        }
    }

    /// Move stock of one size between locations.
    ///
    /// # Errors
    ///
    /// Fails without changing anything when the locations are equal, the
    /// quantity is not positive, the size does not exist, or the source holds
    /// fewer units than requested.
    pub fn move_between(
        &mut self,
        size: &str,
        quantity: i64,
        from: Location,
        to: Location,
    ) -> Result<(), InventoryError> {
        if from == to {
            return Err(InventoryError::SameLocation);
        }
        let requested = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(InventoryError::NonPositiveQuantity)?;
        let stock = self
            .get_mut(size)
            .ok_or_else(|| InventoryError::SizeNotFound(size.to_owned()))?;

        let available = stock.at(from);
        if available < requested {
            return Err(InventoryError::InsufficientStock {
                location: from,
                available,
                requested,
            });
        }

        *stock.slot(from) = available - requested;
        let target = stock.slot(to);
        *target = target.saturating_add(requested);
        Ok(())
    }

    /// Deduct sold units: online stock first, the remainder from the club.
    /// Never goes below zero. Unknown sizes are ignored.
    pub fn reduce(&mut self, size: &str, quantity: u32) {
        let Some(stock) = self.get_mut(size) else {
            return;
        };
        let from_online = stock.online.min(quantity);
        stock.online -= from_online;
        stock.club = stock.club.saturating_sub(quantity - from_online);
    }

    /// Total units over every size and location.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries
            .iter()
            .fold(0, |acc, (_, stock)| acc.saturating_add(stock.total()))
    }

    #[must_use]
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.total())
    }

    /// Sizes with at least one unit in stock, in display order.
    pub fn available_sizes(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, stock)| stock.total() > 0)
            .map(|(size, _)| size.as_str())
    }

    /// Serialize to the JSON string form the backend expects in form fields.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned())
    }
}

impl FromIterator<(String, SizeStock)> for SizeInventory {
    fn from_iter<I: IntoIterator<Item = (String, SizeStock)>>(iter: I) -> Self {
        let mut inventory = Self::new();
        for (size, stock) in iter {
            inventory.insert(size, stock);
        }
        inventory
    }
}

impl Serialize for SizeInventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (size, stock) in &self.entries {
            map.serialize_entry(size, stock)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SizeInventory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SizeInventoryVisitor)
    }
}

struct SizeInventoryVisitor;

impl<'de> Visitor<'de> for SizeInventoryVisitor {
    type Value = SizeInventory;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of sizes or a JSON string containing one")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut inventory = SizeInventory::new();
        while let Some((size, value)) = map.next_entry::<String, Value>()? {
            inventory.insert(size, SizeStock::from_value(&value));
        }
        Ok(inventory)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(SizeInventory::new());
        }
        serde_json::from_str(trimmed).map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SizeInventory::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SizeInventory::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SizeInventory {
        serde_json::from_str(json).unwrap()
    }

    fn stock(online: u32, club: u32) -> SizeStock {
        SizeStock { online, club }
    }

    #[test]
    fn test_normalizes_bare_numbers() {
        let inv = parse(r#"{"170": 5, "180": 3}"#);
        assert_eq!(inv.get("170"), Some(&stock(5, 0)));
        assert_eq!(inv.get("180"), Some(&stock(3, 0)));
    }

    #[test]
    fn test_normalizes_mixed_and_partial_shapes() {
        let inv = parse(r#"{"170": 5, "180": {"online": 3, "club": 1}, "190": {"club": 3}, "200": null}"#);
        assert_eq!(inv.get("170"), Some(&stock(5, 0)));
        assert_eq!(inv.get("180"), Some(&stock(3, 1)));
        assert_eq!(inv.get("190"), Some(&stock(0, 3)));
        assert_eq!(inv.get("200"), Some(&stock(0, 0)));
    }

    #[test]
    fn test_normalizes_quantity_location_shape() {
        let inv = parse(
            r#"{"170": {"quantity": 5, "location": "online"}, "180": {"quantity": 3, "location": "club"}, "190": {"quantity": 2}}"#,
        );
        assert_eq!(inv.get("170"), Some(&stock(5, 0)));
        assert_eq!(inv.get("180"), Some(&stock(0, 3)));
        assert_eq!(inv.get("190"), Some(&stock(2, 0)));
    }

    #[test]
    fn test_unknown_object_is_zero() {
        let inv = parse(r#"{"170": {"color": "blue"}}"#);
        assert_eq!(inv.get("170"), Some(&stock(0, 0)));
    }

    #[test]
    fn test_accepts_json_encoded_string() {
        let inv = parse(r#""{\"170\": {\"online\": 5, \"club\": 2}}""#);
        assert_eq!(inv.quantity("170"), 7);
        assert!(parse(r#""""#).is_empty());
        assert!(parse("null").is_empty());
    }

    #[test]
    fn test_preserves_order_and_serializes_normalized() {
        let inv = parse(r#"{"180": 1, "110": {"quantity": 2, "location": "club"}}"#);
        let sizes: Vec<_> = inv.iter().map(|(size, _)| size).collect();
        assert_eq!(sizes, ["180", "110"]);
        assert_eq!(
            inv.to_json_string(),
            r#"{"180":{"online":1,"club":0},"110":{"online":0,"club":2}}"#
        );
    }

    #[test]
    fn test_quantity_lookups() {
        let inv = parse(r#"{"170": {"online": 5, "club": 2}}"#);
        assert_eq!(inv.quantity("170"), 7);
        assert_eq!(inv.quantity("190"), 0);
        assert_eq!(inv.quantity_at("170", Location::Online), 5);
        assert_eq!(inv.quantity_at("170", Location::Club), 2);
        assert_eq!(inv.quantity_at("190", Location::Online), 0);
        assert_eq!(SizeInventory::new().quantity("170"), 0);
    }

    #[test]
    fn test_set_quantity() {
        let mut inv = parse(r#"{"170": {"online": 5, "club": 2}}"#);
        inv.set_quantity("170", 10, Location::Online);
        assert_eq!(inv.get("170"), Some(&stock(10, 2)));
        inv.set_quantity("170", 8, Location::Club);
        assert_eq!(inv.get("170"), Some(&stock(10, 8)));
        inv.set_quantity("180", 3, Location::Online);
        assert_eq!(inv.get("180"), Some(&stock(3, 0)));
        inv.set_quantity("170", -5, Location::Online);
        assert_eq!(inv.get("170"), Some(&stock(0, 8)));
    }

    #[test]
    fn test_move_between_locations() {
        let mut inv = parse(r#"{"170": {"online": 5, "club": 2}}"#);
        inv.move_between("170", 3, Location::Online, Location::Club).unwrap();
        assert_eq!(inv.get("170"), Some(&stock(2, 5)));
        inv.move_between("170", 3, Location::Club, Location::Online).unwrap();
        assert_eq!(inv.get("170"), Some(&stock(5, 2)));
    }

    #[test]
    fn test_move_all_and_legacy_shape() {
        let mut inv = parse(r#"{"170": 5}"#);
        inv.move_between("170", 2, Location::Online, Location::Club).unwrap();
        assert_eq!(inv.get("170"), Some(&stock(3, 2)));
        inv.move_between("170", 3, Location::Online, Location::Club).unwrap();
        assert_eq!(inv.get("170"), Some(&stock(0, 5)));
    }

    #[test]
    fn test_move_errors_leave_stock_unchanged() {
        let mut inv = parse(r#"{"170": {"online": 2, "club": 1}}"#);
        let before = inv.clone();

        let err = inv
            .move_between("170", 5, Location::Online, Location::Club)
            .unwrap_err();
        assert!(err.to_string().contains("Insufficient stock"));

        let err = inv
            .move_between("180", 1, Location::Online, Location::Club)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));

        assert_eq!(
            inv.move_between("170", 1, Location::Club, Location::Club),
            Err(InventoryError::SameLocation)
        );
        assert_eq!(
            inv.move_between("170", 0, Location::Online, Location::Club),
            Err(InventoryError::NonPositiveQuantity)
        );
        assert_eq!(
            inv.move_between("170", -1, Location::Online, Location::Club),
            Err(InventoryError::NonPositiveQuantity)
        );
        assert_eq!(inv, before);
    }

    #[test]
    fn test_reduce_online_first() {
        let mut inv = parse(r#"{"170": {"online": 5, "club": 2}, "180": {"online": 3, "club": 0}}"#);
        inv.reduce("170", 3);
        assert_eq!(inv.get("170"), Some(&stock(2, 2)));
        inv.reduce("180", 1);
        assert_eq!(inv.get("180"), Some(&stock(2, 0)));
    }

    #[test]
    fn test_reduce_overflows_to_club_and_clamps() {
        let mut inv = parse(r#"{"170": {"online": 5, "club": 2}}"#);
        inv.reduce("170", 6);
        assert_eq!(inv.get("170"), Some(&stock(0, 1)));
        inv.reduce("170", 10);
        assert_eq!(inv.get("170"), Some(&stock(0, 0)));
    }

    #[test]
    fn test_reduce_unknown_size_is_noop() {
        let mut inv = parse(r#"{"170": {"online": 5, "club": 2}}"#);
        let before = inv.clone();
        inv.reduce("999", 1);
        assert_eq!(inv, before);
    }

    #[test]
    fn test_totals_and_available_sizes() {
        let inv = parse(r#"{"110": 0, "120": {"online": 0, "club": 1}, "130": 2}"#);
        assert_eq!(inv.total(), 3);
        assert_eq!(inv.stock_status(), StockStatus::InStock);
        assert_eq!(inv.available_sizes().collect::<Vec<_>>(), ["120", "130"]);
    }

    #[test]
    fn test_lenient_counts() {
        let inv = parse(r#"{"170": {"online": "4", "club": -2}, "180": 2.9}"#);
        assert_eq!(inv.get("170"), Some(&stock(4, 0)));
        assert_eq!(inv.get("180"), Some(&stock(2, 0)));
    }

    #[test]
    fn test_location_parse() {
        assert_eq!("club".parse::<Location>(), Ok(Location::Club));
        assert!(matches!(
            "lager".parse::<Location>(),
            Err(InventoryError::UnknownLocation(_))
        ));
    }
}
