//! Checkout: customer details, delivery, payment, and the order payload.
//!
//! Totals are always derived from the session [`Cart`]; nothing the browser
//! sends about prices is trusted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{Email, Price, ProductId};

/// Default Postnord shipping fee in SEK.
pub const DEFAULT_POSTNORD_COST: i64 = 82;

/// Minimum number of digits in a phone number.
const MIN_PHONE_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Collected at the club.
    #[default]
    Pickup,
    Postnord,
}

impl DeliveryMethod {
    /// Shipping cost, given the configured Postnord fee.
    #[must_use]
    pub const fn cost(&self, postnord_cost: Price) -> Price {
        match self {
            Self::Pickup => Price::zero(),
            Self::Postnord => postnord_cost,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Postnord => "postnord",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pickup => "Hämta på klubben",
            Self::Postnord => "Postnord",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Swish,
    Bankgiro,
    /// Card payment through Stripe Elements.
    Stripe,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Swish => "swish",
            Self::Bankgiro => "bankgiro",
            Self::Stripe => "stripe",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Swish => "Swish",
            Self::Bankgiro => "Bankgiro",
            Self::Stripe => "Kort",
        }
    }

    /// Whether the order is placed directly, without a card payment first.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self, Self::Swish | Self::Bankgiro)
    }
}

/// Raw checkout form as posted by the browser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_method: DeliveryMethod,
    pub payment: PaymentMethod,
}

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    fn insert(&mut self, field: &'static str, message: &'static str) {
        self.0.insert(field, message);
    }
}

/// A validated customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
}

impl Customer {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl CustomerForm {
    /// Validate every field at once so the form can highlight all problems.
    ///
    /// # Errors
    ///
    /// Returns the field errors when any required field is missing or invalid.
    pub fn validate(&self) -> Result<Customer, FieldErrors> {
        let mut errors = FieldErrors::default();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.insert("firstName", "Förnamn krävs");
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.insert("lastName", "Efternamn krävs");
        }

        let email = if self.email.trim().is_empty() {
            errors.insert("email", "E-post krävs");
            None
        } else {
            Email::parse(&self.email)
                .inspect_err(|_| errors.insert("email", "Ogiltig e-postadress"))
                .ok()
        };

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.insert("phone", "Telefonnummer krävs");
        } else if !is_valid_phone(phone) {
            errors.insert("phone", "Ogiltigt telefonnummer");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(Customer {
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                email,
                phone: phone.to_owned(),
            }),
            _ => Err(errors),
        }
    }
}

fn is_valid_phone(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    allowed && phone.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}

/// Order totals in SEK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub items_total: Price,
    pub delivery_cost: Price,
    pub total: Price,
}

impl OrderTotals {
    #[must_use]
    pub fn compute(cart: &Cart, delivery: DeliveryMethod, postnord_cost: Price) -> Self {
        let items_total = cart.subtotal();
        let delivery_cost = delivery.cost(postnord_cost);
        Self {
            items_total,
            delivery_cost,
            total: items_total + delivery_cost,
        }
    }
}

/// Customer block of the order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_method: DeliveryMethod,
    pub payment: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub selected_size: String,
    pub color: Option<String>,
}

/// Order as posted to `POST /checkout` and `POST /create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer: OrderCustomer,
    pub items: Vec<OrderItem>,
    pub delivery_method: DeliveryMethod,
    pub delivery_cost: Price,
    pub items_total: Price,
    pub total: Price,
    pub payment: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl OrderRequest {
    /// Build the order from the session cart.
    #[must_use]
    pub fn new(
        customer: &Customer,
        delivery: DeliveryMethod,
        payment: PaymentMethod,
        cart: &Cart,
        postnord_cost: Price,
        created_at: DateTime<Utc>,
    ) -> Self {
        let totals = OrderTotals::compute(cart, delivery, postnord_cost);
        Self {
            customer: OrderCustomer {
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                email: customer.email.to_string(),
                phone: customer.phone.clone(),
                delivery_method: delivery,
                payment,
            },
            items: cart
                .items()
                .iter()
                .map(|line| OrderItem {
                    id: line.product_id,
                    name: line.name.clone(),
                    price: line.unit_price,
                    quantity: line.quantity,
                    selected_size: line.selected_size.clone(),
                    color: line.color.clone(),
                })
                .collect(),
            delivery_method: delivery,
            delivery_cost: totals.delivery_cost,
            items_total: totals.items_total,
            total: totals.total,
            payment,
            created_at,
        }
    }
}

/// Body of `POST /confirm-payment`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation<'a> {
    pub payment_intent_id: &'a str,
    pub order: &'a OrderRequest,
}

/// Response of `POST /create-payment-intent`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub client_secret: String,
    #[serde(default)]
    pub publishable_key: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use chrono::TimeZone;

    fn form() -> CustomerForm {
        CustomerForm {
            first_name: "Anna".into(),
            last_name: "Svensson".into(),
            email: "anna@example.se".into(),
            phone: "070-123 45 67".into(),
            delivery_method: DeliveryMethod::Postnord,
            payment: PaymentMethod::Swish,
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem {
            product_id: ProductId::new(1),
            name: "Judogi".into(),
            unit_price: Price::from_kronor(499),
            selected_size: "170".into(),
            quantity: 2,
            available: 5,
            image: None,
            category: Some("judo".into()),
            color: Some("white".into()),
        })
        .unwrap();
        cart
    }

    #[test]
    fn test_validate_ok() {
        let customer = form().validate().unwrap();
        assert_eq!(customer.full_name(), "Anna Svensson");
        assert_eq!(customer.email.as_str(), "anna@example.se");
    }

    #[test]
    fn test_validate_reports_every_field() {
        let errors = CustomerForm::default().validate().unwrap_err();
        for field in ["firstName", "lastName", "email", "phone"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_validate_email_and_phone_format() {
        let bad = CustomerForm {
            email: "anna@".into(),
            phone: "12345".into(),
            ..form()
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Ogiltig e-postadress"));
        assert_eq!(errors.get("phone"), Some("Ogiltigt telefonnummer"));
        assert!(!errors.has("firstName"));

        let letters = CustomerForm {
            phone: "070 ABC 1234".into(),
            ..form()
        };
        assert!(letters.validate().unwrap_err().has("phone"));
    }

    #[test]
    fn test_totals_include_delivery() {
        let postnord = Price::from_kronor(DEFAULT_POSTNORD_COST);
        let totals = OrderTotals::compute(&cart(), DeliveryMethod::Postnord, postnord);
        assert_eq!(totals.items_total, Price::from_kronor(998));
        assert_eq!(totals.delivery_cost, Price::from_kronor(82));
        assert_eq!(totals.total, Price::from_kronor(1080));

        let pickup = OrderTotals::compute(&cart(), DeliveryMethod::Pickup, postnord);
        assert_eq!(pickup.total, Price::from_kronor(998));
    }

    #[test]
    fn test_order_request_wire_format() {
        let customer = form().validate().unwrap();
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let order = OrderRequest::new(
            &customer,
            DeliveryMethod::Pickup,
            PaymentMethod::Bankgiro,
            &cart(),
            Price::from_kronor(DEFAULT_POSTNORD_COST),
            created_at,
        );
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["customer"]["firstName"], "Anna");
        assert_eq!(json["customer"]["payment"], "bankgiro");
        assert_eq!(json["items"][0]["id"], 1);
        assert_eq!(json["items"][0]["price"], 499);
        assert_eq!(json["items"][0]["selectedSize"], "170");
        assert_eq!(json["deliveryMethod"], "pickup");
        assert_eq!(json["deliveryCost"], 0);
        assert_eq!(json["itemsTotal"], 998);
        assert_eq!(json["total"], 998);
        assert_eq!(json["createdAt"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn test_form_deserializes_camel_case() {
        let form: CustomerForm = serde_json::from_str(
            r#"{"firstName":"A","lastName":"B","email":"a@b.se","phone":"0701234567","deliveryMethod":"postnord","payment":"stripe"}"#,
        )
        .unwrap();
        assert_eq!(form.delivery_method, DeliveryMethod::Postnord);
        assert_eq!(form.payment, PaymentMethod::Stripe);
    }
}
