//! Checkout form data and the order summary.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartLineItem, cart_item_count, cart_total};
use super::price::round_cents;

/// Where the order ships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Card details as typed by the shopper. Never stored or logged.
///
/// Implements `Debug` manually to redact every field but the name.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub name_on_card: String,
}

impl fmt::Debug for PaymentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentInfo")
            .field("card_number", &"[REDACTED]")
            .field("expiry_date", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .field("name_on_card", &self.name_on_card)
            .finish()
    }
}

/// A form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the JSON form.
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_owned(),
            message: message.to_owned(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Exactly one `@` with text on both sides.
fn plausible_email(value: &str) -> bool {
    match value.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

impl ShippingInfo {
    /// Field errors for this address, in form order.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let required = [
            ("firstName", &self.first_name, "First name is required"),
            ("lastName", &self.last_name, "Last name is required"),
            ("email", &self.email, "Email is required"),
            ("address", &self.address, "Address is required"),
            ("city", &self.city, "City is required"),
            ("zipCode", &self.zip_code, "Zip code is required"),
        ];
        for (field, value, message) in required {
            if blank(value) {
                errors.push(FieldError::new(field, message));
            }
        }
        if !blank(&self.email) && !plausible_email(&self.email) {
            errors.push(FieldError::new("email", "Email address is invalid"));
        }
        errors
    }
}

impl PaymentInfo {
    /// Field errors for this card, in form order.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        [
            ("cardNumber", &self.card_number, "Card number is required"),
            ("expiryDate", &self.expiry_date, "Expiry date is required"),
            ("cvv", &self.cvv, "CVV is required"),
            ("nameOnCard", &self.name_on_card, "Name on card is required"),
        ]
        .into_iter()
        .filter(|(_, value, _)| blank(value))
        .map(|(field, _, message)| FieldError::new(field, message))
        .collect()
    }
}

/// Money breakdown shown at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub item_count: u64,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Summarize a cart. Tax is rounded to cents; shipping is free.
    #[must_use]
    pub fn from_cart(items: &[CartLineItem], tax_rate: Decimal) -> Self {
        let subtotal = cart_total(items);
        let tax = round_cents(subtotal * tax_rate);
        let shipping = Decimal::ZERO;
        Self {
            item_count: cart_item_count(items),
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }
}
