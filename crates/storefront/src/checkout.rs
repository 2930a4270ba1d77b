//! Checkout: form validation, simulated payment and order confirmation.
//!
//! No payment provider is contacted. Payment is simulated by waiting the
//! configured delay, after which the order is confirmed and the ordered lines
//! are taken out of the cart. Anything added while payment runs stays.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopflow_core::{CartLineItem, FieldError, OrderSummary, PaymentInfo, ShippingInfo};
use thiserror::Error;
use tracing::{info, instrument};

use crate::cart::{CartError, CartService};

const ORDER_NUMBER_LENGTH: usize = 9;
const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors that can occur when placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// One or more form fields are missing or malformed.
    #[error("{} field(s) failed validation", .0.len())]
    Validation(Vec<FieldError>),

    /// There is nothing to order.
    #[error("Cart is empty")]
    EmptyCart,

    /// Reading or clearing the cart failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
}

/// The checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    pub shipping: ShippingInfo,
    pub payment: PaymentInfo,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: String,
    pub placed_at: DateTime<Utc>,
    pub items: Vec<CartLineItem>,
    pub summary: OrderSummary,
}

/// Places orders against the cart.
#[derive(Clone)]
pub struct CheckoutService {
    cart: Arc<CartService>,
    tax_rate: Decimal,
    payment_delay: Duration,
}

impl CheckoutService {
    /// Create a checkout over a cart.
    #[must_use]
    pub fn new(cart: Arc<CartService>, tax_rate: Decimal, payment_delay: Duration) -> Self {
        Self {
            cart,
            tax_rate,
            payment_delay,
        }
    }

    /// The configured tax rate.
    #[must_use]
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Summary of the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read.
    pub async fn summary(&self) -> Result<OrderSummary, CartError> {
        let items = self.cart.get_cart().await?;
        Ok(OrderSummary::from_cart(&items, self.tax_rate))
    }

    /// Validate the form, simulate payment, remove the ordered lines and
    /// confirm.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` listing every bad field,
    /// `CheckoutError::EmptyCart` if there is nothing to buy, or
    /// `CheckoutError::Cart` if the cart cannot be read or updated.
    #[instrument(skip_all)]
    pub async fn place_order(
        &self,
        request: &CheckoutRequest,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let mut errors = request.shipping.validate();
        errors.extend(request.payment.validate());
        if !errors.is_empty() {
            return Err(CheckoutError::Validation(errors));
        }

        let items = self.cart.get_cart().await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let summary = OrderSummary::from_cart(&items, self.tax_rate);

        tokio::time::sleep(self.payment_delay).await;
        self.cart.remove_ordered(&items).await?;

        let order_number = generate_order_number();
        info!(
            order_number = %order_number,
            item_count = summary.item_count,
            total = %summary.total,
            "Order placed"
        );

        Ok(OrderConfirmation {
            order_number,
            placed_at: Utc::now(),
            items,
            summary,
        })
    }
}

/// Nine random uppercase letters and digits.
fn generate_order_number() -> String {
    let mut rng = rand::rng();
    (0..ORDER_NUMBER_LENGTH)
        .filter_map(|_| ORDER_NUMBER_ALPHABET.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect()
}
