//! Optimistic quantity edits with rollback.

use std::sync::Arc;

use rust_decimal::Decimal;
use shopflow_core::{CartLineItem, LineItemId, cart_item_count, cart_total};
use tracing::warn;

use super::{CartError, CartService};

/// A local copy of the cart that applies quantity changes before the
/// service confirms them.
///
/// On success the copy is replaced by the cart the service returns. On
/// failure the copy is restored to its state before the change.
pub struct OptimisticCart {
    service: Arc<CartService>,
    items: Vec<CartLineItem>,
}

impl OptimisticCart {
    /// Load the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read.
    pub async fn load(service: Arc<CartService>) -> Result<Self, CartError> {
        let items = service.get_cart().await?;
        Ok(Self { service, items })
    }

    /// The displayed line items.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Total of the displayed cart.
    #[must_use]
    pub fn total(&self) -> Decimal {
        cart_total(&self.items)
    }

    /// Unit count of the displayed cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        cart_item_count(&self.items)
    }

    /// Show `quantity` for a line immediately, then confirm with the service.
    ///
    /// # Errors
    ///
    /// Returns the service error after rolling the displayed cart back.
    pub async fn set_quantity(&mut self, id: LineItemId, quantity: i64) -> Result<&[CartLineItem], CartError> {
        let snapshot = self.items.clone();

        if quantity <= 0 {
            self.items.retain(|item| item.id != id);
        } else if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }

        match self.service.update_quantity(id, quantity).await {
            Ok(items) => {
                self.items = items;
                Ok(&self.items)
            }
            Err(e) => {
                warn!(item_id = %id, error = %e, "Quantity update failed, rolling back");
                self.items = snapshot;
                Err(e)
            }
        }
    }
}
