//! Cart service.
//!
//! # Architecture
//!
//! - [`CartBackend`] persists line items; [`LocalCart`] keeps the whole cart
//!   as one JSON blob in a [`KeyValueStore`](crate::storage::KeyValueStore),
//!   [`RemoteCart`] keeps one `cart_item` record per line
//! - [`CartService`] enforces the line-item rules and serializes mutations
//! - [`OptimisticCart`] is a view-side copy that rolls back failed updates
//!
//! # Rules
//!
//! - At most one line per `(product_id, size, color)`; adding the same
//!   combination again increments the existing line
//! - A line never has quantity zero; setting a quantity `<= 0` removes it
//! - Unknown line IDs are ignored by update and remove

mod local;
mod optimistic;
mod remote;

pub use local::{CART_KEY, LocalCart};
pub use optimistic::OptimisticCart;
pub use remote::RemoteCart;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shopflow_core::{
    CartCandidate, CartLineItem, LineItemId, cart_item_count, cart_total, find_matching_line,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::records::RecordApiError;
use crate::storage::StorageError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Added quantities must be positive, and a merged line must not
    /// exceed `u32::MAX` units.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The key-value store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The record API failed.
    #[error("Record API error: {0}")]
    Records(#[from] RecordApiError),

    /// The persisted cart could not be decoded.
    #[error("Stored cart is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence for cart line items.
///
/// Mutating methods receive the cart as last loaded and return the cart as
/// it is after the change.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// The persisted cart, in insertion order. Empty when nothing is stored.
    async fn load(&self) -> Result<Vec<CartLineItem>, CartError>;

    /// Append a new line for `candidate` with a fresh ID.
    async fn insert(
        &self,
        cart: Vec<CartLineItem>,
        candidate: CartCandidate,
    ) -> Result<Vec<CartLineItem>, CartError>;

    /// Set the quantity of an existing line. `quantity` is positive.
    async fn set_quantity(
        &self,
        cart: Vec<CartLineItem>,
        id: LineItemId,
        quantity: u32,
    ) -> Result<Vec<CartLineItem>, CartError>;

    /// Remove an existing line.
    async fn remove(
        &self,
        cart: Vec<CartLineItem>,
        id: LineItemId,
    ) -> Result<Vec<CartLineItem>, CartError>;

    /// Remove every line. Not atomic for every backend: on error, some
    /// lines may already be gone.
    async fn clear(&self) -> Result<(), CartError>;
}

/// Reads and mutates the cart.
///
/// Each mutation is a read-modify-write performed under an async mutex, so
/// concurrent requests in one process never interleave.
pub struct CartService {
    backend: Box<dyn CartBackend>,
    lock: Mutex<()>,
}

impl CartService {
    /// Create a service over a cart backend.
    #[must_use]
    pub fn new(backend: impl CartBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            lock: Mutex::new(()),
        }
    }

    /// The current line items, empty when no cart is persisted.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend fails.
    pub async fn get_cart(&self) -> Result<Vec<CartLineItem>, CartError> {
        let _guard = self.lock.lock().await;
        self.backend.load().await
    }

    /// Add a candidate, merging with an existing line of the same combination.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if the quantity is zero or the
    /// merged quantity overflows, or `CartError` if the backend fails.
    #[instrument(skip(self, candidate), fields(product_id = %candidate.product_id, quantity = candidate.quantity))]
    pub async fn add_to_cart(
        &self,
        candidate: CartCandidate,
    ) -> Result<Vec<CartLineItem>, CartError> {
        if candidate.quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        let _guard = self.lock.lock().await;
        let cart = self.backend.load().await?;

        match find_matching_line(&cart, candidate.product_id, &candidate.variant) {
            Some(index) => {
                let Some(line) = cart.get(index) else {
                    return Ok(cart);
                };
                let Some(quantity) = line.quantity.checked_add(candidate.quantity) else {
                    return Err(CartError::InvalidQuantity(
                        i64::from(line.quantity) + i64::from(candidate.quantity),
                    ));
                };
                let id = line.id;
                debug!(item_id = %id, quantity, "Merging into existing line");
                self.backend.set_quantity(cart, id, quantity).await
            }
            None => {
                debug!("Appending new line");
                self.backend.insert(cart, candidate).await
            }
        }
    }

    /// Set a line's quantity exactly. A quantity `<= 0` removes the line; an
    /// unknown ID leaves the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn update_quantity(
        &self,
        id: LineItemId,
        quantity: i64,
    ) -> Result<Vec<CartLineItem>, CartError> {
        let _guard = self.lock.lock().await;
        let cart = self.backend.load().await?;

        if !cart.iter().any(|item| item.id == id) {
            debug!("Unknown line, nothing to update");
            return Ok(cart);
        }
        if quantity <= 0 {
            return self.backend.remove(cart, id).await;
        }

        let quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity(quantity))?;
        self.backend.set_quantity(cart, id, quantity).await
    }

    /// Remove a line. An unknown ID leaves the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn remove_from_cart(&self, id: LineItemId) -> Result<Vec<CartLineItem>, CartError> {
        let _guard = self.lock.lock().await;
        let cart = self.backend.load().await?;

        if !cart.iter().any(|item| item.id == id) {
            return Ok(cart);
        }
        self.backend.remove(cart, id).await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend fails. With [`RemoteCart`] a failure
    /// can leave the cart partly cleared; call [`get_cart`](Self::get_cart)
    /// to see what remains.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Vec<CartLineItem>, CartError> {
        let _guard = self.lock.lock().await;
        self.backend.clear().await?;
        Ok(Vec::new())
    }

    /// Take ordered lines out of the cart in one critical section.
    ///
    /// Each line in `ordered` has its ordered quantity subtracted from the
    /// line with the same ID; lines that reach zero are removed. Lines added
    /// or topped up since `ordered` was read are kept.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend fails.
    #[instrument(skip_all, fields(lines = ordered.len()))]
    pub async fn remove_ordered(
        &self,
        ordered: &[CartLineItem],
    ) -> Result<Vec<CartLineItem>, CartError> {
        let _guard = self.lock.lock().await;
        let mut cart = self.backend.load().await?;

        for line in ordered {
            let Some(remaining) = cart
                .iter()
                .find(|item| item.id == line.id)
                .map(|item| item.quantity.saturating_sub(line.quantity))
            else {
                continue;
            };
            cart = if remaining == 0 {
                self.backend.remove(cart, line.id).await?
            } else {
                debug!(item_id = %line.id, remaining, "Keeping units added after the order was read");
                self.backend.set_quantity(cart, line.id, remaining).await?
            };
        }
        Ok(cart)
    }

    /// Sum of `price * quantity` over all lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend fails.
    pub async fn get_cart_total(&self) -> Result<Decimal, CartError> {
        Ok(cart_total(&self.get_cart().await?))
    }

    /// Total units across all lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the backend fails.
    pub async fn get_cart_item_count(&self) -> Result<u64, CartError> {
        Ok(cart_item_count(&self.get_cart().await?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Arc;

    use shopflow_core::{Price, ProductId, VariantSelection};

    use super::*;
    use crate::storage::MemoryStore;

    pub(crate) fn candidate(product: i32, size: &str, color: &str, cents: u32, quantity: u32) -> CartCandidate {
        CartCandidate {
            product_id: ProductId::new(product),
            quantity,
            variant: VariantSelection::new(Some(size), Some(color)),
            price: Price::from_cents(cents),
            name: format!("Product {product}"),
            image: format!("{product}.png"),
        }
    }

    fn service() -> CartService {
        CartService::new(LocalCart::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let service = service();
        assert!(service.get_cart().await.unwrap().is_empty());
        assert_eq!(service.get_cart_total().await.unwrap(), Decimal::ZERO);
        assert_eq!(service.get_cart_item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_shirt_scenario() {
        let service = service();
        let cart = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 2))
            .await
            .unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 2);
        assert_eq!(service.get_cart_total().await.unwrap(), Decimal::new(20, 0));
        assert_eq!(service.get_cart_item_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_same_combination_merges() {
        let service = service();
        service.add_to_cart(candidate(1, "M", "Red", 1000, 2)).await.unwrap();
        let cart = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 3))
            .await
            .unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_new_combination_adds_one_line() {
        let service = service();
        service.add_to_cart(candidate(1, "M", "Red", 1000, 2)).await.unwrap();
        let before = service.get_cart_item_count().await.unwrap();

        let cart = service
            .add_to_cart(candidate(1, "L", "Red", 1000, 4))
            .await
            .unwrap();
        assert_eq!(cart.len(), 2);
        assert_ne!(cart[0].id, cart[1].id);
        assert_eq!(service.get_cart_item_count().await.unwrap(), before + 4);
    }

    #[tokio::test]
    async fn test_zero_quantity_add_is_rejected() {
        let service = service();
        let err = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(0)));
        assert!(service.get_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity() {
        let service = service();
        let cart = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 2))
            .await
            .unwrap();
        let id = cart[0].id;

        let cart = service.update_quantity(id, 7).await.unwrap();
        assert_eq!(cart[0].quantity, 7);

        let cart = service.update_quantity(id, 0).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_negative_quantity_removes() {
        let service = service();
        let cart = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 2))
            .await
            .unwrap();
        let cart = service.update_quantity(cart[0].id, -3).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_no_ops() {
        let service = service();
        let cart = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 2))
            .await
            .unwrap();

        let unknown = LineItemId::new(-1);
        assert_eq!(service.update_quantity(unknown, 9).await.unwrap(), cart);
        assert_eq!(service.remove_from_cart(unknown).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let service = service();
        service.add_to_cart(candidate(1, "M", "Red", 1000, 1)).await.unwrap();
        let cart = service
            .add_to_cart(candidate(2, "S", "Blue", 250, 2))
            .await
            .unwrap();

        let cart = service.remove_from_cart(cart[0].id).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].product_id, ProductId::new(2));

        assert!(service.clear_cart().await.unwrap().is_empty());
        assert!(service.get_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_over_many_lines() {
        let service = service();
        service.add_to_cart(candidate(1, "M", "Red", 1999, 3)).await.unwrap();
        service.add_to_cart(candidate(2, "S", "Blue", 250, 2)).await.unwrap();
        service.add_to_cart(candidate(3, "L", "Green", 1, 1)).await.unwrap();

        // 59.97 + 5.00 + 0.01
        assert_eq!(service.get_cart_total().await.unwrap(), Decimal::new(6498, 2));
        assert_eq!(service.get_cart_item_count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_merge_overflow_is_rejected() {
        let service = service();
        service
            .add_to_cart(candidate(1, "M", "Red", 1000, u32::MAX))
            .await
            .unwrap();

        let err = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(q) if q == i64::from(u32::MAX) + 1));
        assert_eq!(service.get_cart().await.unwrap()[0].quantity, u32::MAX);
    }

    #[tokio::test]
    async fn test_remove_ordered_keeps_later_additions() {
        let service = service();
        service.add_to_cart(candidate(1, "M", "Red", 1000, 2)).await.unwrap();
        let ordered = service
            .add_to_cart(candidate(2, "S", "Blue", 250, 1))
            .await
            .unwrap();

        // Arrives after the order snapshot was taken
        service.add_to_cart(candidate(1, "M", "Red", 1000, 3)).await.unwrap();
        service.add_to_cart(candidate(3, "L", "Green", 500, 1)).await.unwrap();

        let cart = service.remove_ordered(&ordered).await.unwrap();
        let left: Vec<(i32, u32)> = cart.iter().map(|i| (i.product_id.get(), i.quantity)).collect();
        assert_eq!(left, vec![(1, 3), (3, 1)]);
        assert_eq!(service.get_cart().await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_remove_ordered_ignores_lines_already_gone() {
        let service = service();
        let ordered = service
            .add_to_cart(candidate(1, "M", "Red", 1000, 2))
            .await
            .unwrap();
        service.clear_cart().await.unwrap();

        assert!(service.remove_ordered(&ordered).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_merge() {
        let service = Arc::new(service());
        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .add_to_cart(candidate(1, "M", "Red", 1000, 1))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let cart = service.get_cart().await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 10);
    }
}
