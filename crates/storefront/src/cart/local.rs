//! Cart kept as a single JSON blob in a key-value store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shopflow_core::{CartCandidate, CartLineItem, LineItemId};
use tracing::instrument;

use super::{CartBackend, CartError};
use crate::storage::KeyValueStore;

/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "shopflow_cart";

/// Cart backend over a [`KeyValueStore`].
///
/// Line IDs are millisecond timestamps, bumped past the largest existing ID
/// when two lines are added within the same millisecond.
#[derive(Clone)]
pub struct LocalCart {
    store: Arc<dyn KeyValueStore>,
}

impl LocalCart {
    /// Create a backend over a store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn save(&self, cart: &[CartLineItem]) -> Result<(), CartError> {
        let bytes = serde_json::to_vec(cart)?;
        self.store.write(CART_KEY, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl CartBackend for LocalCart {
    async fn load(&self) -> Result<Vec<CartLineItem>, CartError> {
        match self.store.read(CART_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    #[instrument(skip_all)]
    async fn insert(
        &self,
        mut cart: Vec<CartLineItem>,
        candidate: CartCandidate,
    ) -> Result<Vec<CartLineItem>, CartError> {
        let id = LineItemId::next_after(
            Utc::now().timestamp_millis(),
            cart.iter().map(|item| &item.id),
        );
        cart.push(CartLineItem::from_candidate(id, candidate));
        self.save(&cart).await?;
        Ok(cart)
    }

    async fn set_quantity(
        &self,
        mut cart: Vec<CartLineItem>,
        id: LineItemId,
        quantity: u32,
    ) -> Result<Vec<CartLineItem>, CartError> {
        if let Some(item) = cart.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
        self.save(&cart).await?;
        Ok(cart)
    }

    async fn remove(
        &self,
        mut cart: Vec<CartLineItem>,
        id: LineItemId,
    ) -> Result<Vec<CartLineItem>, CartError> {
        cart.retain(|item| item.id != id);
        self.save(&cart).await?;
        Ok(cart)
    }

    async fn clear(&self) -> Result<(), CartError> {
        self.store.delete(CART_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::candidate;
    use crate::storage::{FileStore, MemoryStore};

    #[tokio::test]
    async fn test_cart_is_stored_under_fixed_key() {
        let store = MemoryStore::new();
        let backend = LocalCart::new(Arc::new(store.clone()));

        backend
            .insert(Vec::new(), candidate(1, "M", "Red", 1000, 2))
            .await
            .unwrap();

        let raw = store.read(CART_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value[0]["productId"], 1);
        assert_eq!(value[0]["price"], "10.00");
        assert_eq!(value[0]["variant"]["size"], "M");

        backend.clear().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_ids_stay_unique_within_a_millisecond() {
        let backend = LocalCart::new(Arc::new(MemoryStore::new()));
        let mut cart = Vec::new();
        for product in 1..=5 {
            cart = backend
                .insert(cart, candidate(product, "M", "Red", 100, 1))
                .await
                .unwrap();
        }
        let mut ids: Vec<_> = cart.iter().map(|item| item.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_survives_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let first = LocalCart::new(Arc::new(FileStore::new(dir.path())));
        let cart = first
            .insert(Vec::new(), candidate(3, "S", "Blue", 500, 1))
            .await
            .unwrap();

        let second = LocalCart::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(second.load().await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_an_error() {
        let store = MemoryStore::new();
        store.write(CART_KEY, b"{not json").await.unwrap();
        let backend = LocalCart::new(Arc::new(store));
        assert!(matches!(backend.load().await, Err(CartError::Corrupt(_))));
    }
}
