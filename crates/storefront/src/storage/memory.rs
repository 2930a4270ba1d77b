//! In-process key-value store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{KeyValueStore, StorageError, validate_key};

/// A key-value store held in memory.
///
/// Cheaply cloneable; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("memory store lock poisoned".to_owned())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_write_delete() {
        let store = MemoryStore::new();
        assert!(store.read("cart").await.unwrap().is_none());

        store.write("cart", b"[]").await.unwrap();
        assert_eq!(store.read("cart").await.unwrap().as_deref(), Some(&b"[]"[..]));
        assert_eq!(store.len(), 1);

        store.delete("cart").await.unwrap();
        assert!(store.read("cart").await.unwrap().is_none());
        assert!(store.is_empty());

        // Deleting again is fine
        store.delete("cart").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.write("k", b"v").await.unwrap();
        assert_eq!(clone.read("k").await.unwrap().as_deref(), Some(&b"v"[..]));
    }
}
