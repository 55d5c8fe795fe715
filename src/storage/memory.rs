//! Implements the `Storage` trait with an in-memory map.
//!
//! Note: this is compiled into the production binary as well so that the app can run without an
//! on-disk store, see `Mode::Memory`.

use crate::storage::Storage;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A `Storage` that holds its data in a `HashMap`. Clones share the same map.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create a `MemoryStorage` seeded with `data`.
    pub fn new(data: HashMap<String, String>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Returns the number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.data.lock().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.data.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.data.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let storage = MemoryStorage::default();
        assert!(storage.is_empty().await);
        assert!(storage.get("k").await.unwrap().is_none());

        storage.set("k", "v1".to_string()).await.unwrap();
        storage.set("k", "v2".to_string()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.len().await, 1);

        storage.remove("k").await.unwrap();
        assert!(storage.get("k").await.unwrap().is_none());

        // removing again is fine
        storage.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let a = MemoryStorage::default();
        let b = a.clone();
        a.set("k", "v".to_string()).await.unwrap();
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
