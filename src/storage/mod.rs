//! The on-device key-value store that holds all persisted app state.
//!
//! Values are JSON documents stored as strings under string keys, see `Keys` for the key layout.
//! There is no transactionality and no protection against concurrent writers; a single
//! in-process caller is assumed.

mod keys;
mod memory;
mod migrations;
mod sqlite;

use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

pub(crate) use keys::DEFAULT_NAMESPACE;
pub use keys::Keys;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// When this environment variable is set and non-empty, the app keeps its state in memory instead
/// of in the SQLite file. This allows running the whole program top-to-bottom without touching the
/// on-disk store.
pub const IN_MEMORY_ENV: &str = "FINBOARD_IN_MEMORY";

/// A key-value store of JSON strings.
#[async_trait::async_trait]
pub trait Storage: Debug + Send + Sync {
    /// Returns the value stored under `key`, or `None` if nothing is stored there.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing whatever was there.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// A shareable handle to a `Storage` implementation.
pub type SharedStorage = Arc<dyn Storage>;

/// Selects which `Storage` implementation backs the app.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// State is kept in `finboard.sqlite` in the home directory.
    #[default]
    Sqlite,
    /// State is kept in memory and lost when the process exits.
    Memory,
}

impl Mode {
    /// Reads `FINBOARD_IN_MEMORY` to decide the mode.
    pub fn from_env() -> Self {
        match std::env::var(IN_MEMORY_ENV) {
            Ok(value) if !value.is_empty() => Mode::Memory,
            _ => Mode::Sqlite,
        }
    }
}

/// Reads and parses the JSON document stored under `key`.
///
/// # Errors
/// - Returns an error if the store cannot be read.
/// - Returns an error if the stored value is not valid JSON for `T`. The stored value is left as
///   it is so that nothing is lost.
pub async fn get_json<T>(storage: &dyn Storage, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    match storage.get(key).await? {
        None => Ok(None),
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .with_context(|| format!("The value stored under '{key}' is malformed")),
    }
}

/// Serializes `value` to JSON and stores it under `key`.
pub async fn set_json<T>(storage: &dyn Storage, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)
        .with_context(|| format!("Unable to serialize the value for '{key}'"))?;
    storage.set(key, json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Thing {
        a: String,
        b: u32,
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let storage = MemoryStorage::default();
        let thing = Thing {
            a: "x".to_string(),
            b: 7,
        };
        set_json(&storage, "@app:thing", &thing).await.unwrap();
        let found: Option<Thing> = get_json(&storage, "@app:thing").await.unwrap();
        assert_eq!(Some(thing), found);

        let missing: Option<Thing> = get_json(&storage, "@app:nothing").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error_and_is_kept() {
        let storage = MemoryStorage::default();
        storage
            .set("@app:thing", "{not json".to_string())
            .await
            .unwrap();
        let result: Result<Option<Thing>> = get_json(&storage, "@app:thing").await;
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("@app:thing"));
        assert_eq!(
            storage.get("@app:thing").await.unwrap().as_deref(),
            Some("{not json")
        );
    }
}
