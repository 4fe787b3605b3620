//! Flat key-value storage
//!
//! The extension persists everything in the browser's sync storage: a flat
//! namespace of JSON values. Replication between devices is the backend's
//! business; to us it is an opaque async get/set/remove.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Error type for storage access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed value for key '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Async access to a flat JSON key-value namespace.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key. Missing keys are `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write a key. Must be durable when this returns.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and deserialize a key. `null` counts as missing.
pub async fn read_key<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                key: key.to_string(),
                source,
            }),
    }
}

/// Serialize and write a key.
pub async fn write_key<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(value)?).await
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store, used for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `values`.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: Mutex::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Copy of every stored key and value.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("matching").await.unwrap(), None);

        store.set("matching", json!("url")).await.unwrap();
        assert_eq!(store.get("matching").await.unwrap(), Some(json!("url")));

        store.remove("matching").await.unwrap();
        store.remove("matching").await.unwrap();
        assert_eq!(store.get("matching").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_key_typed() {
        let store = MemoryStore::with_values([
            ("blacklist", json!(["a", "b"])),
            ("blacklistCookies", json!(true)),
            ("nothing", Value::Null),
        ]);

        let list: Option<Vec<String>> = read_key(&store, "blacklist").await.unwrap();
        assert_eq!(list, Some(vec!["a".to_string(), "b".to_string()]));

        let flag: Option<bool> = read_key(&store, "blacklistCookies").await.unwrap();
        assert_eq!(flag, Some(true));

        let missing: Option<bool> = read_key(&store, "nothing").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_read_key_malformed() {
        let store = MemoryStore::with_values([("blacklist", json!("not-a-list"))]);
        let err = read_key::<Vec<String>>(&store, "blacklist").await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { ref key, .. } if key == "blacklist"));
    }

    #[tokio::test]
    async fn test_write_key() {
        let store = MemoryStore::new();
        write_key(&store, "enableContextMenu", &false).await.unwrap();
        assert_eq!(store.snapshot().get("enableContextMenu"), Some(&json!(false)));
    }
}
