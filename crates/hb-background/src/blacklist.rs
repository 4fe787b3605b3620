//! Persisted blacklist
//!
//! The blacklist is an ordered, duplicate-free list of entries stored under
//! the `blacklist` key. Order only matters for display and export.
//!
//! Mutations are read-modify-write against the store. They are serialized by
//! an async mutex shared by every [`StorageBlacklist`] built from the same
//! root, so two concurrent `block` calls cannot lose an update. Reads take no
//! lock.

use std::sync::Arc;

use async_trait::async_trait;
use hb_core::HashStrategy;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::notify::{BlacklistEvent, Notifier};
use crate::settings::keys;
use crate::storage::{read_key, write_key, KeyValueStore, StoreError};

/// The set of blacklisted entries.
#[async_trait]
pub trait Blacklist: Send + Sync {
    /// Current entries, initializing the store to an empty list if needed.
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Whether `entry` is blacklisted.
    async fn contains(&self, entry: &str) -> Result<bool, StoreError> {
        Ok(self.list().await?.iter().any(|e| e == entry))
    }

    /// Append `entry`. Returns `false` if it was already present.
    async fn add(&self, entry: &str) -> Result<bool, StoreError>;

    /// Remove `entry`. Returns `false` if it was not present.
    async fn remove(&self, entry: &str) -> Result<bool, StoreError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Append the comma-separated entries in `list` that are new and pass the
    /// active hash's validation. Returns how many were added.
    async fn import(&self, list: &str) -> Result<usize, StoreError>;

    /// Same storage, validating imports with `hash` instead.
    fn with_hash(&self, hash: Arc<dyn HashStrategy>) -> Arc<dyn Blacklist>;
}

// =============================================================================
// Storage-backed implementation
// =============================================================================

/// Blacklist kept in the extension's key-value storage.
pub struct StorageBlacklist {
    store: Arc<dyn KeyValueStore>,
    hash: Arc<dyn HashStrategy>,
    notifier: Notifier,
    write_lock: Arc<Mutex<()>>,
}

impl StorageBlacklist {
    /// Storage backend kind persisted under `blacklistType`.
    pub const KIND: &'static str = "sync";

    pub fn new(store: Arc<dyn KeyValueStore>, hash: Arc<dyn HashStrategy>, notifier: Notifier) -> Self {
        Self {
            store,
            hash,
            notifier,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Read the stored list without initializing it.
    async fn load(&self) -> Result<Option<Vec<String>>, StoreError> {
        read_key(self.store.as_ref(), keys::BLACKLIST).await
    }

    /// Read the stored list; caller must hold the write lock.
    async fn load_locked(&self) -> Result<Vec<String>, StoreError> {
        match self.load().await? {
            Some(entries) => Ok(entries),
            None => {
                self.persist(&[]).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, entries: &[String]) -> Result<(), StoreError> {
        write_key(self.store.as_ref(), keys::BLACKLIST, entries).await
    }
}

#[async_trait]
impl Blacklist for StorageBlacklist {
    async fn list(&self) -> Result<Vec<String>, StoreError> {
        if let Some(entries) = self.load().await? {
            return Ok(entries);
        }

        // First use: initialize under the lock so a racing add is not lost
        let _guard = self.write_lock.lock().await;
        self.load_locked().await
    }

    async fn add(&self, entry: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_locked().await?;

        if entries.iter().any(|e| e == entry) {
            return Ok(false);
        }
        entries.push(entry.to_string());
        self.persist(&entries).await?;

        log::info!("blacklist entry added ({} total)", entries.len());
        self.notifier.publish(BlacklistEvent::BlacklistUpdated);
        Ok(true)
    }

    async fn remove(&self, entry: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_locked().await?;

        let Some(pos) = entries.iter().position(|e| e == entry) else {
            return Ok(false);
        };
        entries.remove(pos);
        self.persist(&entries).await?;

        log::info!("blacklist entry removed ({} total)", entries.len());
        self.notifier.publish(BlacklistEvent::BlacklistUpdated);
        Ok(true)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(keys::BLACKLIST).await?;
        self.store.set(keys::BLACKLIST, Value::Array(Vec::new())).await?;

        log::info!("blacklist cleared");
        self.notifier.publish(BlacklistEvent::BlacklistUpdated);
        Ok(())
    }

    async fn import(&self, list: &str) -> Result<usize, StoreError> {
        let tokens: Vec<&str> = list.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_locked().await?;

        let mut added = 0;
        let mut rejected = 0;
        for token in tokens {
            if entries.iter().any(|e| e == token) {
                continue;
            }
            if !self.hash.test(token) {
                rejected += 1;
                continue;
            }
            entries.push(token.to_string());
            added += 1;
        }
        self.persist(&entries).await?;

        if rejected > 0 {
            log::warn!("import skipped {} entries not valid under {}", rejected, self.hash.mode());
        }
        log::info!("imported {} blacklist entries ({} total)", added, entries.len());
        self.notifier.publish(BlacklistEvent::BlacklistUpdated);
        Ok(added)
    }

    fn with_hash(&self, hash: Arc<dyn HashStrategy>) -> Arc<dyn Blacklist> {
        Arc::new(Self {
            store: Arc::clone(&self.store),
            hash,
            notifier: self.notifier.clone(),
            write_lock: Arc::clone(&self.write_lock),
        })
    }
}
