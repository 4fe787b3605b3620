//! Persisted configuration
//!
//! Typed accessors over the flat storage namespace. Unknown mode strings fall
//! back to the defaults (domain matching, SHA-1) instead of failing startup.

use std::sync::Arc;

use hb_core::{EncryptionMode, MatchingMode};

use crate::storage::{read_key, write_key, KeyValueStore, StoreError};

/// Storage keys.
pub mod keys {
    pub const MATCHING: &str = "matching";
    pub const ENCRYPTION: &str = "encryption";
    /// Key used for the encryption mode by older versions.
    pub const LEGACY_ENCRYPTION: &str = "type";
    pub const BLACKLIST: &str = "blacklist";
    pub const BLACKLIST_TYPE: &str = "blacklistType";
    pub const BLACKLIST_COOKIES: &str = "blacklistCookies";
    pub const ENABLE_CONTEXT_MENU: &str = "enableContextMenu";
}

/// Typed view of the persisted configuration.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        // Tolerate non-string garbage under mode keys
        match read_key::<serde_json::Value>(self.store.as_ref(), key).await? {
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(other) => {
                log::warn!("ignoring non-string value under '{}': {}", key, other);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Persisted matching mode, defaulting to [`MatchingMode::Domain`].
    pub async fn matching(&self) -> Result<MatchingMode, StoreError> {
        let raw = self.read_string(keys::MATCHING).await?;
        Ok(MatchingMode::from_str_lossy(raw.as_deref()))
    }

    pub async fn set_matching(&self, mode: MatchingMode) -> Result<(), StoreError> {
        write_key(self.store.as_ref(), keys::MATCHING, mode.as_str()).await
    }

    /// Persisted encryption mode, defaulting to [`EncryptionMode::Sha1`].
    /// Falls back to the legacy `type` key.
    pub async fn encryption(&self) -> Result<EncryptionMode, StoreError> {
        let raw = match self.read_string(keys::ENCRYPTION).await? {
            Some(raw) => Some(raw),
            None => self.read_string(keys::LEGACY_ENCRYPTION).await?,
        };
        Ok(EncryptionMode::from_str_lossy(raw.as_deref()))
    }

    pub async fn set_encryption(&self, mode: EncryptionMode) -> Result<(), StoreError> {
        write_key(self.store.as_ref(), keys::ENCRYPTION, mode.as_str()).await
    }

    pub async fn set_blacklist_type(&self, kind: &str) -> Result<(), StoreError> {
        write_key(self.store.as_ref(), keys::BLACKLIST_TYPE, kind).await
    }

    /// Whether cookies of blacklisted sites are deleted. Off unless set.
    pub async fn blacklist_cookies(&self) -> Result<bool, StoreError> {
        Ok(read_key::<bool>(self.store.as_ref(), keys::BLACKLIST_COOKIES)
            .await?
            .unwrap_or(false))
    }

    pub async fn set_blacklist_cookies(&self, enabled: bool) -> Result<(), StoreError> {
        write_key(self.store.as_ref(), keys::BLACKLIST_COOKIES, &enabled).await
    }

    /// Context menu flag, `None` if never set.
    pub async fn context_menu_enabled(&self) -> Result<Option<bool>, StoreError> {
        read_key(self.store.as_ref(), keys::ENABLE_CONTEXT_MENU).await
    }

    pub async fn set_context_menu_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        write_key(self.store.as_ref(), keys::ENABLE_CONTEXT_MENU, &enabled).await
    }
}
