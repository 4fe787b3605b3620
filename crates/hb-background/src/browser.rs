//! Browser collaborators
//!
//! The slices of the WebExtension API the controller drives. Each is a small
//! async trait so hosts can plug in the real `browser.*` namespace and tests
//! can record calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for browser API calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowserError {
    #[error("{api} failed: {message}")]
    Api { api: &'static str, message: String },
}

impl BrowserError {
    pub fn api(api: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            api,
            message: message.into(),
        }
    }
}

// =============================================================================
// Event payloads
// =============================================================================

/// A history visit as reported by `history.onVisited`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitInfo {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl VisitInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }
}

/// A tab in the recently-closed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTab {
    pub url: String,
    pub window_id: i64,
    pub session_id: String,
}

/// A window in the recently-closed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedWindow {
    pub session_id: String,
    pub tabs: Vec<ClosedTab>,
}

/// One entry of `sessions.getRecentlyClosed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosedSession {
    Tab(ClosedTab),
    Window(ClosedWindow),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
}

/// A context menu entry. `title_key` is an i18n message name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub title_key: String,
}

// =============================================================================
// APIs
// =============================================================================

#[async_trait]
pub trait History: Send + Sync {
    /// Remove every visit to `url`.
    async fn delete_url(&self, url: &str) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait Sessions: Send + Sync {
    /// Most recently closed tabs/windows, newest first.
    async fn recently_closed(&self, max_results: usize) -> Result<Vec<ClosedSession>, BrowserError>;

    async fn forget_closed_tab(&self, window_id: i64, session_id: &str) -> Result<(), BrowserError>;

    async fn forget_closed_window(&self, session_id: &str) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait Cookies: Send + Sync {
    /// Every cookie that would be sent to `url`.
    async fn get_all(&self, url: &str) -> Result<Vec<Cookie>, BrowserError>;

    async fn remove(&self, url: &str, name: &str) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait ContextMenus: Send + Sync {
    async fn create(&self, item: &MenuItem) -> Result<(), BrowserError>;

    async fn remove(&self, id: &str) -> Result<(), BrowserError>;
}

/// The browser as seen by the controller.
#[derive(Clone)]
pub struct Browser {
    pub history: Arc<dyn History>,
    pub sessions: Arc<dyn Sessions>,
    pub cookies: Arc<dyn Cookies>,
    pub menus: Arc<dyn ContextMenus>,
}

impl Browser {
    /// All four APIs served by one object.
    pub fn from_shared<T>(api: Arc<T>) -> Self
    where
        T: History + Sessions + Cookies + ContextMenus + 'static,
    {
        Self {
            history: api.clone(),
            sessions: api.clone(),
            cookies: api.clone(),
            menus: api,
        }
    }
}
