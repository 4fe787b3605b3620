//! Test doubles for the storage and browser collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::browser::{
    Browser, BrowserError, ClosedSession, ContextMenus, Cookie, Cookies, History, MenuItem, Sessions,
};
use crate::storage::{KeyValueStore, MemoryStore, StoreError};

// =============================================================================
// Storage
// =============================================================================

/// Memory store whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail only `remove`, leaving `set` working.
    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("quota exceeded".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("remove rejected".to_string()));
        }
        self.inner.remove(key).await
    }
}

// =============================================================================
// Browser
// =============================================================================

/// Records every browser call and serves canned session/cookie data.
#[derive(Default)]
pub struct RecordingBrowser {
    deleted_urls: Mutex<Vec<String>>,
    forgotten_tabs: Mutex<Vec<(i64, String)>>,
    forgotten_windows: Mutex<Vec<String>>,
    removed_cookies: Mutex<Vec<(String, String)>>,
    menu_items: Mutex<Vec<String>>,
    session_polls: Mutex<usize>,
    /// Successive `recently_closed` answers; the last one repeats.
    closed: Mutex<VecDeque<Vec<ClosedSession>>>,
    cookies: Mutex<HashMap<String, Vec<Cookie>>>,
    locked_cookies: Mutex<Vec<String>>,
    fail_sessions: AtomicBool,
    fail_history: AtomicBool,
}

impl RecordingBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn browser(self: &Arc<Self>) -> Browser {
        Browser::from_shared(Arc::clone(self))
    }

    pub fn push_closed(&self, sessions: Vec<ClosedSession>) {
        self.closed.lock().unwrap().push_back(sessions);
    }

    pub fn set_cookies(&self, url: &str, names: &[&str]) {
        let cookies = names
            .iter()
            .map(|name| Cookie { name: name.to_string() })
            .collect();
        self.cookies.lock().unwrap().insert(url.to_string(), cookies);
    }

    /// Make `cookies.remove` fail for the cookie called `name`.
    pub fn lock_cookie(&self, name: &str) {
        self.locked_cookies.lock().unwrap().push(name.to_string());
    }

    pub fn fail_sessions(&self, fail: bool) {
        self.fail_sessions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    pub fn deleted_urls(&self) -> Vec<String> {
        self.deleted_urls.lock().unwrap().clone()
    }

    pub fn forgotten_tabs(&self) -> Vec<(i64, String)> {
        self.forgotten_tabs.lock().unwrap().clone()
    }

    pub fn forgotten_windows(&self) -> Vec<String> {
        self.forgotten_windows.lock().unwrap().clone()
    }

    pub fn removed_cookies(&self) -> Vec<(String, String)> {
        self.removed_cookies.lock().unwrap().clone()
    }

    pub fn menu_items(&self) -> Vec<String> {
        self.menu_items.lock().unwrap().clone()
    }

    pub fn session_polls(&self) -> usize {
        *self.session_polls.lock().unwrap()
    }
}

#[async_trait]
impl History for RecordingBrowser {
    async fn delete_url(&self, url: &str) -> Result<(), BrowserError> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(BrowserError::api("history.deleteUrl", "unavailable"));
        }
        self.deleted_urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[async_trait]
impl Sessions for RecordingBrowser {
    async fn recently_closed(&self, max_results: usize) -> Result<Vec<ClosedSession>, BrowserError> {
        *self.session_polls.lock().unwrap() += 1;
        if self.fail_sessions.load(Ordering::SeqCst) {
            return Err(BrowserError::api("sessions.getRecentlyClosed", "unavailable"));
        }

        let mut closed = self.closed.lock().unwrap();
        let answer = if closed.len() > 1 {
            closed.pop_front().unwrap_or_default()
        } else {
            closed.front().cloned().unwrap_or_default()
        };
        Ok(answer.into_iter().take(max_results).collect())
    }

    async fn forget_closed_tab(&self, window_id: i64, session_id: &str) -> Result<(), BrowserError> {
        self.forgotten_tabs
            .lock()
            .unwrap()
            .push((window_id, session_id.to_string()));
        Ok(())
    }

    async fn forget_closed_window(&self, session_id: &str) -> Result<(), BrowserError> {
        self.forgotten_windows.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl Cookies for RecordingBrowser {
    async fn get_all(&self, url: &str) -> Result<Vec<Cookie>, BrowserError> {
        Ok(self.cookies.lock().unwrap().get(url).cloned().unwrap_or_default())
    }

    async fn remove(&self, url: &str, name: &str) -> Result<(), BrowserError> {
        if self.locked_cookies.lock().unwrap().iter().any(|n| n == name) {
            return Err(BrowserError::api("cookies.remove", "cookie is locked"));
        }
        self.removed_cookies
            .lock()
            .unwrap()
            .push((url.to_string(), name.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ContextMenus for RecordingBrowser {
    async fn create(&self, item: &MenuItem) -> Result<(), BrowserError> {
        let mut items = self.menu_items.lock().unwrap();
        if items.contains(&item.id) {
            return Err(BrowserError::api("contextMenus.create", "duplicate id"));
        }
        items.push(item.id.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), BrowserError> {
        let mut items = self.menu_items.lock().unwrap();
        match items.iter().position(|i| i == id) {
            Some(pos) => {
                items.remove(pos);
                Ok(())
            }
            None => Err(BrowserError::api("contextMenus.remove", "no such item")),
        }
    }
}
