//! HistoryBlock Background Library
//!
//! The event-driven half of HistoryBlock. A [`Controller`] receives browser
//! lifecycle events (page visited, tab closed, window closed) and user
//! messages, runs the URL through the active `hb-core` matcher and hash, and
//! checks or mutates the persisted [`Blacklist`]. On a hit it asks the
//! browser to delete history, forget closed sessions and drop cookies.
//!
//! Everything the browser provides is reached through narrow traits in
//! [`browser`] and [`storage`], so the controller runs the same against a
//! real extension host, the CLI's JSON file, or the in-memory fakes used in
//! tests.
//!
//! # Modules
//!
//! - `storage`: flat key-value store trait and the in-memory store
//! - `notify`: fire-and-forget `BLACKLIST_UPDATED` events
//! - `blacklist`: the persisted entry set
//! - `browser`: history, sessions, cookies and context-menu collaborators
//! - `settings`: typed access to the persisted configuration keys
//! - `message`: inbound message protocol
//! - `controller`: the event and message handlers

pub mod blacklist;
pub mod browser;
pub mod controller;
pub mod message;
pub mod notify;
pub mod settings;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use blacklist::{Blacklist, StorageBlacklist};
pub use browser::{Browser, BrowserError, ClosedSession, ClosedTab, ClosedWindow, Cookie, VisitInfo};
pub use controller::{Controller, ControllerConfig};
pub use message::{Message, Reply};
pub use notify::{BlacklistEvent, Notifier};
pub use settings::Settings;
pub use storage::{KeyValueStore, MemoryStore, StoreError};

/// Errors surfaced by mutating controller operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    InvalidMode(#[from] hb_core::ParseModeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
