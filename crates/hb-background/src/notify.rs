//! Outbound notifications
//!
//! Mutations publish `BLACKLIST_UPDATED` so an open options page can
//! re-render. Publishing never waits: with no subscriber, or a lagging one,
//! the event is simply dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ts_rs::TS;

const CHANNEL_CAPACITY: usize = 16;

/// Events broadcast to UI listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum BlacklistEvent {
    BlacklistUpdated,
}

/// Fire-and-forget publisher.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<BlacklistEvent>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Register a listener. Only events published afterwards are received.
    pub fn subscribe(&self) -> broadcast::Receiver<BlacklistEvent> {
        self.tx.subscribe()
    }

    /// Publish without waiting for delivery.
    pub fn publish(&self, event: BlacklistEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("no listeners for {:?}", event);
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
