//! Inbound message protocol
//!
//! Messages sent by the options page (and the context menu glue) to the
//! background controller. The JSON shape is `{"action": "...", ...payload}`;
//! TypeScript declarations are generated with `ts-rs`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A request to the background controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Message {
    GetBlacklist,
    AddToBlacklist {
        url: String,
    },
    RemoveFromBlacklist {
        url: String,
    },
    /// Comma-separated entries.
    ImportBlacklist {
        blacklist: String,
    },
    ClearBlacklist,
    ChangeBlacklistEncryptionType {
        #[serde(rename = "type")]
        encryption: String,
    },
    ChangeBlacklistMatching {
        matching: String,
    },
    EnableBlacklistCookies,
    DisableBlacklistCookies,
    ChangeContextMenuControls {
        enabled: bool,
    },
}

impl Message {
    /// Parse a message from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The controller's answer to a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Reply {
    Blacklist { blacklist: Vec<String> },
    Done,
}
