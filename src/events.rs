//! # events
//!
//! [`WsEvent`] — everything pushed to dashboard clients over `/ws/dashboard`.
//!
//! Events go through a `tokio::sync::broadcast::Sender<String>` already
//! serialized, so subscribers never need `RefreshState: Clone` per receiver.

use serde::Serialize;

use crate::refresh::RefreshState;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsEvent {
    /// A refresh attempt entered `loading`.
    RefreshStarted { generation: u64 },

    /// An attempt committed — full state after the commit.
    StateUpdated { state: Box<RefreshState> },

    /// An attempt lost to a newer one and wrote nothing.
    RefreshSuperseded { generation: u64 },

    /// Display preference flipped by some client.
    #[serde(rename_all = "camelCase")]
    PreferencesChanged { dark_mode: bool },
}

impl WsEvent {
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
