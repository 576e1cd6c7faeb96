//! Offline action notifications.
//!
//! The control publishes an [`OfflineEvent`] at each step of a save or remove
//! action. Hosts subscribe through [`EventBus::subscribe`]; sending with no
//! subscribers is not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Notification emitted by offline save and remove actions.
///
/// Serializes as `{"event": "<name>", ...payload}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum OfflineEvent {
    #[serde(rename = "offline:save-start", rename_all = "camelCase")]
    SaveStart { n_tiles_to_save: usize },

    #[serde(rename = "offline:save-end")]
    SaveEnd,

    #[serde(rename = "offline:save-error")]
    SaveError { error: String },

    #[serde(rename = "offline:remove-start")]
    RemoveStart,

    #[serde(rename = "offline:remove-end")]
    RemoveEnd,

    #[serde(rename = "offline:remove-error")]
    RemoveError { error: String },

    #[serde(rename = "offline:below-min-zoom-error")]
    BelowMinZoomError,
}

impl OfflineEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveStart { .. } => "offline:save-start",
            Self::SaveEnd => "offline:save-end",
            Self::SaveError { .. } => "offline:save-error",
            Self::RemoveStart => "offline:remove-start",
            Self::RemoveEnd => "offline:remove-end",
            Self::RemoveError { .. } => "offline:remove-error",
            Self::BelowMinZoomError => "offline:below-min-zoom-error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::SaveError { .. } | Self::RemoveError { .. } | Self::BelowMinZoomError
        )
    }
}

/// Broadcast channel for [`OfflineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OfflineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OfflineEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to current subscribers.
    pub fn emit(&self, event: OfflineEvent) {
        tracing::debug!(event = event.name(), "Offline event");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
