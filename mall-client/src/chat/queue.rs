//! Offline send queue
//!
//! Text messages whose send failed, in enqueue order. Not time-bounded;
//! persisted with the chat state so it survives restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::MessageId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessage {
    /// Optimistic entry this send belongs to
    pub local_id: MessageId,
    pub content: String,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfflineQueue {
    items: Vec<QueuedMessage>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue; a message already queued keeps its original slot
    pub fn push(&mut self, item: QueuedMessage) {
        if self.items.iter().any(|q| q.local_id == item.local_id) {
            return;
        }
        self.items.push(item);
    }

    pub fn remove(&mut self, local_id: &MessageId) -> bool {
        let before = self.items.len();
        self.items.retain(|q| &q.local_id != local_id);
        self.items.len() != before
    }

    pub fn items(&self) -> &[QueuedMessage] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
