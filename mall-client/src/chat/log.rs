//! Ordered, de-duplicated message log
//!
//! Pure data structure: every operation leaves the list sorted by
//! `(created_at, id)` with unique ids. The cursor is the newest
//! server-confirmed timestamp seen and never moves backwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{DeliveryStatus, MessageId, SupportMessage};
use shared::util::max_time;

/// Message list plus poll cursor. Persisted as `{messages, lastFetchedAt}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageLog {
    #[serde(default)]
    messages: Vec<SupportMessage>,
    #[serde(default)]
    last_fetched_at: Option<DateTime<Utc>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix up a log loaded from cache. A message still `sending` was
    /// interrupted by the process exit: it is marked `error` and returned so
    /// the caller can queue it again.
    pub fn restore(&mut self) -> Vec<SupportMessage> {
        let mut interrupted = Vec::new();
        for m in &mut self.messages {
            if m.status == DeliveryStatus::Sending {
                m.status = DeliveryStatus::Error;
                interrupted.push(m.clone());
            }
        }
        self.sort();
        interrupted
    }

    pub fn messages(&self) -> &[SupportMessage] {
        &self.messages
    }

    /// `after` parameter for the next poll
    pub fn cursor(&self) -> Option<DateTime<Utc>> {
        self.last_fetched_at
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &MessageId) -> Option<&SupportMessage> {
        self.position(id).map(|i| &self.messages[i])
    }

    /// Merge a server batch: known ids are skipped, the rest appended, then
    /// the list is re-sorted. Returns how many were new.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = SupportMessage>) -> usize {
        let mut added = 0;
        for mut incoming in batch {
            self.advance(&incoming);
            if self.contains(&incoming.id) {
                continue;
            }
            incoming.status = DeliveryStatus::Sent;
            self.messages.push(incoming);
            added += 1;
        }
        if added > 0 {
            self.sort();
        }
        added
    }

    /// Append an optimistic message
    pub fn push_local(&mut self, message: SupportMessage) {
        self.messages.push(message);
        self.sort();
    }

    /// Swap an optimistic entry for its server-confirmed version.
    ///
    /// If a poll already delivered the confirmed message, the optimistic
    /// entry is dropped instead, so the message is never listed twice.
    pub fn confirm_local(&mut self, local_id: &MessageId, mut confirmed: SupportMessage) {
        confirmed.status = DeliveryStatus::Sent;
        self.advance(&confirmed);

        let local = self.position(local_id);
        if self.contains(&confirmed.id) {
            if let Some(i) = local {
                self.messages.remove(i);
            }
            return;
        }
        match local {
            Some(i) => self.messages[i] = confirmed,
            None => self.messages.push(confirmed),
        }
        self.sort();
    }

    /// Set delivery status of an optimistic entry; false if unknown
    pub fn set_status(&mut self, id: &MessageId, status: DeliveryStatus) -> bool {
        match self.position(id) {
            Some(i) => {
                self.messages[i].status = status;
                true
            }
            None => false,
        }
    }

    fn advance(&mut self, message: &SupportMessage) {
        if !message.id.is_local() {
            self.last_fetched_at = max_time(self.last_fetched_at, Some(message.created_at));
        }
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }

    fn sort(&mut self) {
        self.messages.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    }
}
