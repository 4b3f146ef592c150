//! Pending external confirm-receipt record
//!
//! Written before the wallet's confirm-receipt flow opens, read back when
//! the app resumes (cold or warm). Only one record exists at a time.

use crate::error::ClientResult;
use crate::storage::{self, Storage, keys};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Records older than this are abandoned flows
const MAX_AGE_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingConfirm {
    pub order_id: u64,
    pub order_number: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    /// Unix millis
    pub created_at: i64,
}

impl PendingConfirm {
    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms - self.created_at > MAX_AGE_MS
    }

    /// Match against a resume callback: by transaction id when the record
    /// has one, else by the merchant trade number (our order number).
    pub fn matches(&self, resume: &ConfirmResume) -> bool {
        match (&self.transaction_id, &resume.transaction_id) {
            (Some(expected), Some(got)) => expected == got,
            (Some(_), None) => false,
            (None, _) => resume.trade_number.as_deref() == Some(self.order_number.as_str()),
        }
    }
}

/// Data carried by the resume callback of the external flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmResume {
    pub transaction_id: Option<String>,
    pub trade_number: Option<String>,
}

impl ConfirmResume {
    pub fn transaction(id: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(id.into()),
            trade_number: None,
        }
    }
}

/// Durable single-slot store for [`PendingConfirm`]
pub struct PendingConfirmStore {
    storage: Arc<dyn Storage>,
    lock: Mutex<()>,
}

impl PendingConfirmStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Replace whatever record was pending
    pub fn put(&self, record: &PendingConfirm) -> ClientResult<()> {
        let _guard = self.guard();
        storage::save_json(self.storage.as_ref(), keys::PENDING_CONFIRM, record)
    }

    /// Current record without consuming it
    pub fn peek(&self) -> Option<PendingConfirm> {
        let _guard = self.guard();
        storage::load_json(self.storage.as_ref(), keys::PENDING_CONFIRM)
    }

    pub fn clear(&self) -> ClientResult<()> {
        let _guard = self.guard();
        self.storage.remove(keys::PENDING_CONFIRM)
    }

    /// Consume the record if it matches the callback.
    ///
    /// Load and removal happen under one lock, so two resume events for the
    /// same callback yield the record once. Stale records are dropped.
    pub fn take_matching(&self, resume: &ConfirmResume, now_ms: i64) -> ClientResult<Option<PendingConfirm>> {
        let _guard = self.guard();
        let Some(record) =
            storage::load_json::<PendingConfirm>(self.storage.as_ref(), keys::PENDING_CONFIRM)
        else {
            return Ok(None);
        };

        if record.is_stale(now_ms) {
            tracing::info!(order_id = record.order_id, "Discarding stale pending confirm record");
            self.storage.remove(keys::PENDING_CONFIRM)?;
            return Ok(None);
        }
        if !record.matches(resume) {
            tracing::debug!(order_id = record.order_id, "Resume callback does not match pending confirm");
            return Ok(None);
        }

        self.storage.remove(keys::PENDING_CONFIRM)?;
        Ok(Some(record))
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}
