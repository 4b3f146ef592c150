//! Chat sync engine
//!
//! Combines the cached log, polling, optimistic sends and the offline
//! queue for one support conversation. State lives behind a std mutex that
//! is never held across a backend call; each mutation rewrites the whole
//! cached structure.
//!
//! When bound to a session, a logout or forced re-login drops the in-memory
//! state. Results of backend calls started before that are discarded.

use super::log::MessageLog;
use super::queue::{OfflineQueue, QueuedMessage};
use crate::api::ChatBackend;
use crate::error::{ClientError, ClientResult};
use crate::session::{SessionContext, SessionEvent};
use crate::storage::{self, Storage, keys};
use chrono::{DateTime, Utc};
use shared::models::{DeliveryStatus, MessageId, SupportMessage};
use shared::util::now_utc;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a user send
#[derive(Debug)]
pub enum SendOutcome {
    Sent(SupportMessage),
    /// Text send failed; kept in the offline queue for replay
    Queued {
        local_id: MessageId,
        error: ClientError,
    },
    /// Shown as error, not queued: an attachment, or a text whose session
    /// ended while it was in flight
    Failed {
        local_id: MessageId,
        error: ClientError,
    },
}

impl SendOutcome {
    pub fn local_id(&self) -> Option<MessageId> {
        match self {
            SendOutcome::Sent(_) => None,
            SendOutcome::Queued { local_id, .. } | SendOutcome::Failed { local_id, .. } => {
                Some(*local_id)
            }
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent(_))
    }
}

/// Result of one offline replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub sent: usize,
    /// Still queued for the next connectivity transition
    pub failed: usize,
}

#[derive(Debug, Default)]
struct ChatState {
    log: MessageLog,
    queue: OfflineQueue,
    session: Option<broadcast::Receiver<SessionEvent>>,
    signed_out: bool,
    /// Bumped on every session reset
    generation: u64,
}

impl ChatState {
    fn sync_session(&mut self) {
        let Some(events) = self.session.as_mut() else {
            return;
        };
        loop {
            match events.try_recv() {
                Ok(SessionEvent::LoggedIn) => self.signed_out = false,
                Ok(SessionEvent::LoggedOut | SessionEvent::ReauthRequired)
                | Err(TryRecvError::Lagged(_)) => {
                    self.log = MessageLog::default();
                    self.queue = OfflineQueue::default();
                    self.generation += 1;
                    self.signed_out = true;
                    tracing::debug!(generation = self.generation, "Chat state dropped with session");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

struct Inner {
    backend: Arc<dyn ChatBackend>,
    storage: Arc<dyn Storage>,
    state: Mutex<ChatState>,
    /// One replay pass at a time
    replay: tokio::sync::Mutex<()>,
}

/// 客服消息同步
#[derive(Clone)]
pub struct ChatSyncEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ChatSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ChatSyncEngine")
            .field("messages", &state.log.len())
            .field("queued", &state.queue.len())
            .field("cursor", &state.log.cursor())
            .finish()
    }
}

impl ChatSyncEngine {
    /// Load cached log and queue; corrupt cache starts empty. Texts cached
    /// mid-send are queued again.
    pub fn open(backend: Arc<dyn ChatBackend>, storage: Arc<dyn Storage>) -> Self {
        let mut log = storage::load_json::<MessageLog>(storage.as_ref(), keys::CHAT_CACHE)
            .unwrap_or_default();
        let mut queue = storage::load_json::<OfflineQueue>(storage.as_ref(), keys::OFFLINE_QUEUE)
            .unwrap_or_default();

        let mut requeued = 0;
        for m in log.restore() {
            if m.id.is_local() && !m.is_attachment() {
                queue.push(QueuedMessage {
                    local_id: m.id,
                    content: m.content,
                    queued_at: now_utc(),
                });
                requeued += 1;
            }
        }
        tracing::debug!(messages = log.len(), queued = queue.len(), requeued, "Chat state loaded");

        let engine = Self {
            inner: Arc::new(Inner {
                backend,
                storage,
                state: Mutex::new(ChatState {
                    log,
                    queue,
                    ..Default::default()
                }),
                replay: tokio::sync::Mutex::new(()),
            }),
        };
        if requeued > 0 {
            engine.persist(&engine.lock());
        }
        engine
    }

    /// Follow `session`: logout or re-login drops the log and queue, and
    /// nothing is fetched, sent or replayed while signed out.
    pub fn with_session(self, session: &SessionContext) -> Self {
        {
            let mut state = self.lock();
            state.session = Some(session.subscribe());
            state.signed_out = !session.is_logged_in();
        }
        self
    }

    /// Snapshot of the ordered log
    pub fn messages(&self) -> Vec<SupportMessage> {
        self.state().log.messages().to_vec()
    }

    pub fn cursor(&self) -> Option<DateTime<Utc>> {
        self.state().log.cursor()
    }

    pub fn queued(&self) -> Vec<QueuedMessage> {
        self.state().queue.items().to_vec()
    }

    // ========================================================================
    // Poll
    // ========================================================================

    /// Fetch messages after the cursor and merge them. Returns how many
    /// were new.
    pub async fn refresh(&self) -> ClientResult<usize> {
        let (cursor, generation) = {
            let state = self.state();
            if state.signed_out {
                return Ok(0);
            }
            (state.log.cursor(), state.generation)
        };
        let batch = self.inner.backend.fetch_messages(cursor).await?;
        if batch.is_empty() {
            return Ok(0);
        }
        let added = self
            .mutate_in(generation, |s| s.log.merge(batch))
            .unwrap_or(0);
        if added > 0 {
            tracing::debug!(added, "Merged new chat messages");
        }
        Ok(added)
    }

    // ========================================================================
    // Send
    // ========================================================================

    /// Optimistic text send. A failed send stays visible as `error` and is
    /// queued for replay.
    pub async fn send_text(&self, content: &str) -> ClientResult<SendOutcome> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Validation("message is empty".into()));
        }

        let local = SupportMessage::local_text(content, now_utc());
        let local_id = local.id;
        let generation = self.push_local(local)?;

        match self.inner.backend.send_text(content).await {
            Ok(confirmed) => {
                self.mutate_in(generation, |s| s.log.confirm_local(&local_id, confirmed.clone()));
                Ok(SendOutcome::Sent(confirmed))
            }
            Err(error) => {
                let queued = QueuedMessage {
                    local_id,
                    content: content.to_string(),
                    queued_at: now_utc(),
                };
                let kept = self.mutate_in(generation, |s| {
                    s.log.set_status(&local_id, DeliveryStatus::Error);
                    s.queue.push(queued);
                });
                if kept.is_none() {
                    tracing::info!(%local_id, error = %error, "Text send failed after session ended");
                    return Ok(SendOutcome::Failed { local_id, error });
                }
                tracing::info!(%local_id, error = %error, "Text send failed, queued for replay");
                Ok(SendOutcome::Queued { local_id, error })
            }
        }
    }

    /// Optimistic attachment send. Failures are not queued.
    pub async fn send_attachment(&self, path: &Path, caption: &str) -> ClientResult<SendOutcome> {
        let local = SupportMessage::local_attachment(path.to_string_lossy(), caption, now_utc());
        let local_id = local.id;
        let generation = self.push_local(local)?;

        match self.inner.backend.send_attachment(path, caption).await {
            Ok(confirmed) => {
                self.mutate_in(generation, |s| s.log.confirm_local(&local_id, confirmed.clone()));
                Ok(SendOutcome::Sent(confirmed))
            }
            Err(error) => {
                tracing::warn!(%local_id, error = %error, "Attachment send failed");
                self.mutate_in(generation, |s| s.log.set_status(&local_id, DeliveryStatus::Error));
                Ok(SendOutcome::Failed { local_id, error })
            }
        }
    }

    // ========================================================================
    // Offline replay
    // ========================================================================

    /// Resend every queued message in enqueue order. Each success leaves the
    /// queue; each failure stays for the next pass. A pass already running
    /// makes this a no-op.
    pub async fn replay_offline(&self) -> ReplayReport {
        let Ok(_running) = self.inner.replay.try_lock() else {
            tracing::debug!("Replay already running");
            return ReplayReport::default();
        };

        let (pending, generation) = {
            let state = self.state();
            if state.signed_out {
                return ReplayReport::default();
            }
            (state.queue.items().to_vec(), state.generation)
        };
        let mut report = ReplayReport::default();
        for item in pending {
            let started = self.mutate_in(generation, |s| {
                s.log.set_status(&item.local_id, DeliveryStatus::Sending)
            });
            if started.is_none() {
                tracing::debug!("Session ended, replay stopped");
                break;
            }
            match self.inner.backend.send_text(&item.content).await {
                Ok(confirmed) => {
                    self.mutate_in(generation, |s| {
                        s.queue.remove(&item.local_id);
                        s.log.confirm_local(&item.local_id, confirmed);
                    });
                    report.sent += 1;
                }
                Err(e) => {
                    tracing::info!(local_id = %item.local_id, error = %e, "Replay send failed");
                    self.mutate_in(generation, |s| {
                        s.log.set_status(&item.local_id, DeliveryStatus::Error)
                    });
                    report.failed += 1;
                }
            }
        }
        if report.sent + report.failed > 0 {
            tracing::info!(sent = report.sent, failed = report.failed, "Offline replay finished");
        }
        report
    }

    /// Network status changed
    pub async fn on_connectivity_change(&self, online: bool) -> ReplayReport {
        if !online {
            return ReplayReport::default();
        }
        self.replay_offline().await
    }

    /// App came to the foreground; `online` is the current network check
    pub async fn on_foreground(&self, online: bool) -> ReplayReport {
        self.on_connectivity_change(online).await
    }

    /// Replay on every offline-to-online transition of a network signal
    /// until cancelled or the signal's sender is dropped.
    pub fn watch_connectivity(
        &self,
        mut online: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let mut was_online = *online.borrow_and_update();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let now_online = *online.borrow_and_update();
                        if now_online && !was_online {
                            engine.on_connectivity_change(true).await;
                        }
                        was_online = now_online;
                    }
                }
            }
            tracing::debug!("Connectivity watcher stopped");
        })
    }

    // ========================================================================
    // State
    // ========================================================================

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lock with pending session events applied
    fn state(&self) -> MutexGuard<'_, ChatState> {
        let mut state = self.lock();
        state.sync_session();
        state
    }

    /// Insert an optimistic entry; returns the generation it belongs to
    fn push_local(&self, message: SupportMessage) -> ClientResult<u64> {
        let mut state = self.state();
        if state.signed_out {
            return Err(ClientError::Unauthorized);
        }
        state.log.push_local(message);
        self.persist(&state);
        Ok(state.generation)
    }

    /// Apply a mutation and persist both structures whole, unless the
    /// session was reset since `generation`
    fn mutate_in<R>(&self, generation: u64, f: impl FnOnce(&mut ChatState) -> R) -> Option<R> {
        let mut state = self.state();
        if state.generation != generation {
            return None;
        }
        let out = f(&mut state);
        self.persist(&state);
        Some(out)
    }

    fn persist(&self, state: &ChatState) {
        let storage = self.inner.storage.as_ref();
        if let Err(e) = storage::save_json(storage, keys::CHAT_CACHE, &state.log) {
            tracing::warn!(error = %e, "Failed to persist chat cache");
        }
        if let Err(e) = storage::save_json(storage, keys::OFFLINE_QUEUE, &state.queue) {
            tracing::warn!(error = %e, "Failed to persist offline queue");
        }
    }
}
