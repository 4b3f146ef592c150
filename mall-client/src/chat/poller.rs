//! Visibility-aware chat polling
//!
//! One background task fetches on a fixed interval while the chat screen is
//! visible. Becoming visible fetches immediately, then resumes the interval.
//! Stopping discards any fetch still in flight.

use super::engine::ChatSyncEngine;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// 消息轮询器
pub struct ChatPoller {
    visible: watch::Sender<bool>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ChatPoller {
    /// Start polling; the screen is assumed visible
    pub fn start(engine: ChatSyncEngine, interval: Duration) -> Self {
        let (visible, rx) = watch::channel(true);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(engine, interval, rx, cancel.clone()));
        Self {
            visible,
            cancel,
            handle: Some(handle),
        }
    }

    /// Screen shown/hidden. Repeating the current state changes nothing.
    pub fn set_visible(&self, visible: bool) {
        self.visible.send_if_modified(|current| {
            if *current == visible {
                return false;
            }
            *current = visible;
            true
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling. Safe to call more than once.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if self.handle.take().is_some() {
            tracing::debug!("Chat poller stopped");
        }
    }
}

impl Drop for ChatPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    engine: ChatSyncEngine,
    interval: Duration,
    mut visible: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    loop {
        // paused: wait for the screen to come back
        while !*visible.borrow_and_update() {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = visible.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        // first tick fires immediately
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                changed = visible.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*visible.borrow_and_update() {
                        tracing::debug!("Chat polling paused");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        result = engine.refresh() => {
                            if let Err(e) = result {
                                tracing::warn!(error = %e, "Chat poll failed");
                            }
                        }
                    }
                }
            }
        }
    }
}
