//! Session context
//!
//! Owns the token pair and the durable storage handle, and broadcasts
//! login/logout transitions. Components receive an `Arc<SessionContext>`
//! instead of reaching for globals.

use crate::error::ClientResult;
use crate::storage::{Storage, keys, load_json, save_json};
use shared::client::TokenPair;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Session lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// Refresh failed; the UI must send the user to login
    ReauthRequired,
}

/// 会话上下文
pub struct SessionContext {
    storage: Arc<dyn Storage>,
    tokens: RwLock<Option<TokenPair>>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl SessionContext {
    /// Load persisted tokens (if any) from storage
    pub fn init(storage: Arc<dyn Storage>) -> Self {
        let tokens = load_json::<TokenPair>(storage.as_ref(), keys::TOKENS);
        if tokens.is_some() {
            tracing::debug!("Restored session tokens from storage");
        }
        let (events, _) = broadcast::channel(16);
        Self {
            storage,
            tokens: RwLock::new(tokens),
            events,
        }
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// Subscribe to session events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|t| t.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().map(|t| t.refresh.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().is_some()
    }

    /// Store tokens after a login
    pub fn set_tokens(&self, tokens: TokenPair) -> ClientResult<()> {
        save_json(self.storage.as_ref(), keys::TOKENS, &tokens)?;
        *self.write() = Some(tokens);
        let _ = self.events.send(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Replace the access token after a refresh (and the refresh token if rotated)
    pub fn update_access(&self, access: String, refresh: Option<String>) -> ClientResult<()> {
        let updated = {
            let mut guard = self.write();
            let Some(current) = guard.as_mut() else {
                return Ok(());
            };
            current.access = access;
            if let Some(refresh) = refresh {
                current.refresh = refresh;
            }
            current.clone()
        };
        save_json(self.storage.as_ref(), keys::TOKENS, &updated)
    }

    /// Logout: drop tokens and every per-user durable record
    pub fn teardown(&self) -> ClientResult<()> {
        self.clear()?;
        let _ = self.events.send(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Refresh failed: clear like a logout and ask for re-authentication
    pub fn require_reauth(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "Failed to clear session storage");
        }
        let _ = self.events.send(SessionEvent::ReauthRequired);
    }

    fn clear(&self) -> ClientResult<()> {
        *self.write() = None;
        for key in [
            keys::TOKENS,
            keys::CHAT_CACHE,
            keys::OFFLINE_QUEUE,
            keys::PENDING_CONFIRM,
        ] {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<TokenPair>> {
        self.tokens.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<TokenPair>> {
        self.tokens.write().unwrap_or_else(|e| e.into_inner())
    }
}
