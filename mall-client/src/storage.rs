//! Durable device storage
//!
//! Small JSON blobs keyed by name: tokens, the chat cache, the offline
//! queue and the pending external-confirm record. Every write replaces the
//! whole blob, so a reader never sees a half-updated structure.

use crate::error::ClientResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage keys
pub mod keys {
    pub const TOKENS: &str = "auth_tokens";
    pub const CHAT_CACHE: &str = "support_chat_cache";
    pub const OFFLINE_QUEUE: &str = "support_offline_queue";
    pub const PENDING_CONFIRM: &str = "pending_external_confirm";
}

/// Key-value blob storage
pub trait Storage: Send + Sync {
    fn load(&self, key: &str) -> ClientResult<Option<String>>;
    fn save(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// Load and parse a JSON blob. Unreadable or corrupt data counts as absent.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = match storage.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read stored value, treating as empty");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Corrupt stored value, treating as empty");
            None
        }
    }
}

/// Serialize and store a JSON blob
pub fn save_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> ClientResult<()> {
    let json = serde_json::to_string(value)?;
    storage.save(key, &json)
}

// ============================================================================
// FileStorage
// ============================================================================

/// 文件存储 - 每个 key 一个 JSON 文件
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 确保目录存在
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> ClientResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&self, key: &str, value: &str) -> ClientResult<()> {
        self.ensure_dir()?;
        // write-then-rename keeps the previous blob intact on a crash
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// In-memory storage for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
