//! Local storage port
//!
//! Stores persist small JSON snapshots through [`KeyValueStore`]. Persistence
//! is best-effort: [`persist_json`] and [`load_json`] log failures and never
//! hand them back to the caller, so an unavailable store never blocks an
//! in-memory state update.

pub mod memory;
pub mod sqlite;

use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage keys used by the stores
pub mod keys {
    pub const STOCK_FILTERS: &str = "stock-filters";
    pub const SYNC_STATE: &str = "stock-advisor-sync-state";
    pub const NOTIFICATIONS: &str = "stock-advisor-notifications";
    pub const LANGUAGE: &str = "user-locale";
    pub const THEME: &str = "theme";
}

/// String key/value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Serialize `value` and write it under `key`, logging any failure
pub fn persist_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(AppError::from)
        .and_then(|raw| store.set(key, &raw));

    match result {
        Ok(()) => debug!(key, "Persisted local state"),
        Err(e) => warn!(key, code = e.code(), "Failed to persist local state: {}", e),
    }
}

/// Read and deserialize the value under `key`
///
/// Returns `None` when nothing is stored or when the stored value cannot be
/// read back; the latter is logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = load_raw(store, key)?;

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, "Discarding unreadable local state: {}", e);
            None
        }
    }
}

/// Read a plain string value under `key`, logging any failure
pub fn load_raw(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, code = e.code(), "Failed to read local state: {}", e);
            None
        }
    }
}

/// Write a plain string value under `key`, logging any failure
pub fn persist_raw(store: &dyn KeyValueStore, key: &str, value: &str) {
    match store.set(key, value) {
        Ok(()) => debug!(key, "Persisted local state"),
        Err(e) => warn!(key, code = e.code(), "Failed to persist local state: {}", e),
    }
}
