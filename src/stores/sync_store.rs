//! Sync status state
//!
//! Tracks whether a backend sync is running, whether freshly synced data has
//! not been looked at yet, and when the last sync succeeded. Only the last
//! two are persisted; `in_progress` lives in memory, so observing it set
//! when a screen mounts means the previous attempt never finished.

use crate::clock::Clock;
use crate::db::{self, keys, KeyValueStore};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncStatus {
    pub in_progress: bool,
    pub data_updated_unacknowledged: bool,
    pub last_success_time: Option<DateTime<Utc>>,
}

/// Persisted subset of [`SyncStatus`]
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSyncState {
    #[serde(default)]
    data_updated: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    last_sync_time: Option<DateTime<Utc>>,
}

pub struct SyncStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    status: RwLock<SyncStatus>,
}

impl SyncStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let persisted: PersistedSyncState =
            db::load_json(storage.as_ref(), keys::SYNC_STATE).unwrap_or_default();

        Self {
            storage,
            clock,
            status: RwLock::new(SyncStatus {
                in_progress: false,
                data_updated_unacknowledged: persisted.data_updated,
                last_success_time: persisted.last_sync_time,
            }),
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.read().clone()
    }

    pub fn is_in_progress(&self) -> bool {
        self.status.read().in_progress
    }

    pub fn has_unacknowledged_data(&self) -> bool {
        self.status.read().data_updated_unacknowledged
    }

    pub fn last_success_time(&self) -> Option<DateTime<Utc>> {
        self.status.read().last_success_time
    }

    /// Signal that a sync request is about to be sent
    pub fn start_sync(&self) {
        self.status.write().in_progress = true;
        info!("Sync started");
    }

    /// Record the outcome of a sync request; returns `success` unchanged
    pub fn complete_sync(&self, success: bool) -> bool {
        let snapshot = {
            let mut status = self.status.write();
            status.in_progress = false;

            if success {
                status.data_updated_unacknowledged = true;
                status.last_success_time = Some(self.clock.now());
                Some(status.clone())
            } else {
                None
            }
        };

        match snapshot {
            Some(status) => {
                info!("Sync completed");
                self.persist(&status);
            }
            None => warn!("Sync failed"),
        }

        success
    }

    /// The user has seen the freshly synced data
    pub fn mark_data_checked(&self) {
        let snapshot = {
            let mut status = self.status.write();
            status.data_updated_unacknowledged = false;
            status.clone()
        };
        self.persist(&snapshot);
    }

    /// Clear a stuck `in_progress` flag left behind by an interrupted sync
    ///
    /// Returns `true` if there was one to clear.
    pub fn recover_from_incomplete_sync(&self) -> bool {
        let mut status = self.status.write();
        if status.in_progress {
            status.in_progress = false;
            warn!("Recovered from incomplete sync");
            true
        } else {
            false
        }
    }

    fn persist(&self, status: &SyncStatus) {
        let persisted = PersistedSyncState {
            data_updated: status.data_updated_unacknowledged,
            last_sync_time: status.last_success_time,
        };
        db::persist_json(self.storage.as_ref(), keys::SYNC_STATE, &persisted);
    }
}
