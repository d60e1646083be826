//! Notification log
//!
//! Newest-first list of user-facing messages. Identical messages of the same
//! kind collapse into one within the de-duplication window, the list is
//! capped, and entries past the maximum age are dropped on load and on every
//! insertion.

use crate::clock::Clock;
use crate::db::{self, keys, KeyValueStore};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub const DUPLICATE_WINDOW_MS: i64 = 5_000;
pub const MAX_NOTIFICATIONS: usize = 50;
pub const MAX_NOTIFICATION_AGE_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationLimits {
    pub duplicate_window: Duration,
    pub max_retained: usize,
    pub max_age: Duration,
}

impl Default for NotificationLimits {
    fn default() -> Self {
        Self {
            duplicate_window: Duration::milliseconds(DUPLICATE_WINDOW_MS),
            max_retained: MAX_NOTIFICATIONS,
            max_age: Duration::days(MAX_NOTIFICATION_AGE_DAYS),
        }
    }
}

pub struct NotificationStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    limits: NotificationLimits,
    notifications: RwLock<Vec<Notification>>,
}

impl NotificationStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(storage, clock, NotificationLimits::default())
    }

    pub fn with_limits(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        limits: NotificationLimits,
    ) -> Self {
        let mut stored: Vec<Notification> =
            db::load_json(storage.as_ref(), keys::NOTIFICATIONS).unwrap_or_default();

        let over_cap = stored.len() > limits.max_retained;
        if over_cap {
            debug!(
                stored = stored.len(),
                max = limits.max_retained,
                "Truncating stored notifications"
            );
            stored.truncate(limits.max_retained);
        }

        let store = Self {
            storage,
            clock,
            limits,
            notifications: RwLock::new(stored),
        };

        if store.prune_old_notifications() == 0 && over_cap {
            let mut notifications = store.notifications.write();
            store.persist(&mut notifications);
        }
        store
    }

    // ========== Getters ==========

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().clone()
    }

    pub fn len(&self) -> usize {
        self.notifications.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.read().is_empty()
    }

    pub fn has_notifications(&self) -> bool {
        !self.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.read().iter().filter(|n| !n.read).count()
    }

    // ========== Actions ==========

    /// Append a notification and return its id
    ///
    /// If an identical message of the same kind was added within the
    /// de-duplication window, nothing is inserted and that entry's id is
    /// returned instead.
    pub fn add_notification(&self, message: impl Into<String>, kind: NotificationKind) -> String {
        let message = message.into();
        let now = self.clock.now();
        let mut notifications = self.notifications.write();

        if let Some(existing) = notifications.iter().find(|n| {
            n.message == message && n.kind == kind && now - n.created_at < self.limits.duplicate_window
        }) {
            debug!(id = %existing.id, "Suppressed duplicate notification");
            return existing.id.clone();
        }

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            message,
            kind,
            created_at: now,
            read: false,
        };
        let id = notification.id.clone();
        notifications.insert(0, notification);

        self.retain_recent(&mut notifications, now);
        self.persist(&mut notifications);

        debug!(%id, ?kind, "Added notification");
        id
    }

    pub fn mark_as_read(&self, id: &str) -> bool {
        let mut notifications = self.notifications.write();
        let Some(notification) = notifications.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if notification.read {
            return false;
        }

        notification.read = true;
        self.persist(&mut notifications);
        true
    }

    pub fn mark_all_as_read(&self) -> bool {
        let mut notifications = self.notifications.write();
        let mut changed = false;

        for notification in notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed = true;
        }

        if changed {
            self.persist(&mut notifications);
        }
        changed
    }

    pub fn remove_notification(&self, id: &str) -> bool {
        let mut notifications = self.notifications.write();
        let before = notifications.len();
        notifications.retain(|n| n.id != id);

        let changed = notifications.len() != before;
        if changed {
            self.persist(&mut notifications);
        }
        changed
    }

    pub fn clear_all(&self) -> bool {
        let mut notifications = self.notifications.write();
        if notifications.is_empty() {
            return false;
        }

        notifications.clear();
        self.persist(&mut notifications);
        true
    }

    /// Drop entries older than the maximum age; returns how many went
    pub fn prune_old_notifications(&self) -> usize {
        let now = self.clock.now();
        let mut notifications = self.notifications.write();

        let removed = self.retain_recent(&mut notifications, now);
        if removed > 0 {
            debug!(removed, "Pruned old notifications");
            self.persist(&mut notifications);
        }
        removed
    }

    fn retain_recent(&self, notifications: &mut Vec<Notification>, now: DateTime<Utc>) -> usize {
        let before = notifications.len();
        notifications.retain(|n| now - n.created_at < self.limits.max_age);
        before - notifications.len()
    }

    fn persist(&self, notifications: &mut Vec<Notification>) {
        notifications.truncate(self.limits.max_retained);
        db::persist_json(self.storage.as_ref(), keys::NOTIFICATIONS, &*notifications);
    }
}
