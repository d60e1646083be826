//! State containers
//!
//! Each store owns its data exclusively and is reached through
//! [`AppState`](crate::state::AppState); none of them knows about the others.

pub mod notification_store;
pub mod preferences_store;
pub mod stock_store;
pub mod sync_store;

pub use notification_store::{Notification, NotificationKind, NotificationLimits, NotificationStore};
pub use preferences_store::{PreferencesStore, Theme};
pub use stock_store::{FilterCriteria, FilterUpdate, QueryResult, StockStore};
pub use sync_store::{SyncStatus, SyncStore};
