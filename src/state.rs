//! Application state management

use crate::api::{HttpStockApi, StockApi};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::db::{KeyValueStore, SqliteStore};
use crate::error::Result;
use crate::stores::{NotificationStore, PreferencesStore, StockStore, SyncStore};
use std::sync::Arc;

/// Application root
///
/// Owns every store. Coordination code and the rendering layer receive it by
/// reference; nothing reaches the stores through globals.
pub struct AppState {
    pub config: AppConfig,

    /// Stocks backend client
    pub api: Arc<dyn StockApi>,

    /// Durable local storage shared by the stores
    pub storage: Arc<dyn KeyValueStore>,

    /// Filter criteria and the current page of results
    pub stocks: StockStore,

    /// Sync job status
    pub sync: SyncStore,

    /// User-facing notification log
    pub notifications: NotificationStore,

    /// Language and theme
    pub preferences: PreferencesStore,
}

impl AppState {
    /// Create application state backed by SQLite and the HTTP backend
    pub fn new(config: AppConfig) -> Result<Self> {
        let db_path = config.db_path();
        tracing::info!("Local storage: {:?}", db_path);

        let storage = Arc::new(SqliteStore::new(&db_path)?);
        let api = Arc::new(HttpStockApi::new(&config.api_base_url)?);
        tracing::info!("Stocks backend: {}", config.api_base_url);

        Ok(Self::from_parts(config, api, storage, Arc::new(SystemClock)))
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        config: AppConfig,
        api: Arc<dyn StockApi>,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let stocks = StockStore::new(api.clone(), storage.clone());
        let sync = SyncStore::new(storage.clone(), clock.clone());
        let notifications = NotificationStore::new(storage.clone(), clock);
        let preferences = PreferencesStore::new(storage.clone(), &config.default_language);

        Self {
            config,
            api,
            storage,
            stocks,
            sync,
            notifications,
            preferences,
        }
    }
}
