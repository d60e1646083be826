//! Stock Advisor Desktop
//!
//! Analyst rating browser: filtered, paginated stock listings from the
//! stocks backend, a confirm-before-run data sync and a persistent
//! notification log.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod stores;

#[cfg(test)]
mod testing;

use config::AppConfig;
use services::{StocksService, SyncService};
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_advisor_lib=debug,stock_advisor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Limit argument of `stock-advisor sync <limit>`
fn sync_limit_arg(args: &[String]) -> Option<&str> {
    match args {
        [_, command, limit, ..] if command == "sync" => Some(limit.as_str()),
        [_, command] if command == "sync" => Some(""),
        _ => None,
    }
}

/// Initialize and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Stock Advisor Desktop...");

    let config = AppConfig::from_env()?;
    let state = AppState::new(config)?;
    tracing::info!("Application state initialized");

    let mut sync = SyncService::default();
    if sync.mount(&state) {
        tracing::warn!("Recovered from an incomplete sync");
    }

    let args: Vec<String> = std::env::args().collect();
    if let Some(limit) = sync_limit_arg(&args) {
        let limit = sync.handle_sync_submit(limit)?;
        tracing::info!(limit, "Sync confirmed");
        if let Some(response) = sync.confirm(&state).await {
            tracing::info!(code = response.code, "{}", response.message);
        }
    } else {
        StocksService::load_initial_data(&state).await;
        let view = StocksService::view(&state);

        match &view.error {
            Some(e) => tracing::error!("Failed to load stocks: {}", e),
            None => tracing::info!(
                page = view.current_page,
                total_pages = view.total_pages,
                total_items = view.total_items,
                "Loaded {} stocks",
                view.items.len()
            ),
        }
    }

    for notification in state.notifications.notifications().iter().filter(|n| !n.read) {
        tracing::info!(kind = ?notification.kind, "{}", notification.message);
    }

    Ok(())
}
