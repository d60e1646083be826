//! Stocks Service
//!
//! Coordination for the stock listing screen. Holds no state: everything it
//! returns is derived from the stores, and every action is forwarded to them.

use crate::api::types::{StockRecord, StocksResponse};
use crate::state::AppState;
use crate::stores::FilterUpdate;
use serde::Serialize;
use tracing::info;

/// Rows highlighted at the top of a recommendations listing
pub const HIGHLIGHTED_ROWS: usize = 3;

/// Everything the listing screen renders
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StocksViewModel {
    pub items: Vec<StockRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub current_page: u32,
    pub items_per_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub should_show_recommendations: bool,
    pub highlighted_row_count: usize,
    pub has_pending_data_update: bool,
}

/// Initial values for the filter form
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilterFormValues {
    pub query: String,
    pub recommends: bool,
    pub min_target_to: Option<f64>,
    pub max_target_to: Option<f64>,
    pub currency: String,
}

pub struct StocksService;

impl StocksService {
    pub fn view(state: &AppState) -> StocksViewModel {
        let result = state.stocks.result();

        StocksViewModel {
            items: result.items,
            loading: result.loading,
            error: result.last_error,
            current_page: state.stocks.current_page(),
            items_per_page: state.stocks.items_per_page(),
            total_pages: state.stocks.total_pages(),
            total_items: result.total_count,
            should_show_recommendations: Self::should_show_recommendations(state),
            highlighted_row_count: Self::highlighted_row_count(state),
            has_pending_data_update: Self::has_pending_data_update(state),
        }
    }

    /// Recommendations are highlighted only on a clean first page
    pub fn should_show_recommendations(state: &AppState) -> bool {
        let filters = state.stocks.filters();
        filters.recommends
            && filters.page == 1
            && state.stocks.last_error().is_none()
            && state.stocks.has_results()
    }

    pub fn highlighted_row_count(state: &AppState) -> usize {
        if Self::should_show_recommendations(state) {
            state.stocks.items().len().min(HIGHLIGHTED_ROWS)
        } else {
            0
        }
    }

    /// A sync finished and the user has not looked at the listing since
    pub fn has_pending_data_update(state: &AppState) -> bool {
        state.sync.has_unacknowledged_data()
    }

    pub fn form_initial_values(state: &AppState) -> FilterFormValues {
        let filters = state.stocks.filters();
        FilterFormValues {
            query: filters.query,
            recommends: filters.recommends,
            min_target_to: filters.min_target_to,
            max_target_to: filters.max_target_to,
            currency: filters.currency,
        }
    }

    // ========== Actions ==========

    pub async fn handle_filter_submit(
        state: &AppState,
        update: FilterUpdate,
    ) -> Option<StocksResponse> {
        Self::acknowledge_pending_update(state);
        state.stocks.update_filters(update).await
    }

    pub async fn handle_filter_reset(
        state: &AppState,
        defaults: Option<FilterUpdate>,
    ) -> Option<StocksResponse> {
        Self::acknowledge_pending_update(state);
        state.stocks.reset_filters(defaults).await
    }

    pub async fn handle_page_change(state: &AppState, page: u32) -> Option<StocksResponse> {
        state.stocks.set_page(page).await
    }

    pub async fn handle_page_size_change(state: &AppState, size: u32) -> Option<StocksResponse> {
        state.stocks.set_page_size(size).await
    }

    /// Fetch the first page unless data is already present or loading
    ///
    /// Returns whether a fetch was issued.
    pub async fn load_initial_data(state: &AppState) -> bool {
        if state.stocks.has_results() || state.stocks.is_loading() {
            return false;
        }

        state.stocks.fetch().await;
        true
    }

    fn acknowledge_pending_update(state: &AppState) {
        if Self::has_pending_data_update(state) {
            info!("Acknowledging synced data");
            state.sync.mark_data_checked();
        }
    }
}
