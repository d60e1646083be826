//! Stock query state
//!
//! Owns the filter/pagination criteria and the last fetched page. Every
//! mutation persists the criteria and then fetches explicitly; there is no
//! debounce, callers that need one must debounce upstream.

use crate::api::types::{StockQuery, StockRecord, StocksResponse};
use crate::api::StockApi;
use crate::db::{self, keys, KeyValueStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Message used when a failure carries no description of its own
pub const UNKNOWN_ERROR: &str = "t_errors_stockStore_unknown_error";

/// User-controlled query parameters plus pagination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub query: String,
    pub recommends: bool,
    pub min_target_to: Option<f64>,
    pub max_target_to: Option<f64>,
    pub currency: String,
    pub page: u32,
    pub size: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            query: String::new(),
            recommends: false,
            min_target_to: None,
            max_target_to: None,
            currency: DEFAULT_CURRENCY.to_string(),
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterCriteria {
    /// True if any non-pagination field deviates from the defaults
    pub fn has_active_filters(&self) -> bool {
        let defaults = FilterCriteria::default();
        self.query != defaults.query
            || self.recommends != defaults.recommends
            || self.min_target_to.is_some()
            || self.max_target_to.is_some()
            || self.currency != defaults.currency
    }

    /// Wire query, with blank text fields left out
    pub fn to_query(&self) -> StockQuery {
        let non_blank = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        StockQuery {
            query: non_blank(&self.query),
            recommends: self.recommends,
            page: self.page,
            size: self.size,
            min_target_to: self.min_target_to,
            max_target_to: self.max_target_to,
            currency: non_blank(&self.currency),
        }
    }
}

/// Partial update of [`FilterCriteria`]
///
/// `None` leaves a field untouched. The numeric range fields are doubly
/// optional so that `Some(None)` clears a bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterUpdate {
    pub query: Option<String>,
    pub recommends: Option<bool>,
    pub min_target_to: Option<Option<f64>>,
    pub max_target_to: Option<Option<f64>>,
    pub currency: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn recommends(mut self, recommends: bool) -> Self {
        self.recommends = Some(recommends);
        self
    }

    pub fn min_target_to(mut self, min: Option<f64>) -> Self {
        self.min_target_to = Some(min);
        self
    }

    pub fn max_target_to(mut self, max: Option<f64>) -> Self {
        self.max_target_to = Some(max);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// True if the update touches anything besides page and size
    pub fn touches_content(&self) -> bool {
        self.query.is_some()
            || self.recommends.is_some()
            || self.min_target_to.is_some()
            || self.max_target_to.is_some()
            || self.currency.is_some()
    }

    /// Merge into `filters`, returning to the first page on content changes
    pub fn apply_to(&self, filters: &mut FilterCriteria) {
        if let Some(query) = &self.query {
            filters.query = query.clone();
        }
        if let Some(recommends) = self.recommends {
            filters.recommends = recommends;
        }
        if let Some(min) = self.min_target_to {
            filters.min_target_to = min;
        }
        if let Some(max) = self.max_target_to {
            filters.max_target_to = max;
        }
        if let Some(currency) = &self.currency {
            filters.currency = currency.clone();
        }
        if let Some(page) = self.page {
            filters.page = page.max(1);
        }
        if let Some(size) = self.size {
            filters.size = size.max(1);
        }

        if self.touches_content() {
            filters.page = DEFAULT_PAGE;
        }
    }
}

/// Latest fetched page plus loading/error status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub items: Vec<StockRecord>,
    pub total_count: u64,
    /// Page echoed by the server for the last successful fetch
    pub resolved_page: u32,
    /// Size echoed by the server for the last successful fetch
    pub resolved_size: u32,
    pub loading: bool,
    pub last_error: Option<String>,
}

/// `ceil(total / size)`, never less than one page
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clears `loading` when a fetch ends, including when its future is dropped
///
/// Only the latest issued request may touch the flag.
struct LoadingReset<'a> {
    store: &'a StockStore,
    seq: u64,
}

impl Drop for LoadingReset<'_> {
    fn drop(&mut self) {
        if self.store.request_seq.load(Ordering::SeqCst) == self.seq {
            self.store.state.write().result.loading = false;
        }
    }
}

#[derive(Debug, Default)]
struct StockState {
    filters: FilterCriteria,
    result: QueryResult,
}

/// Stock listing store
pub struct StockStore {
    api: Arc<dyn StockApi>,
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<StockState>,
    request_seq: AtomicU64,
}

impl StockStore {
    /// Create the store, restoring persisted filter criteria if present
    pub fn new(api: Arc<dyn StockApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let mut filters: FilterCriteria =
            db::load_json(storage.as_ref(), keys::STOCK_FILTERS).unwrap_or_default();
        filters.page = filters.page.max(1);
        filters.size = filters.size.max(1);

        Self {
            api,
            storage,
            state: RwLock::new(StockState {
                filters,
                result: QueryResult::default(),
            }),
            request_seq: AtomicU64::new(0),
        }
    }

    // ========== Accessors ==========

    pub fn filters(&self) -> FilterCriteria {
        self.state.read().filters.clone()
    }

    pub fn result(&self) -> QueryResult {
        self.state.read().result.clone()
    }

    pub fn items(&self) -> Vec<StockRecord> {
        self.state.read().result.items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().result.loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().result.last_error.clone()
    }

    pub fn has_results(&self) -> bool {
        !self.state.read().result.items.is_empty()
    }

    pub fn current_page(&self) -> u32 {
        self.state.read().filters.page
    }

    pub fn items_per_page(&self) -> u32 {
        self.state.read().filters.size
    }

    pub fn total_items(&self) -> u64 {
        self.state.read().result.total_count
    }

    pub fn total_pages(&self) -> u32 {
        let state = self.state.read();
        total_pages(state.result.total_count, state.filters.size)
    }

    pub fn has_active_filters(&self) -> bool {
        self.state.read().filters.has_active_filters()
    }

    // ========== Actions ==========

    /// Fetch the page described by the current criteria
    ///
    /// Failures never propagate: they clear the table and set `last_error`.
    /// Only the most recently issued fetch may write its outcome; a response
    /// that arrives after a newer request was issued is dropped.
    pub async fn fetch(&self) -> Option<StocksResponse> {
        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let query = {
            let mut state = self.state.write();
            state.result.loading = true;
            state.result.last_error = None;
            state.filters.to_query()
        };
        let _loading = LoadingReset { store: self, seq };

        debug!(seq, page = query.page, size = query.size, "Fetching stocks");
        let outcome = self.api.get_stocks(&query).await;

        if self.request_seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "Discarding stale stocks response");
            return None;
        }

        let (response, filters) = {
            let mut state = self.state.write();
            let response = match outcome {
                Ok(response) => {
                    let data = &response.data;
                    state.result.items = data.content.clone();
                    state.result.total_count = data.total;
                    state.result.resolved_page = data.page.max(1);
                    state.result.resolved_size = data.size.max(1);
                    state.filters.page = state.result.resolved_page;
                    state.filters.size = state.result.resolved_size;
                    info!(
                        count = data.content.len(),
                        total = data.total,
                        page = data.page,
                        "Loaded stocks"
                    );
                    Some(response)
                }
                Err(e) => {
                    let message = e.to_string();
                    error!(code = e.code(), "Error loading stocks: {}", message);
                    state.result.items.clear();
                    state.result.total_count = 0;
                    state.result.last_error = Some(if message.is_empty() {
                        UNKNOWN_ERROR.to_string()
                    } else {
                        message
                    });
                    None
                }
            };
            state.result.loading = false;
            (response, state.filters.clone())
        };

        if response.is_some() {
            self.persist_filters(&filters);
        }

        response
    }

    /// Merge `update` into the criteria, persist, then fetch
    pub async fn update_filters(&self, update: FilterUpdate) -> Option<StocksResponse> {
        let filters = {
            let mut state = self.state.write();
            update.apply_to(&mut state.filters);
            state.filters.clone()
        };
        debug!(?update, "Updated stock filters");

        self.persist_filters(&filters);
        self.fetch().await
    }

    /// Restore default criteria, keeping the page size, then fetch
    ///
    /// `overrides` are applied on top of the defaults; the page always
    /// returns to the first one.
    pub async fn reset_filters(&self, overrides: Option<FilterUpdate>) -> Option<StocksResponse> {
        let filters = {
            let mut state = self.state.write();
            let mut filters = FilterCriteria {
                size: state.filters.size,
                ..FilterCriteria::default()
            };
            if let Some(overrides) = &overrides {
                overrides.apply_to(&mut filters);
            }
            filters.page = DEFAULT_PAGE;
            state.filters = filters.clone();
            filters
        };
        debug!("Reset stock filters");

        self.persist_filters(&filters);
        self.fetch().await
    }

    pub async fn set_page(&self, page: u32) -> Option<StocksResponse> {
        self.update_filters(FilterUpdate::new().page(page)).await
    }

    /// Change the page size and return to the first page
    pub async fn set_page_size(&self, size: u32) -> Option<StocksResponse> {
        self.update_filters(FilterUpdate::new().size(size).page(DEFAULT_PAGE))
            .await
    }

    fn persist_filters(&self, filters: &FilterCriteria) {
        db::persist_json(self.storage.as_ref(), keys::STOCK_FILTERS, filters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::testing::{page, stock, FakeStockApi};

    fn store_with(api: &Arc<FakeStockApi>) -> (StockStore, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let store = StockStore::new(api.clone(), storage.clone());
        (store, storage)
    }

    #[test]
    fn test_default_state() {
        let api = Arc::new(FakeStockApi::new());
        let (store, _) = store_with(&api);

        assert_eq!(store.filters(), FilterCriteria::default());
        assert!(!store.is_loading());
        assert!(store.last_error().is_none());
        assert!(!store.has_results());
        assert_eq!(store.total_pages(), 1);
        assert!(!store.has_active_filters());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 20), 5);
        assert_eq!(total_pages(100, 1), 100);
    }

    #[test]
    fn test_content_update_returns_to_first_page() {
        let updates = [
            FilterUpdate::new().query("MSFT"),
            FilterUpdate::new().recommends(true),
            FilterUpdate::new().min_target_to(Some(10.0)),
            FilterUpdate::new().max_target_to(None),
            FilterUpdate::new().currency("EUR"),
            FilterUpdate::new().query("TSLA").page(4),
        ];

        for update in updates {
            let mut filters = FilterCriteria {
                page: 7,
                ..FilterCriteria::default()
            };
            update.apply_to(&mut filters);
            assert_eq!(filters.page, 1, "{:?}", update);
        }
    }

    #[test]
    fn test_pagination_update_keeps_content() {
        let mut filters = FilterCriteria {
            query: "NVDA".to_string(),
            ..FilterCriteria::default()
        };

        FilterUpdate::new().page(3).apply_to(&mut filters);
        assert_eq!(filters.page, 3);

        FilterUpdate::new().size(25).apply_to(&mut filters);
        assert_eq!(filters.page, 3);
        assert_eq!(filters.size, 25);
        assert_eq!(filters.query, "NVDA");

        FilterUpdate::new().page(0).size(0).apply_to(&mut filters);
        assert_eq!(filters.page, 1);
        assert_eq!(filters.size, 1);
    }

    #[test]
    fn test_query_omits_blank_fields() {
        let filters = FilterCriteria {
            query: "  ".to_string(),
            currency: String::new(),
            ..FilterCriteria::default()
        };

        let query = filters.to_query();
        assert!(query.query.is_none());
        assert!(query.currency.is_none());
        assert!(query.min_target_to.is_none());
        assert_eq!(query.page, 1);
        assert_eq!(query.size, 10);
    }

    #[tokio::test]
    async fn test_update_filters_fetches_first_page() {
        let api = Arc::new(FakeStockApi::new());
        api.push_page(page(vec![stock(1, "AAPL")], 1, 1, 10));
        let (store, _) = store_with(&api);

        let response = store
            .update_filters(FilterUpdate::new().query("AAPL"))
            .await;

        assert!(response.is_some());
        let query = api.last_query().unwrap();
        assert_eq!(query.query.as_deref(), Some("AAPL"));
        assert_eq!(query.page, 1);

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.total_pages(), 1);
        assert!(store.has_results());
        assert!(store.has_active_filters());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_server_echo_overrides_pagination() {
        let api = Arc::new(FakeStockApi::new());
        api.push_page(page(vec![stock(1, "AAPL")], 42, 3, 20));
        let (store, _) = store_with(&api);

        store.set_page(9).await;

        assert_eq!(api.last_query().unwrap().page, 9);
        assert_eq!(store.current_page(), 3);
        assert_eq!(store.items_per_page(), 20);
        assert_eq!(store.total_pages(), 3);
        assert_eq!(store.result().resolved_page, 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_items() {
        let api = Arc::new(FakeStockApi::new());
        api.push_page(page(vec![stock(1, "AAPL"), stock(2, "MSFT")], 2, 1, 10));
        api.push_error("Network Error");
        let (store, _) = store_with(&api);

        store.fetch().await;
        assert_eq!(store.items().len(), 2);

        let response = store.fetch().await;

        assert!(response.is_none());
        assert!(!store.is_loading());
        assert!(store.last_error().unwrap().contains("Network Error"));
        assert!(store.items().is_empty());
        assert_eq!(store.total_items(), 0);
    }

    #[tokio::test]
    async fn test_successful_fetch_clears_previous_error() {
        let api = Arc::new(FakeStockApi::new());
        api.push_error("Network Error");
        api.push_page(page(vec![stock(1, "AAPL")], 1, 1, 10));
        let (store, _) = store_with(&api);

        store.fetch().await;
        assert!(store.last_error().is_some());

        store.fetch().await;
        assert!(store.last_error().is_none());
        assert!(store.has_results());
    }

    #[tokio::test]
    async fn test_reset_keeps_page_size() {
        let api = Arc::new(FakeStockApi::new());
        let (store, _) = store_with(&api);

        store
            .update_filters(
                FilterUpdate::new()
                    .query("AMZN")
                    .recommends(true)
                    .currency("EUR")
                    .size(25),
            )
            .await;
        store.set_page(4).await;

        store.reset_filters(None).await;

        let filters = store.filters();
        assert_eq!(filters.query, "");
        assert!(!filters.recommends);
        assert_eq!(filters.currency, "USD");
        assert_eq!(filters.size, 25);
        assert_eq!(filters.page, 1);
        assert!(!store.has_active_filters());
    }

    #[tokio::test]
    async fn test_reset_with_overrides() {
        let api = Arc::new(FakeStockApi::new());
        let (store, _) = store_with(&api);
        store.set_page(5).await;

        store
            .reset_filters(Some(FilterUpdate::new().currency("EUR").page(3)))
            .await;

        let filters = store.filters();
        assert_eq!(filters.currency, "EUR");
        assert_eq!(filters.page, 1);
        assert_eq!(api.last_query().unwrap().currency.as_deref(), Some("EUR"));
    }

    #[tokio::test]
    async fn test_set_page_size_returns_to_first_page() {
        let api = Arc::new(FakeStockApi::new());
        let (store, _) = store_with(&api);
        store.set_page(6).await;

        store.set_page_size(50).await;

        let query = api.last_query().unwrap();
        assert_eq!(query.size, 50);
        assert_eq!(query.page, 1);
    }

    #[tokio::test]
    async fn test_filters_survive_restart() {
        let api = Arc::new(FakeStockApi::new());
        let (store, storage) = store_with(&api);

        store
            .update_filters(FilterUpdate::new().query("GOOG").min_target_to(Some(100.0)))
            .await;

        let restored = StockStore::new(api.clone(), storage);
        let filters = restored.filters();
        assert_eq!(filters.query, "GOOG");
        assert_eq!(filters.min_target_to, Some(100.0));
    }

    #[tokio::test]
    async fn test_filters_update_even_when_storage_fails() {
        let api = Arc::new(FakeStockApi::new());
        let (store, storage) = store_with(&api);
        storage.fail_writes(true);

        store.update_filters(FilterUpdate::new().query("IBM")).await;

        assert_eq!(store.filters().query, "IBM");
        assert_eq!(api.last_query().unwrap().query.as_deref(), Some("IBM"));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_defaults() {
        let api = Arc::new(FakeStockApi::new());
        let storage = Arc::new(MemoryStore::new());
        storage.set(keys::STOCK_FILTERS, "{broken").unwrap();

        let store = StockStore::new(api, storage);
        assert_eq!(store.filters(), FilterCriteria::default());
    }

    #[tokio::test]
    async fn test_stored_pagination_clamped_on_load() {
        let api = Arc::new(FakeStockApi::new());
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(keys::STOCK_FILTERS, r#"{"query":"AAPL","page":0,"size":0}"#)
            .unwrap();

        let store = StockStore::new(api.clone(), storage);
        assert_eq!(store.current_page(), 1);
        assert_eq!(store.items_per_page(), 1);
        assert_eq!(store.filters().query, "AAPL");

        store.fetch().await;
        let query = api.last_query().unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.size, 1);
    }

    #[tokio::test]
    async fn test_dropped_fetch_clears_loading() {
        let api = Arc::new(FakeStockApi::new());
        let _reply = api.push_gated();
        let (store, _) = store_with(&api);

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(10), store.fetch()).await;

        assert!(abandoned.is_err());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_dropped_stale_fetch_leaves_newer_loading() {
        let api = Arc::new(FakeStockApi::new());
        let _first = api.push_gated();
        let second = api.push_gated();
        let (store, _) = store_with(&api);

        {
            let mut older = Box::pin(store.fetch());
            let mut newer = Box::pin(store.fetch());

            tokio::select! {
                biased;
                _ = &mut older => unreachable!("gated reply"),
                _ = &mut newer => unreachable!("gated reply"),
                _ = tokio::task::yield_now() => {}
            }
            assert!(store.is_loading());

            // Dropping only the older request keeps the newer one loading
            drop(older);
            assert!(store.is_loading());

            second
                .send(Ok(page(vec![stock(2, "NEW")], 1, 1, 10)))
                .unwrap();
            assert!(newer.await.is_some());
        }

        assert!(!store.is_loading());
        assert_eq!(store.items()[0].ticker, "NEW");
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let api = Arc::new(FakeStockApi::new());
        let first = api.push_gated();
        let second = api.push_gated();
        let (store, _) = store_with(&api);

        let release = async {
            tokio::task::yield_now().await;
            second
                .send(Ok(page(vec![stock(2, "NEW")], 1, 1, 10)))
                .unwrap();
            tokio::task::yield_now().await;
            first
                .send(Ok(page(vec![stock(1, "OLD")], 1, 1, 10)))
                .unwrap();
        };

        let (older, newer, _) = tokio::join!(store.fetch(), store.fetch(), release);

        assert!(older.is_none());
        assert!(newer.is_some());
        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].ticker, "NEW");
        assert!(!store.is_loading());
    }
}
