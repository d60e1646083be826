//! Test doubles and fixtures

use crate::api::types::*;
use crate::api::StockApi;
use crate::clock::ManualClock;
use crate::config::AppConfig;
use crate::db::MemoryStore;
use crate::error::{AppError, Result};
use crate::state::AppState;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

enum Reply<T> {
    Ready(Result<T>),
    Gated(oneshot::Receiver<Result<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T> {
        match self {
            Reply::Ready(result) => result,
            Reply::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(AppError::Internal("reply dropped".to_string()))),
        }
    }
}

/// Scripted [`StockApi`]
///
/// Replies are consumed in call order. With nothing queued, `get_stocks`
/// answers an empty page echoing the request and `sync_stocks` succeeds.
#[derive(Default)]
pub struct FakeStockApi {
    stock_replies: Mutex<VecDeque<Reply<StocksResponse>>>,
    sync_replies: Mutex<VecDeque<Reply<SyncResponse>>>,
    queries: Mutex<Vec<StockQuery>>,
    sync_limits: Mutex<Vec<u32>>,
}

impl FakeStockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, response: StocksResponse) {
        self.stock_replies
            .lock()
            .push_back(Reply::Ready(Ok(response)));
    }

    pub fn push_error(&self, message: &str) {
        self.stock_replies
            .lock()
            .push_back(Reply::Ready(Err(AppError::Internal(message.to_string()))));
    }

    /// Queue a reply that is held back until the returned sender fires
    pub fn push_gated(&self) -> oneshot::Sender<Result<StocksResponse>> {
        let (tx, rx) = oneshot::channel();
        self.stock_replies.lock().push_back(Reply::Gated(rx));
        tx
    }

    pub fn push_sync_ok(&self, message: &str) {
        self.sync_replies.lock().push_back(Reply::Ready(Ok(ApiResponse {
            code: 200,
            message: message.to_string(),
            data: None,
        })));
    }

    pub fn push_sync_error(&self, message: &str) {
        self.sync_replies
            .lock()
            .push_back(Reply::Ready(Err(AppError::Internal(message.to_string()))));
    }

    /// Queue a sync reply that is held back until the returned sender fires
    pub fn push_sync_gated(&self) -> oneshot::Sender<Result<SyncResponse>> {
        let (tx, rx) = oneshot::channel();
        self.sync_replies.lock().push_back(Reply::Gated(rx));
        tx
    }

    pub fn queries(&self) -> Vec<StockQuery> {
        self.queries.lock().clone()
    }

    pub fn last_query(&self) -> Option<StockQuery> {
        self.queries.lock().last().cloned()
    }

    pub fn sync_limits(&self) -> Vec<u32> {
        self.sync_limits.lock().clone()
    }
}

#[async_trait]
impl StockApi for FakeStockApi {
    async fn get_stocks(&self, query: &StockQuery) -> Result<StocksResponse> {
        self.queries.lock().push(query.clone());
        let reply = self.stock_replies.lock().pop_front();

        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(page(vec![], 0, query.page, query.size)),
        }
    }

    async fn sync_stocks(&self, limit: u32) -> Result<SyncResponse> {
        self.sync_limits.lock().push(limit);
        let reply = self.sync_replies.lock().pop_front();

        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(ApiResponse {
                code: 200,
                message: "OK".to_string(),
                data: None,
            }),
        }
    }
}

pub fn stock(id: i64, ticker: &str) -> StockRecord {
    StockRecord {
        id,
        ticker: ticker.to_string(),
        company: format!("{} Corp.", ticker),
        brokerage: "The Goldman Sachs Group".to_string(),
        action: "target raised by".to_string(),
        rating_from: "Neutral".to_string(),
        rating_to: "Buy".to_string(),
        target_from: 100.0,
        target_to: 120.0,
        currency: "USD".to_string(),
    }
}

pub fn page(items: Vec<StockRecord>, total: u64, page: u32, size: u32) -> StocksResponse {
    ApiResponse {
        code: 200,
        message: "OK".to_string(),
        data: PageData {
            content: items,
            total,
            page,
            size,
        },
    }
}

/// Application state wired to in-memory collaborators
pub struct TestContext {
    pub state: AppState,
    pub api: Arc<FakeStockApi>,
    pub storage: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl TestContext {
    pub fn new() -> Self {
        let api = Arc::new(FakeStockApi::new());
        let storage = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let state = Self::build(&api, &storage, &clock);

        Self {
            state,
            api,
            storage,
            clock,
        }
    }

    /// Fresh state over the same storage, as after an application restart
    pub fn restart(&self) -> AppState {
        Self::build(&self.api, &self.storage, &self.clock)
    }

    fn build(api: &Arc<FakeStockApi>, storage: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> AppState {
        AppState::from_parts(
            AppConfig::default(),
            api.clone(),
            storage.clone(),
            clock.clone(),
        )
    }
}
