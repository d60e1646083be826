//! Stocks backend client

pub mod http;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;
use types::*;

pub use http::HttpStockApi;

/// Operations the front-end needs from the stocks backend
#[async_trait]
pub trait StockApi: Send + Sync {
    /// `GET /stocks` with the given filter and pagination
    async fn get_stocks(&self, query: &StockQuery) -> Result<StocksResponse>;

    /// `POST /stocks/sync`, asking the backend to refresh its dataset
    async fn sync_stocks(&self, limit: u32) -> Result<SyncResponse>;
}
