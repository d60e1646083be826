//! Wire types exchanged with the stocks backend

use serde::{Deserialize, Serialize};

/// Analyst rating record, as returned by `GET /stocks`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRecord {
    pub id: i64,
    pub ticker: String,
    pub company: String,
    pub brokerage: String,
    pub action: String,
    pub rating_from: String,
    pub rating_to: String,
    pub target_from: f64,
    pub target_to: f64,
    pub currency: String,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageData<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

/// Envelope wrapping every backend response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

pub type StocksResponse = ApiResponse<PageData<StockRecord>>;

/// `POST /stocks/sync` returns `data: null`
pub type SyncResponse = ApiResponse<Option<serde_json::Value>>;

/// Query string for `GET /stocks`
///
/// Absent or blank optional fields are left out of the query string.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub recommends: bool,
    pub page: u32,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_target_to: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_target_to: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Body of `POST /stocks/sync`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SyncRequest {
    pub limit: u32,
}
