//! reqwest implementation of [`StockApi`]

use crate::api::types::*;
use crate::api::StockApi;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

const STOCKS_PATH: &str = "stocks";
const SYNC_PATH: &str = "stocks/sync";

/// HTTP client for the stocks backend
///
/// No request timeout and no retries: a slow or failed request surfaces once
/// as an error and any retry is left to the user.
pub struct HttpStockApi {
    client: Client,
    base_url: Url,
}

impl HttpStockApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    fn default_headers() -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl StockApi for HttpStockApi {
    async fn get_stocks(&self, query: &StockQuery) -> Result<StocksResponse> {
        let url = self.endpoint(STOCKS_PATH)?;
        debug!(%url, page = query.page, size = query.size, "GET stocks");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn sync_stocks(&self, limit: u32) -> Result<SyncResponse> {
        let url = self.endpoint(SYNC_PATH)?;
        debug!(%url, limit, "POST stocks sync");

        let response = self
            .client
            .post(url)
            .json(&SyncRequest { limit })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

/// Ensure the base URL ends with `/` so relative joins keep its path
fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{}/", trimmed))?)
    }
}
