//! odin-control REST transport.
//!
//! ```text
//! GET {base}/api/{version}/{adapter}/         Accept: application/json;metadata=true
//! GET {base}/api/{version}/{adapter}/         Accept: application/json
//! PUT {base}/api/{version}/{adapter}/{path}   body: bare JSON value
//! ```
//!
//! Non-2xx responses are errors carrying the `"error"` field of the response body
//! when the server sent one, else the HTTP status.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use super::Transport;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};

const METADATA_ACCEPT: &str = "application/json;metadata=true";
const VALUES_ACCEPT: &str = "application/json";

/// HTTP client for one odin-control server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_root: Url,
}

impl HttpTransport {
    /// Client for `base` (server root) and API `version`.
    pub fn new(base: &Url, version: &str, timeout: Duration) -> DashboardResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let api_root = base
            .join(&format!("api/{version}/"))
            .map_err(|e| DashboardError::Configuration(format!("Invalid API root: {e}")))?;
        Ok(Self { client, api_root })
    }

    /// Client configured from the `[server]` section.
    pub fn from_config(config: &DashboardConfig) -> DashboardResult<Self> {
        Self::new(
            &config.base_url()?,
            &config.server.api_version,
            config.request_timeout(),
        )
    }

    /// URL of `path` under `adapter`; an empty path addresses the adapter root.
    pub fn url(&self, adapter: &str, path: &str) -> DashboardResult<Url> {
        self.api_root
            .join(&format!("{adapter}/{path}"))
            .map_err(|e| DashboardError::Transport(format!("Invalid URL for '{adapter}/{path}': {e}")))
    }

    async fn get(&self, adapter: &str, accept: &str) -> DashboardResult<Value> {
        let url = self.url(adapter, "")?;
        trace!(%url, accept, "GET");
        let response = self.client.get(url).header(ACCEPT, accept).send().await?;
        Ok(check(response).await?.json::<Value>().await?)
    }
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn check(response: Response) -> DashboardResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DashboardError::Transport(server_message(&body).unwrap_or_else(|| status.to_string())))
}

/// The `"error"` field of a JSON error body.
pub fn server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("error")? {
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_metadata(&self, adapter: &str) -> DashboardResult<Value> {
        debug!(adapter, "Fetching metadata");
        self.get(adapter, METADATA_ACCEPT).await
    }

    async fn fetch_values(&self, adapter: &str) -> DashboardResult<Value> {
        self.get(adapter, VALUES_ACCEPT).await
    }

    async fn write_value(&self, adapter: &str, path: &str, value: &Value) -> DashboardResult<()> {
        let url = self.url(adapter, path)?;
        debug!(adapter, path, %value, "PUT");
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, VALUES_ACCEPT)
            .body(serde_json::to_vec(value)?)
            .send()
            .await?;
        check(response).await.map(drop)
    }
}
