//! Backend transports.
//!
//! The dashboard only needs three operations from a backend: the metadata tree of
//! an adapter (fetched once), its current values (fetched every poll tick), and a
//! write of a single scalar to a parameter path.
//!
//! - [`HttpTransport`] talks to an odin-control server over its REST API.
//! - [`MockTransport`] keeps everything in memory, with scriptable failures.

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DashboardResult;

/// Backend access for the dashboard.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Metadata tree for `adapter`.
    async fn fetch_metadata(&self, adapter: &str) -> DashboardResult<Value>;

    /// Current value tree for `adapter`.
    async fn fetch_values(&self, adapter: &str) -> DashboardResult<Value>;

    /// Write `value` to the parameter at `path`.
    async fn write_value(&self, adapter: &str, path: &str, value: &Value) -> DashboardResult<()>;
}
