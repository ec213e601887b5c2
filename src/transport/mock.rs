//! In-memory transport.
//!
//! Holds metadata and values per adapter, applies writes to the stored values the
//! way a server would, and records them for inspection. Failures can be scripted per
//! call so poll and write error paths can be exercised without a server.
//!
//! # Fixture format
//!
//! ```json
//! {
//!   "qem": {
//!     "metadata": { "voltage": { "type": "float", "writeable": false, "units": "V" } },
//!     "values":   { "voltage": 3.3 }
//!   }
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::Transport;
use crate::error::{DashboardError, DashboardResult};
use crate::metadata;

/// One adapter of a fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockAdapter {
    /// Metadata tree served for the adapter.
    pub metadata: Value,
    /// Value tree served for the adapter.
    #[serde(default)]
    pub values: Value,
}

/// A write the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    /// Adapter written to.
    pub adapter: String,
    /// Parameter path.
    pub path: String,
    /// Value sent.
    pub value: Value,
}

/// Scriptable in-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    adapters: Arc<RwLock<IndexMap<String, MockAdapter>>>,
    writes: Arc<RwLock<Vec<RecordedWrite>>>,
    failing_fetches: Arc<RwLock<HashSet<usize>>>,
    write_error: Arc<RwLock<Option<String>>>,
    value_fetches: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend serving the given adapters.
    #[must_use]
    pub fn with_adapters(adapters: IndexMap<String, MockAdapter>) -> Self {
        Self {
            adapters: Arc::new(RwLock::new(adapters)),
            ..Self::default()
        }
    }

    /// Parse a fixture document.
    pub fn from_json(fixture: &str) -> DashboardResult<Self> {
        Ok(Self::with_adapters(serde_json::from_str(fixture)?))
    }

    /// Load a fixture file.
    pub fn from_fixture<P: AsRef<Path>>(path: P) -> DashboardResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Adapter names in fixture order.
    pub async fn adapter_names(&self) -> Vec<String> {
        self.adapters.read().await.keys().cloned().collect()
    }

    /// Add or replace an adapter.
    pub async fn insert(&self, name: &str, metadata: Value, values: Value) {
        self.adapters
            .write()
            .await
            .insert(name.to_string(), MockAdapter { metadata, values });
    }

    /// Replace the values served for `adapter`.
    pub async fn set_values(&self, adapter: &str, values: Value) {
        if let Some(entry) = self.adapters.write().await.get_mut(adapter) {
            entry.values = values;
        }
    }

    /// Make the `n`-th value fetch (1-based, counted across adapters) fail.
    pub async fn fail_value_fetch(&self, n: usize) {
        self.failing_fetches.write().await.insert(n);
    }

    /// Make every write fail with `message`, or succeed again with `None`.
    pub async fn fail_writes(&self, message: Option<&str>) {
        *self.write_error.write().await = message.map(str::to_string);
    }

    /// Number of value fetches attempted so far.
    #[must_use]
    pub fn value_fetch_count(&self) -> usize {
        self.value_fetches.load(Ordering::SeqCst)
    }

    /// Writes received so far, including failed ones.
    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.read().await.clone()
    }

    fn unknown(adapter: &str) -> DashboardError {
        DashboardError::Transport(format!("Invalid path: {adapter}"))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_metadata(&self, adapter: &str) -> DashboardResult<Value> {
        self.adapters
            .read()
            .await
            .get(adapter)
            .map(|entry| entry.metadata.clone())
            .ok_or_else(|| Self::unknown(adapter))
    }

    async fn fetch_values(&self, adapter: &str) -> DashboardResult<Value> {
        let n = self.value_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_fetches.read().await.contains(&n) {
            debug!(adapter, fetch = n, "Scripted value fetch failure");
            return Err(DashboardError::Transport(format!("Scripted failure of fetch {n}")));
        }
        self.adapters
            .read()
            .await
            .get(adapter)
            .map(|entry| entry.values.clone())
            .ok_or_else(|| Self::unknown(adapter))
    }

    async fn write_value(&self, adapter: &str, path: &str, value: &Value) -> DashboardResult<()> {
        self.writes.write().await.push(RecordedWrite {
            adapter: adapter.to_string(),
            path: path.to_string(),
            value: value.clone(),
        });
        if let Some(message) = self.write_error.read().await.clone() {
            return Err(DashboardError::Transport(message));
        }

        let mut adapters = self.adapters.write().await;
        let entry = adapters.get_mut(adapter).ok_or_else(|| Self::unknown(adapter))?;
        let target = path
            .split('/')
            .filter(|key| !key.is_empty())
            .try_fold(&mut entry.values, |node, key| metadata::child_mut(node, key))
            .ok_or_else(|| DashboardError::Transport(format!("Invalid path: {path}")))?;
        *target = value.clone();
        Ok(())
    }
}
