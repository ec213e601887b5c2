//! Custom error types for the dashboard.
//!
//! This module defines `DashboardError`, the single error type shared by the tree
//! builder, the transports and the application orchestrator. Using `thiserror`, the
//! underlying library errors are wrapped with `#[from]` so `?` works throughout.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps `figment` errors raised while loading the configuration file
//!   or environment overrides.
//! - **`Configuration`**: Semantic configuration problems found by validation
//!   (unknown log level, empty adapter list, ...).
//! - **`Transport`** / **`Http`**: Failures talking to the backend. `Transport` carries
//!   the message reported by the server (the `"error"` field of its JSON body).
//! - **`MissingElement`**: A widget could not find its element in the mounted document.
//! - **`InvalidInput`**: Operator input that cannot be sent, such as text typed into a
//!   numeric field.
//!
//! None of these are fatal to a running dashboard except a failed initial metadata
//! fetch, which keeps that adapter's tree from being built.

use thiserror::Error;

/// Convenience alias for results using the dashboard error type.
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Transport(String),

    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    #[error("Element '{0}' not found in document")]
    MissingElement(String),

    #[error("Tree is already mounted")]
    AlreadyMounted,

    #[error("Tree has not been mounted")]
    NotMounted,

    #[error("Invalid input '{input}' for numeric parameter '{path}'")]
    InvalidInput { path: String, input: String },
}

impl DashboardError {
    /// Whether the poll loop and the tree can carry on after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DashboardError::Config(_) | DashboardError::Configuration(_) | DashboardError::AlreadyMounted
        )
    }
}
