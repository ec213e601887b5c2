//! # Odin Dashboard Library
//!
//! A metadata-driven monitoring and control dashboard for odin-control style
//! parameter trees. Instead of hand-authoring a page per device, the dashboard asks
//! each backend adapter for its metadata tree once, compiles that tree into nested
//! layouts and widgets, and then keeps every widget live by polling the adapter's
//! values.
//!
//! ## Crate Structure
//!
//! - **`metadata`**: Pure classification of metadata nodes (leaf or branch, list
//!   shaped or not, display names, subtree height).
//! - **`registry`**: The ordered `WidgetRegistry` deciding which widget kind renders a
//!   node; the last matching kind wins.
//! - **`widgets`**: Leaf widgets (`Label`, `StatusBox`, `Button`, `TextField`, and the
//!   `Raw` fallback) with change-suppressed updates.
//! - **`layout`**: Branch layout: display mode inference, rendering, collapse toggles
//!   and update fan-out.
//! - **`component`** / **`tree`**: The component tree mirroring one adapter's metadata,
//!   with path assignment, mounting and event routing.
//! - **`dom`**: The `Document` abstraction widgets render into, and the in-memory
//!   `PatchDocument` that records every change as a `Patch`.
//! - **`transport`**: The `Transport` trait with the odin-control HTTP client and an
//!   in-memory mock.
//! - **`app`**: The `App` orchestrator: one page and poll loop per adapter, writes and
//!   the error banner.
//! - **`banner`**: Transient error banner state.
//! - **`config`** / **`logging`**: Figment configuration and tracing setup.
//! - **`error`**: The `DashboardError` type shared by all of the above.

pub mod app;
pub mod banner;
pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod layout;
pub mod logging;
pub mod metadata;
pub mod registry;
pub mod transport;
pub mod tree;
pub mod widgets;

pub use app::App;
pub use error::{DashboardError, DashboardResult};
pub use registry::{WidgetKind, WidgetRegistry};
pub use tree::Tree;
