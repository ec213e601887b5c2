//! Coloured status indicator for boolean and `status` parameters.

use serde_json::Value;

use super::{require, tooltip, Widget};
use crate::dom::Document;
use crate::error::DashboardResult;
use crate::metadata;
use crate::registry::WidgetKind;

/// Class applied for `true` / `"ok"`.
pub const STATUS_OK: &str = "status-ok";
/// Class applied for `"warn"`.
pub const STATUS_WARN: &str = "status-warn";

/// Claims read-only `bool` and `status` leaves.
#[must_use]
pub fn claims(meta: &Value) -> bool {
    meta.is_object()
        && metadata::is_leaf(meta)
        && matches!(metadata::leaf_type(meta), Some("bool" | "status"))
        && !metadata::is_writeable(meta)
}

/// Styling state of a status element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    /// `true` or `"ok"`.
    Ok,
    /// `"warn"`.
    Warn,
    /// Anything else.
    Neutral,
}

impl StatusStyle {
    /// Style for a polled value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(true) => Self::Ok,
            Value::String(s) if s == "ok" => Self::Ok,
            Value::String(s) if s == "warn" => Self::Warn,
            _ => Self::Neutral,
        }
    }
}

/// The element-level status rule shared by [`StatusBox`] and hoisted `overall` headers.
#[derive(Debug, Default)]
pub struct StatusIndicator {
    element: Option<String>,
    last: Option<Value>,
}

impl StatusIndicator {
    /// Indicator not yet attached to an element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to a mounted element.
    pub fn bind(&mut self, element: &str, doc: &dyn Document) -> DashboardResult<()> {
        require(doc, element)?;
        self.element = Some(element.to_owned());
        Ok(())
    }

    /// Whether the indicator is attached.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.element.is_some()
    }

    /// Restyle for `value` unless it equals the last applied one.
    pub fn apply(&mut self, value: &Value, doc: &mut dyn Document) {
        let Some(element) = &self.element else { return };
        if self.last.as_ref() == Some(value) {
            return;
        }
        doc.remove_class(element, STATUS_OK);
        doc.remove_class(element, STATUS_WARN);
        match StatusStyle::of(value) {
            StatusStyle::Ok => doc.add_class(element, STATUS_OK),
            StatusStyle::Warn => doc.add_class(element, STATUS_WARN),
            StatusStyle::Neutral => {}
        }
        self.last = Some(value.clone());
    }

    /// Last applied value.
    #[must_use]
    pub fn last(&self) -> Option<&Value> {
        self.last.as_ref()
    }

    /// Current style.
    #[must_use]
    pub fn style(&self) -> StatusStyle {
        self.last.as_ref().map_or(StatusStyle::Neutral, StatusStyle::of)
    }
}

/// Status box widget.
#[derive(Debug)]
pub struct StatusBox {
    meta: Value,
    indicator: StatusIndicator,
}

impl StatusBox {
    /// Create a status box for leaf metadata.
    #[must_use]
    pub fn new(meta: &Value) -> Self {
        Self {
            meta: meta.clone(),
            indicator: StatusIndicator::new(),
        }
    }
}

impl Widget for StatusBox {
    fn kind(&self) -> WidgetKind {
        WidgetKind::StatusBox
    }

    fn render(&mut self, binding: &str) -> String {
        format!(r#"<div class="status" id="{binding}"{}></div>"#, tooltip(&self.meta))
    }

    fn bind(&mut self, binding: &str, doc: &dyn Document) -> DashboardResult<()> {
        self.indicator.bind(binding, doc)
    }

    fn apply_update(&mut self, value: &Value, doc: &mut dyn Document) {
        self.indicator.apply(value, doc);
    }

    fn last_value(&self) -> Option<&Value> {
        self.indicator.last()
    }

    fn display_text(&self) -> String {
        match self.indicator.style() {
            StatusStyle::Ok => "ok",
            StatusStyle::Warn => "warn",
            StatusStyle::Neutral => "-",
        }
        .to_owned()
    }
}
