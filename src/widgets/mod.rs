//! Leaf widgets.
//!
//! Every leaf of the metadata tree is bound to exactly one widget. A widget renders
//! its markup once, binds to the elements it rendered after the whole tree is
//! mounted, and then applies poll updates with change suppression: an incoming
//! value equal to the last applied one produces no patch at all.
//!
//! | Kind | Claims | Writes |
//! |------|--------|--------|
//! | [`Button`] | `bool`, writeable | negation of the last value |
//! | [`StatusBox`] | `bool`/`status`, read-only | - |
//! | [`TextField`] | non-`bool`, writeable | parsed input |
//! | [`Label`] | non-`bool`, read-only | - |
//! | [`Raw`] | nothing (fallback) | - |

pub mod button;
pub mod label;
pub mod raw;
pub mod status_box;
pub mod text_field;

pub use button::Button;
pub use label::Label;
pub use raw::Raw;
pub use status_box::{StatusBox, StatusIndicator};
pub use text_field::TextField;

use serde::Serialize;
use serde_json::Value;

use crate::dom::{Document, UiEvent};
use crate::error::DashboardResult;
use crate::metadata;
use crate::registry::WidgetKind;

/// Request to write a value to the backend, emitted by an interactive widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteIntent {
    /// Slash-joined parameter path.
    pub path: String,
    /// Bare JSON scalar to send.
    pub value: Value,
}

/// Renderer and live binder for one leaf.
pub trait Widget: Send {
    /// Which registered kind this widget is.
    fn kind(&self) -> WidgetKind;

    /// Produce the widget markup. `binding` is the element id prefix to use.
    fn render(&mut self, binding: &str) -> String;

    /// Look up the rendered elements after mount.
    fn bind(&mut self, binding: &str, doc: &dyn Document) -> DashboardResult<()>;

    /// Apply a polled value, skipping the patch when nothing changed.
    fn apply_update(&mut self, value: &Value, doc: &mut dyn Document);

    /// Element ids whose events should be routed to this widget.
    fn event_targets(&self) -> Vec<String> {
        Vec::new()
    }

    /// Handle a routed event. Interactive kinds return a write for `path`.
    fn on_event(
        &mut self,
        _event: &UiEvent,
        _path: &str,
        _doc: &mut dyn Document,
    ) -> DashboardResult<Option<WriteIntent>> {
        Ok(None)
    }

    /// Last value applied to the display, after rounding.
    fn last_value(&self) -> Option<&Value>;

    /// What the widget currently shows, for inspection.
    fn display_text(&self) -> String;
}

/// Construct the widget for a leaf claimed by `kind`.
///
/// `Layout` never reaches here; branches are built by the tree.
#[must_use]
pub fn build(kind: WidgetKind, meta: &Value) -> Box<dyn Widget> {
    match kind {
        WidgetKind::Button => Box::new(Button::new(meta)),
        WidgetKind::StatusBox => Box::new(StatusBox::new(meta)),
        WidgetKind::TextField => Box::new(TextField::new(meta)),
        WidgetKind::Label => Box::new(Label::new(meta)),
        WidgetKind::Layout | WidgetKind::Raw => Box::new(Raw::new(meta)),
    }
}

/// Round numeric values to `dp` places; other values pass through.
///
/// Widgets compare the text of the rounded value, so raw values that round to the
/// same display are applied once.
#[must_use]
pub fn normalize(value: &Value, dp: Option<usize>) -> Value {
    match (value.as_f64(), dp) {
        (Some(number), Some(dp)) => format!("{number:.dp$}")
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| value.clone(), Value::Number),
        _ => value.clone(),
    }
}

/// Text shown for a value, honoring `dp` for numbers.
#[must_use]
pub fn display_value(value: &Value, dp: Option<usize>) -> String {
    match value {
        Value::Number(number) => match (number.as_f64(), dp) {
            (Some(float), Some(dp)) => format!("{float:.dp$}"),
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "-".to_owned(),
        other => other.to_string(),
    }
}

/// Loose truthiness used for boolean displays.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

/// `title` attribute for the leaf description, with a leading space, or nothing.
pub(crate) fn tooltip(meta: &Value) -> String {
    metadata::string_attr(meta, "description")
        .map(|desc| format!(r#" title="{}""#, crate::dom::escape(desc)))
        .unwrap_or_default()
}

pub(crate) fn require(doc: &dyn Document, id: &str) -> DashboardResult<()> {
    if doc.contains(id) {
        Ok(())
    } else {
        Err(crate::error::DashboardError::MissingElement(id.to_owned()))
    }
}
