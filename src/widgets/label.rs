//! Read-only text display for numeric and string parameters.

use serde_json::Value;

use super::{display_value, normalize, require, tooltip, Widget};
use crate::dom::{escape, Document};
use crate::error::DashboardResult;
use crate::metadata;
use crate::registry::WidgetKind;

/// Claims read-only leaves that are not booleans, including arrays of scalars.
#[must_use]
pub fn claims(meta: &Value) -> bool {
    (meta.is_object() || meta.is_array())
        && metadata::is_leaf(meta)
        && metadata::leaf_type(meta) != Some("bool")
        && !metadata::is_writeable(meta)
}

/// Text label showing the last polled value, optionally rounded and with units.
#[derive(Debug)]
pub struct Label {
    meta: Value,
    dp: Option<usize>,
    units: Option<String>,
    binding: Option<String>,
    last: Option<Value>,
    shown: Option<String>,
}

impl Label {
    /// Create a label for leaf metadata.
    #[must_use]
    pub fn new(meta: &Value) -> Self {
        Self {
            meta: meta.clone(),
            dp: metadata::decimal_places(meta),
            units: metadata::string_attr(meta, "units").map(str::to_owned),
            binding: None,
            last: None,
            shown: None,
        }
    }
}

impl Widget for Label {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Label
    }

    fn render(&mut self, binding: &str) -> String {
        let mut markup = format!(r#"<span id="{binding}"{}>-</span>"#, tooltip(&self.meta));
        if let Some(units) = &self.units {
            markup.push_str(&format!(r#" <span class="units">{}</span>"#, escape(units)));
        }
        markup
    }

    fn bind(&mut self, binding: &str, doc: &dyn Document) -> DashboardResult<()> {
        require(doc, binding)?;
        self.binding = Some(binding.to_owned());
        Ok(())
    }

    fn apply_update(&mut self, value: &Value, doc: &mut dyn Document) {
        let Some(binding) = &self.binding else { return };
        let value = normalize(value, self.dp);
        let text = display_value(&value, self.dp);
        if self.shown.as_deref() == Some(text.as_str()) {
            return;
        }
        doc.set_text(binding, &text);
        self.shown = Some(text);
        self.last = Some(value);
    }

    fn last_value(&self) -> Option<&Value> {
        self.last.as_ref()
    }

    fn display_text(&self) -> String {
        let value = self
            .last
            .as_ref()
            .map_or_else(|| "-".to_owned(), |v| display_value(v, self.dp));
        match &self.units {
            Some(units) => format!("{value} {units}"),
            None => value,
        }
    }
}
