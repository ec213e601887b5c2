//! Debug fallback for metadata no registered kind claims.

use serde_json::Value;

use super::{display_value, Widget};
use crate::dom::{escape, Document};
use crate::error::DashboardResult;
use crate::metadata;
use crate::registry::WidgetKind;

/// Inert renderer that prints the metadata as-is: the leaf value for leaves, a JSON
/// dump for anything structured. Never binds, never updates.
#[derive(Debug)]
pub struct Raw {
    meta: Value,
}

impl Raw {
    /// Wrap unclaimed metadata.
    #[must_use]
    pub fn new(meta: &Value) -> Self {
        Self { meta: meta.clone() }
    }

    fn dump(&self) -> String {
        if !metadata::is_leaf(&self.meta) {
            return self.meta.to_string();
        }
        match &self.meta {
            Value::Object(map) => map
                .get("value")
                .map_or_else(|| self.meta.to_string(), |v| display_value(v, None)),
            other => display_value(other, None),
        }
    }
}

impl Widget for Raw {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Raw
    }

    fn render(&mut self, binding: &str) -> String {
        format!(r#"<code class="raw" data-component="{binding}">{}</code>"#, escape(&self.dump()))
    }

    fn bind(&mut self, _binding: &str, _doc: &dyn Document) -> DashboardResult<()> {
        Ok(())
    }

    fn apply_update(&mut self, _value: &Value, _doc: &mut dyn Document) {}

    fn last_value(&self) -> Option<&Value> {
        None
    }

    fn display_text(&self) -> String {
        self.dump()
    }
}
