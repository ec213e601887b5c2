//! Toggle button for writeable boolean parameters.

use serde_json::Value;

use super::{require, tooltip, truthy, Widget, WriteIntent};
use crate::dom::{Document, UiEvent};
use crate::error::DashboardResult;
use crate::metadata;
use crate::registry::WidgetKind;

const ON_CLASS: &str = "btn-success";
const OFF_CLASS: &str = "btn-danger";
const ON_LABEL: &str = "Disable";
const OFF_LABEL: &str = "Enable";

/// Claims writeable `bool` leaves.
#[must_use]
pub fn claims(meta: &Value) -> bool {
    meta.is_object()
        && metadata::is_leaf(meta)
        && metadata::leaf_type(meta) == Some("bool")
        && metadata::is_writeable(meta)
}

/// Button whose style and label mirror the last server value. Clicking writes the
/// negation of that value.
#[derive(Debug)]
pub struct Button {
    meta: Value,
    binding: Option<String>,
    last: Value,
}

impl Button {
    /// Create a button for leaf metadata. Starts in the Off state.
    #[must_use]
    pub fn new(meta: &Value) -> Self {
        Self {
            meta: meta.clone(),
            binding: None,
            last: Value::Bool(false),
        }
    }

    fn is_on(&self) -> bool {
        truthy(&self.last)
    }
}

impl Widget for Button {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Button
    }

    fn render(&mut self, binding: &str) -> String {
        format!(
            r#"<button id="{binding}" type="button" class="btn btn-toggle {OFF_CLASS}"{}>{OFF_LABEL}</button>"#,
            tooltip(&self.meta)
        )
    }

    fn bind(&mut self, binding: &str, doc: &dyn Document) -> DashboardResult<()> {
        require(doc, binding)?;
        self.binding = Some(binding.to_owned());
        Ok(())
    }

    fn apply_update(&mut self, value: &Value, doc: &mut dyn Document) {
        let Some(binding) = &self.binding else { return };
        if &self.last == value {
            return;
        }
        if truthy(value) {
            doc.remove_class(binding, OFF_CLASS);
            doc.add_class(binding, ON_CLASS);
            doc.set_text(binding, ON_LABEL);
        } else {
            doc.remove_class(binding, ON_CLASS);
            doc.add_class(binding, OFF_CLASS);
            doc.set_text(binding, OFF_LABEL);
        }
        self.last = value.clone();
    }

    fn event_targets(&self) -> Vec<String> {
        self.binding.iter().cloned().collect()
    }

    fn on_event(
        &mut self,
        event: &UiEvent,
        path: &str,
        _doc: &mut dyn Document,
    ) -> DashboardResult<Option<WriteIntent>> {
        match event {
            UiEvent::Click { .. } => Ok(Some(WriteIntent {
                path: path.to_owned(),
                value: Value::Bool(!self.is_on()),
            })),
            UiEvent::Input { .. } => Ok(None),
        }
    }

    fn last_value(&self) -> Option<&Value> {
        Some(&self.last)
    }

    fn display_text(&self) -> String {
        if self.is_on() { ON_LABEL } else { OFF_LABEL }.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::PatchDocument;
    use serde_json::json;

    fn mounted() -> (Button, PatchDocument) {
        let mut button = Button::new(&json!({"type": "bool", "writeable": true}));
        let mut doc = PatchDocument::new();
        doc.mount(&button.render("component-4"));
        button.bind("component-4", &doc).unwrap();
        (button, doc)
    }

    fn click() -> UiEvent {
        UiEvent::Click {
            target: "component-4".into(),
        }
    }

    #[test]
    fn claims_writeable_bools_only() {
        assert!(claims(&json!({"type": "bool", "writeable": true})));
        assert!(!claims(&json!({"type": "bool", "writeable": false})));
        assert!(!claims(&json!({"type": "int", "writeable": true})));
    }

    #[test]
    fn click_writes_negation_of_last_value() {
        let (mut button, mut doc) = mounted();
        let intent = button.on_event(&click(), "quad/0/enable", &mut doc).unwrap();
        assert_eq!(
            intent,
            Some(WriteIntent {
                path: "quad/0/enable".into(),
                value: json!(true)
            })
        );

        button.apply_update(&json!(true), &mut doc);
        let intent = button.on_event(&click(), "quad/0/enable", &mut doc).unwrap();
        assert_eq!(intent.map(|i| i.value), Some(json!(false)));
    }

    #[test]
    fn click_does_not_change_display() {
        let (mut button, mut doc) = mounted();
        button.on_event(&click(), "enable", &mut doc).unwrap();
        assert_eq!(doc.mutation_count(), 0);
        assert_eq!(doc.text("component-4"), Some("Enable"));
    }

    #[test]
    fn on_and_off_classes_are_swapped() {
        let (mut button, mut doc) = mounted();

        button.apply_update(&json!(true), &mut doc);
        assert!(doc.has_class("component-4", "btn-success"));
        assert!(!doc.has_class("component-4", "btn-danger"));
        assert_eq!(doc.text("component-4"), Some("Disable"));

        button.apply_update(&json!(false), &mut doc);
        assert!(doc.has_class("component-4", "btn-danger"));
        assert!(!doc.has_class("component-4", "btn-success"));
        assert_eq!(button.display_text(), "Enable");
    }

    #[test]
    fn initial_false_is_suppressed() {
        let (mut button, mut doc) = mounted();
        button.apply_update(&json!(false), &mut doc);
        assert_eq!(doc.mutation_count(), 0);
        button.apply_update(&json!(true), &mut doc);
        button.apply_update(&json!(true), &mut doc);
        assert_eq!(doc.mutation_count(), 3);
    }
}
