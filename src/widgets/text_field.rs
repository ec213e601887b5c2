//! Editable field with a "Set" button for writeable non-boolean parameters.
//!
//! The input's placeholder shows the last server value; what the operator types is
//! held separately as pending input and only sent when "Set" is clicked. The input
//! is cleared after every submit, whether or not a write was produced.

use serde_json::{Number, Value};

use super::{display_value, normalize, require, tooltip, Widget, WriteIntent};
use crate::dom::{escape, Document, UiEvent};
use crate::error::{DashboardError, DashboardResult};
use crate::metadata;
use crate::registry::WidgetKind;

const ERROR_CLASS: &str = "has-error";

/// Claims writeable leaves that are not booleans.
#[must_use]
pub fn claims(meta: &Value) -> bool {
    meta.is_object()
        && metadata::is_leaf(meta)
        && metadata::leaf_type(meta) != Some("bool")
        && metadata::is_writeable(meta)
}

/// Text input bound to one writeable parameter.
#[derive(Debug)]
pub struct TextField {
    meta: Value,
    numeric: bool,
    dp: Option<usize>,
    units: Option<String>,
    binding: Option<String>,
    last: Option<Value>,
    shown: Option<String>,
    pending: String,
}

impl TextField {
    /// Create a field for leaf metadata.
    #[must_use]
    pub fn new(meta: &Value) -> Self {
        Self {
            meta: meta.clone(),
            numeric: matches!(metadata::leaf_type(meta), Some("int" | "float")),
            dp: metadata::decimal_places(meta),
            units: metadata::string_attr(meta, "units").map(str::to_owned),
            binding: None,
            last: None,
            shown: None,
            pending: String::new(),
        }
    }

    /// Text typed but not yet submitted.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    fn input_id(binding: &str) -> String {
        format!("{binding}-input")
    }

    fn button_id(binding: &str) -> String {
        format!("{binding}-button")
    }

    fn group_id(binding: &str) -> String {
        format!("{binding}-group")
    }

    /// Convert the pending text into the value to send.
    #[allow(clippy::cast_possible_truncation)]
    fn parse(&self, path: &str) -> DashboardResult<Value> {
        if !self.numeric {
            return Ok(Value::String(self.pending.clone()));
        }
        let input = self.pending.trim();
        let invalid = || DashboardError::InvalidInput {
            path: path.to_owned(),
            input: self.pending.clone(),
        };
        let number = input.parse::<f64>().map_err(|_| invalid())?;
        if !number.is_finite() {
            return Err(invalid());
        }
        // Integral values go out as JSON integers, matching what a browser would send.
        if number.fract() == 0.0 && number.abs() < 9.0e15 {
            return Ok(Value::Number(Number::from(number as i64)));
        }
        Number::from_f64(number).map(Value::Number).ok_or_else(invalid)
    }

    fn submit(&mut self, path: &str, doc: &mut dyn Document) -> DashboardResult<Option<WriteIntent>> {
        let Some(binding) = self.binding.clone() else {
            return Ok(None);
        };
        let parsed = self.parse(path);
        self.pending.clear();
        doc.set_input(&Self::input_id(&binding), "");
        match parsed {
            Ok(value) => {
                doc.remove_class(&Self::group_id(&binding), ERROR_CLASS);
                Ok(Some(WriteIntent {
                    path: path.to_owned(),
                    value,
                }))
            }
            Err(err) => {
                doc.add_class(&Self::group_id(&binding), ERROR_CLASS);
                Err(err)
            }
        }
    }
}

impl Widget for TextField {
    fn kind(&self) -> WidgetKind {
        WidgetKind::TextField
    }

    fn render(&mut self, binding: &str) -> String {
        let align = if self.numeric { " text-right" } else { "" };
        let mut markup = format!(
            r#"<div class="input-group" id="{group}"{title}>
    <input class="form-control{align}" id="{input}" type="text" aria-label="Value" placeholder=""/>"#,
            group = Self::group_id(binding),
            title = tooltip(&self.meta),
            input = Self::input_id(binding),
        );
        if let Some(units) = &self.units {
            markup.push_str(&format!(
                "\n    <span class=\"input-group-addon\">{}</span>",
                escape(units)
            ));
        }
        markup.push_str(&format!(
            r#"
    <div class="input-group-btn">
        <button class="btn btn-default" id="{}" type="button">Set</button>
    </div>
</div>"#,
            Self::button_id(binding)
        ));
        markup
    }

    fn bind(&mut self, binding: &str, doc: &dyn Document) -> DashboardResult<()> {
        require(doc, &Self::input_id(binding))?;
        require(doc, &Self::button_id(binding))?;
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
        doc.set_placeholder(&Self::input_id(binding), &text);
        self.shown = Some(text);
        self.last = Some(value);
    }

    fn event_targets(&self) -> Vec<String> {
        self.binding
            .iter()
            .flat_map(|b| [Self::input_id(b), Self::button_id(b)])
            .collect()
    }

    fn on_event(
        &mut self,
        event: &UiEvent,
        path: &str,
        doc: &mut dyn Document,
    ) -> DashboardResult<Option<WriteIntent>> {
        let Some(binding) = self.binding.clone() else {
            return Ok(None);
        };
        match event {
            UiEvent::Input { target, value } if *target == Self::input_id(&binding) => {
                self.pending.clone_from(value);
                Ok(None)
            }
            UiEvent::Click { target } if *target == Self::button_id(&binding) => {
                self.submit(path, doc)
            }
            _ => Ok(None),
        }
    }

    fn last_value(&self) -> Option<&Value> {
        self.last.as_ref()
    }

    fn display_text(&self) -> String {
        let value = self
            .last
            .as_ref()
            .map_or_else(String::new, |v| display_value(v, self.dp));
        match &self.units {
            Some(units) => format!("{value} {units}"),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::PatchDocument;
    use serde_json::json;

    fn mounted(meta: Value) -> (TextField, PatchDocument) {
        let mut field = TextField::new(&meta);
        let mut doc = PatchDocument::new();
        doc.mount(&field.render("component-9"));
        field.bind("component-9", &doc).unwrap();
        (field, doc)
    }

    fn type_text(field: &mut TextField, doc: &mut PatchDocument, text: &str) {
        let event = UiEvent::Input {
            target: "component-9-input".into(),
            value: text.into(),
        };
        field.on_event(&event, "supply/voltage", doc).unwrap();
    }

    fn click_set(field: &mut TextField, doc: &mut PatchDocument) -> DashboardResult<Option<WriteIntent>> {
        let event = UiEvent::Click {
            target: "component-9-button".into(),
        };
        field.on_event(&event, "supply/voltage", doc)
    }

    #[test]
    fn claims_writeable_non_bools() {
        assert!(claims(&json!({"type": "float", "writeable": true})));
        assert!(claims(&json!({"type": "str", "writeable": true})));
        assert!(!claims(&json!({"type": "bool", "writeable": true})));
        assert!(!claims(&json!({"type": "float", "writeable": false})));
    }

    #[test]
    fn update_sets_placeholder_not_input() {
        let (mut field, mut doc) = mounted(json!({"type": "float", "writeable": true, "dp": 2}));
        type_text(&mut field, &mut doc, "5");
        field.apply_update(&json!(3.14159), &mut doc);
        assert_eq!(doc.placeholder("component-9-input"), Some("3.14"));
        assert_eq!(field.pending(), "5");
        field.apply_update(&json!(3.141), &mut doc);
        assert_eq!(doc.mutation_count(), 1);
    }

    #[test]
    fn set_parses_numeric_input_and_clears() {
        let (mut field, mut doc) = mounted(json!({"type": "float", "writeable": true}));
        type_text(&mut field, &mut doc, " 2.5 ");
        let intent = click_set(&mut field, &mut doc).unwrap().unwrap();
        assert_eq!(intent.path, "supply/voltage");
        assert_eq!(intent.value, json!(2.5));
        assert_eq!(field.pending(), "");
        assert_eq!(doc.input("component-9-input"), Some(""));
    }

    #[test]
    fn integral_input_is_sent_as_integer() {
        let (mut field, mut doc) = mounted(json!({"type": "int", "writeable": true}));
        type_text(&mut field, &mut doc, "12");
        let intent = click_set(&mut field, &mut doc).unwrap().unwrap();
        assert_eq!(intent.value, json!(12));
        assert_eq!(serde_json::to_string(&intent.value).unwrap(), "12");
    }

    #[test]
    fn string_fields_submit_raw_text() {
        let (mut field, mut doc) = mounted(json!({"type": "str", "writeable": true}));
        type_text(&mut field, &mut doc, "run 1");
        let intent = click_set(&mut field, &mut doc).unwrap().unwrap();
        assert_eq!(intent.value, json!("run 1"));
    }

    #[test]
    fn non_numeric_input_is_rejected_locally() {
        let (mut field, mut doc) = mounted(json!({"type": "float", "writeable": true}));
        type_text(&mut field, &mut doc, "abc");
        let err = click_set(&mut field, &mut doc).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidInput { .. }));
        assert!(doc.has_class("component-9-group", "has-error"));
        assert_eq!(field.pending(), "");

        type_text(&mut field, &mut doc, "1.5");
        assert!(click_set(&mut field, &mut doc).unwrap().is_some());
        assert!(!doc.has_class("component-9-group", "has-error"));
    }
}
