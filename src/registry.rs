//! Widget kind registry.
//!
//! An explicit, ordered list of widget kinds, each with a predicate deciding whether
//! it can represent a metadata node. Resolution walks the whole list and keeps the
//! **last** kind whose predicate matched, so kinds registered later override more
//! generic ones registered earlier. Nothing matching yields [`WidgetKind::Raw`].
//!
//! The registry is a plain value built once and handed to the tree builder:
//!
//! ```rust
//! use odin_dashboard::registry::{WidgetKind, WidgetRegistry};
//! use serde_json::json;
//!
//! let registry = WidgetRegistry::standard();
//! let kind = registry.resolve(&json!({"type": "bool", "writeable": true}));
//! assert_eq!(kind, WidgetKind::Button);
//! ```

use std::fmt;

use serde_json::Value;

use crate::layout;
use crate::widgets::{button, label, status_box, text_field};

/// Every kind of node renderer the tree can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Branch composite laying out child nodes.
    Layout,
    /// Toggle for writeable booleans.
    Button,
    /// Coloured indicator for read-only booleans and statuses.
    StatusBox,
    /// Editable field for writeable non-booleans.
    TextField,
    /// Read-only text.
    Label,
    /// Debug fallback printing the raw metadata.
    Raw,
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WidgetKind::Layout => "layout",
            WidgetKind::Button => "button",
            WidgetKind::StatusBox => "status_box",
            WidgetKind::TextField => "text_field",
            WidgetKind::Label => "label",
            WidgetKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Predicate deciding whether a kind can render a metadata node.
pub type Claim = fn(&Value) -> bool;

#[derive(Clone, Copy)]
struct Registration {
    kind: WidgetKind,
    claims: Claim,
}

/// Ordered widget kind registry.
#[derive(Clone, Default)]
pub struct WidgetRegistry {
    entries: Vec<Registration>,
}

impl WidgetRegistry {
    /// Registry with no kinds; everything resolves to [`WidgetKind::Raw`].
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard set.
    ///
    /// `status` leaves satisfy both the label and the status box predicates, so the
    /// status box is registered after the label to win them.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with(WidgetKind::Layout, layout::claims)
            .with(WidgetKind::Button, button::claims)
            .with(WidgetKind::TextField, text_field::claims)
            .with(WidgetKind::Label, label::claims)
            .with(WidgetKind::StatusBox, status_box::claims)
    }

    /// Append a kind; it takes precedence over every kind registered before it.
    #[must_use]
    pub fn with(mut self, kind: WidgetKind, claims: Claim) -> Self {
        self.register(kind, claims);
        self
    }

    /// Append a kind in place.
    pub fn register(&mut self, kind: WidgetKind, claims: Claim) {
        self.entries.push(Registration { kind, claims });
    }

    /// Kind for a metadata node: the last registration whose predicate matches.
    #[must_use]
    pub fn resolve(&self, meta: &Value) -> WidgetKind {
        self.entries
            .iter()
            .filter(|entry| (entry.claims)(meta))
            .last()
            .map_or(WidgetKind::Raw, |entry| entry.kind)
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = WidgetKind> + '_ {
        self.entries.iter().map(|entry| entry.kind)
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standard_selection_is_deterministic() {
        let registry = WidgetRegistry::standard();
        let cases = [
            (json!({"type": "bool", "writeable": true}), WidgetKind::Button),
            (json!({"type": "bool", "writeable": false}), WidgetKind::StatusBox),
            (json!({"type": "status", "writeable": false}), WidgetKind::StatusBox),
            (json!({"type": "float", "writeable": false}), WidgetKind::Label),
            (json!({"type": "float", "writeable": true}), WidgetKind::TextField),
            (json!({"type": "int", "writeable": true, "units": "mA"}), WidgetKind::TextField),
            (json!({"units": "V"}), WidgetKind::Label),
            (json!({"child": {"type": "int"}}), WidgetKind::Layout),
            (json!([{"type": "int"}]), WidgetKind::Layout),
        ];
        for (meta, expected) in cases {
            for _ in 0..3 {
                assert_eq!(registry.resolve(&meta), expected, "metadata {meta}");
            }
        }
    }

    #[test]
    fn status_leaf_matches_label_and_status_box_and_later_wins() {
        let meta = json!({"type": "status", "writeable": false});
        assert!(label::claims(&meta));
        assert!(status_box::claims(&meta));

        let label_last = WidgetRegistry::empty()
            .with(WidgetKind::StatusBox, status_box::claims)
            .with(WidgetKind::Label, label::claims);
        assert_eq!(label_last.resolve(&meta), WidgetKind::Label);

        let status_last = WidgetRegistry::empty()
            .with(WidgetKind::Label, label::claims)
            .with(WidgetKind::StatusBox, status_box::claims);
        assert_eq!(status_last.resolve(&meta), WidgetKind::StatusBox);
    }

    #[test]
    fn unmatched_metadata_falls_back_to_raw() {
        let registry = WidgetRegistry::standard();
        assert_eq!(registry.resolve(&json!(17)), WidgetKind::Raw);
        assert_eq!(WidgetRegistry::empty().resolve(&json!({"type": "int"})), WidgetKind::Raw);
    }

    #[test]
    fn kinds_listed_in_registration_order() {
        let registry = WidgetRegistry::standard();
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec![
                WidgetKind::Layout,
                WidgetKind::Button,
                WidgetKind::TextField,
                WidgetKind::Label,
                WidgetKind::StatusBox,
            ]
        );
    }
}
