//! Document abstraction the tree renders into.
//!
//! The engine never touches a real browser DOM. A tree produces HTML markup once,
//! mounts it into a [`Document`], and afterwards expresses every display change as a
//! [`Patch`] addressed by element id. [`PatchDocument`] is the in-memory
//! implementation: it indexes the mounted markup by `id`, keeps each element's text,
//! classes, placeholder and input value current, and queues the patches so they can
//! be streamed to a browser shim as JSON lines.
//!
//! User interaction comes back the other way as [`UiEvent`]s naming the element
//! that was clicked or typed into.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static OPEN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9]*)((?:[^>"]|"[^"]*")*)>"#).expect("Invalid tag regex")
});
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z-]+)="([^"]*)""#).expect("Invalid attribute regex")
});

/// A single display mutation addressed by element id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Patch {
    SetText { id: String, text: String },
    AddClass { id: String, class: String },
    RemoveClass { id: String, class: String },
    SetPlaceholder { id: String, text: String },
    SetInput { id: String, value: String },
}

impl Patch {
    /// Element the patch targets.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Patch::SetText { id, .. }
            | Patch::AddClass { id, .. }
            | Patch::RemoveClass { id, .. }
            | Patch::SetPlaceholder { id, .. }
            | Patch::SetInput { id, .. } => id,
        }
    }
}

/// Interaction reported by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    /// A button or control was clicked.
    Click {
        /// Element id of the clicked control.
        target: String,
    },
    /// The content of a text input changed.
    Input {
        /// Element id of the input.
        target: String,
        /// Full current content of the input.
        value: String,
    },
}

impl UiEvent {
    /// Element the event originated from.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            UiEvent::Click { target } | UiEvent::Input { target, .. } => target,
        }
    }
}

/// A mounted container the tree can look elements up in and patch.
pub trait Document: Send {
    /// Attach rendered markup. Replaces anything mounted before.
    fn mount(&mut self, markup: &str);

    /// Whether an element with this id exists.
    fn contains(&self, id: &str) -> bool;

    /// Apply one display mutation.
    fn apply(&mut self, patch: Patch);

    /// Replace the text content of an element.
    fn set_text(&mut self, id: &str, text: &str) {
        self.apply(Patch::SetText {
            id: id.to_owned(),
            text: text.to_owned(),
        });
    }

    /// Add a class token to an element.
    fn add_class(&mut self, id: &str, class: &str) {
        self.apply(Patch::AddClass {
            id: id.to_owned(),
            class: class.to_owned(),
        });
    }

    /// Remove a class token from an element.
    fn remove_class(&mut self, id: &str, class: &str) {
        self.apply(Patch::RemoveClass {
            id: id.to_owned(),
            class: class.to_owned(),
        });
    }

    /// Replace the placeholder of an input.
    fn set_placeholder(&mut self, id: &str, text: &str) {
        self.apply(Patch::SetPlaceholder {
            id: id.to_owned(),
            text: text.to_owned(),
        });
    }

    /// Replace the editable content of an input.
    fn set_input(&mut self, id: &str, value: &str) {
        self.apply(Patch::SetInput {
            id: id.to_owned(),
            value: value.to_owned(),
        });
    }
}

/// Current state of one element with an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written in the markup.
    pub tag: String,
    /// Text content up to the first child tag.
    pub text: String,
    /// Class tokens, in order.
    pub classes: Vec<String>,
    /// Input placeholder.
    pub placeholder: String,
    /// Input content.
    pub input: String,
}

/// In-memory document that records every patch it receives.
#[derive(Debug, Default)]
pub struct PatchDocument {
    markup: String,
    elements: HashMap<String, Element>,
    pending: Vec<Patch>,
    mutations: u64,
}

impl PatchDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup as mounted, before any patches.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Look up an element by id.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Current text of an element.
    #[must_use]
    pub fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|el| el.text.as_str())
    }

    /// Whether an element currently carries a class token.
    #[must_use]
    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.elements
            .get(id)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    /// Current placeholder of an input.
    #[must_use]
    pub fn placeholder(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|el| el.placeholder.as_str())
    }

    /// Current content of an input.
    #[must_use]
    pub fn input(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|el| el.input.as_str())
    }

    /// Total patches applied since creation.
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// Patches applied since the last drain.
    #[must_use]
    pub fn pending(&self) -> &[Patch] {
        &self.pending
    }

    /// Take the patches applied since the last drain.
    pub fn drain(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.pending)
    }

    fn index(markup: &str) -> HashMap<String, Element> {
        let mut elements = HashMap::new();
        for tag in OPEN_TAG.captures_iter(markup) {
            let Some(whole) = tag.get(0) else { continue };
            let mut element = Element {
                tag: tag[1].to_owned(),
                ..Element::default()
            };
            let mut id = None;
            for attr in ATTRIBUTE.captures_iter(&tag[2]) {
                match &attr[1] {
                    "id" => id = Some(attr[2].to_owned()),
                    "class" => {
                        element.classes = attr[2].split_whitespace().map(str::to_owned).collect();
                    }
                    "placeholder" => element.placeholder = attr[2].to_owned(),
                    "value" => element.input = attr[2].to_owned(),
                    _ => {}
                }
            }
            let Some(id) = id else { continue };
            let rest = &markup[whole.end()..];
            let text_end = rest.find('<').unwrap_or(rest.len());
            element.text = unescape(rest[..text_end].trim());
            elements.insert(id, element);
        }
        elements
    }
}

impl Document for PatchDocument {
    fn mount(&mut self, markup: &str) {
        self.markup = markup.to_owned();
        self.elements = Self::index(markup);
    }

    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn apply(&mut self, patch: Patch) {
        let Some(element) = self.elements.get_mut(patch.target()) else {
            tracing::trace!(target_id = patch.target(), "dropping patch for unknown element");
            return;
        };
        match &patch {
            Patch::SetText { text, .. } => element.text.clone_from(text),
            Patch::AddClass { class, .. } => {
                if !element.classes.contains(class) {
                    element.classes.push(class.clone());
                }
            }
            Patch::RemoveClass { class, .. } => element.classes.retain(|c| c != class),
            Patch::SetPlaceholder { text, .. } => element.placeholder.clone_from(text),
            Patch::SetInput { value, .. } => element.input.clone_from(value),
        }
        self.mutations += 1;
        self.pending.push(patch);
    }
}

/// Escape text for inclusion in markup content or a double-quoted attribute.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
