//! Component tree nodes.
//!
//! One [`ComponentNode`] exists per metadata node. The tree is built once from the
//! adapter metadata, mirrors its shape exactly (non-reserved keys, metadata order,
//! every depth), and is never restructured afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::dom::{Document, UiEvent};
use crate::error::DashboardResult;
use crate::layout::{Frame, LayoutNode, Placement};
use crate::metadata;
use crate::registry::{WidgetKind, WidgetRegistry};
use crate::widgets::{self, Widget, WriteIntent};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique component id. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Element id prefix used in the rendered markup.
    #[must_use]
    pub fn binding(self) -> String {
        format!("component-{}", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component-{}", self.0)
    }
}

enum Body {
    Widget(Box<dyn Widget>),
    Layout(LayoutNode),
}

/// Event route table: element id to the chain of child keys leading to its node.
pub(crate) type Routes = HashMap<String, Vec<String>>;

/// One node of the component tree.
pub struct ComponentNode {
    id: ComponentId,
    name: String,
    path: String,
    meta: Value,
    leaf: bool,
    kind: WidgetKind,
    children: IndexMap<String, ComponentNode>,
    body: Body,
    rendered: bool,
    bound: bool,
}

impl ComponentNode {
    /// Build a node and, for branches, all of its descendants.
    pub(crate) fn build(registry: &WidgetRegistry, name: String, meta: &Value) -> Self {
        let kind = registry.resolve(meta);
        Self::with_kind(registry, kind, name, meta)
    }

    /// Build an adapter root. Roots are always laid out, whatever the metadata.
    pub(crate) fn build_root(registry: &WidgetRegistry, name: String, meta: &Value) -> Self {
        Self::with_kind(registry, WidgetKind::Layout, name, meta)
    }

    fn with_kind(registry: &WidgetRegistry, kind: WidgetKind, name: String, meta: &Value) -> Self {
        let id = ComponentId::next();
        let leaf = metadata::is_leaf(meta);
        let children = if leaf {
            IndexMap::new()
        } else {
            metadata::children(meta)
                .into_iter()
                .map(|(key, child)| {
                    let name = metadata::resolve_name(meta, &key);
                    let node = Self::build(registry, name, child);
                    (key, node)
                })
                .collect()
        };
        let body = match kind {
            WidgetKind::Layout => Body::Layout(LayoutNode::new()),
            other => Body::Widget(widgets::build(other, meta)),
        };
        Self {
            id,
            name,
            path: String::new(),
            meta: meta.clone(),
            leaf,
            kind,
            children,
            body,
            rendered: false,
            bound: false,
        }
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Element id prefix of this node.
    #[must_use]
    pub fn binding(&self) -> String {
        self.id.binding()
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash-joined path from the root; empty for the root and before mount.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Metadata this node was built from.
    #[must_use]
    pub fn meta(&self) -> &Value {
        &self.meta
    }

    /// Whether the metadata node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Kind chosen by the registry.
    #[must_use]
    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Whether the node found its elements after mount.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Children in metadata order.
    pub fn children(&self) -> impl Iterator<Item = (&String, &ComponentNode)> {
        self.children.iter()
    }

    /// Child by key.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&ComponentNode> {
        self.children.get(key)
    }

    /// Leaf widget, if this node is not laid out.
    #[must_use]
    pub fn widget(&self) -> Option<&dyn Widget> {
        match &self.body {
            Body::Widget(widget) => Some(widget.as_ref()),
            Body::Layout(_) => None,
        }
    }

    /// Layout state, if this node is laid out.
    #[must_use]
    pub fn layout(&self) -> Option<&LayoutNode> {
        match &self.body {
            Body::Layout(layout) => Some(layout),
            Body::Widget(_) => None,
        }
    }

    /// Last value shown by the leaf widget.
    #[must_use]
    pub fn last_value(&self) -> Option<&Value> {
        self.widget().and_then(|widget| widget.last_value())
    }

    /// What the leaf widget currently shows; empty for branches.
    #[must_use]
    pub fn display_text(&self) -> String {
        self.widget().map(|widget| widget.display_text()).unwrap_or_default()
    }

    pub(crate) fn generate(&mut self, placement: Placement<'_>) -> String {
        self.rendered = true;
        let binding = self.id.binding();
        match &mut self.body {
            Body::Widget(widget) => widget.render(&binding),
            Body::Layout(layout) => {
                let frame = Frame {
                    binding: &binding,
                    name: &self.name,
                    meta: &self.meta,
                };
                layout.generate(&frame, &mut self.children, placement)
            }
        }
    }

    /// Assign paths and bind every rendered node, depth-first pre-order.
    pub(crate) fn init(
        &mut self,
        raw_path: &str,
        chain: &mut Vec<String>,
        routes: &mut Routes,
        doc: &dyn Document,
    ) {
        self.path = raw_path.get(1..).unwrap_or_default().to_owned();
        if self.rendered {
            let binding = self.id.binding();
            let bound = match &mut self.body {
                Body::Widget(widget) => widget.bind(&binding, doc).map(|()| widget.event_targets()),
                Body::Layout(layout) => layout.bind(&binding, doc).map(|()| layout.event_targets()),
            };
            match bound {
                Ok(targets) => {
                    self.bound = true;
                    for target in targets {
                        routes.insert(target, chain.clone());
                    }
                }
                Err(err) => debug!(path = %self.path, error = %err, "Component left unbound"),
            }
        }
        for (key, child) in &mut self.children {
            chain.push(key.clone());
            child.init(&format!("{raw_path}/{key}"), chain, routes, doc);
            chain.pop();
        }
    }

    pub(crate) fn apply_update(&mut self, data: &Value, doc: &mut dyn Document) {
        if self.leaf {
            if let (true, Body::Widget(widget)) = (self.bound, &mut self.body) {
                widget.apply_update(data, doc);
            }
            return;
        }
        if !(data.is_object() || data.is_array()) {
            trace!(path = %self.path, "Ignoring non-container update for branch");
            return;
        }
        if let Body::Layout(layout) = &mut self.body {
            layout.apply_overall(data, doc);
        }
        for (key, child) in &mut self.children {
            match metadata::child(data, key) {
                Some(value) => child.apply_update(value, doc),
                None => trace!(path = %self.path, key = %key, "No update for child"),
            }
        }
    }

    pub(crate) fn descend_mut(&mut self, chain: &[String]) -> Option<&mut ComponentNode> {
        chain
            .iter()
            .try_fold(self, |node, key| node.children.get_mut(key))
    }

    pub(crate) fn on_event(
        &mut self,
        event: &UiEvent,
        doc: &mut dyn Document,
    ) -> DashboardResult<Option<WriteIntent>> {
        match &mut self.body {
            Body::Widget(widget) => widget.on_event(event, &self.path, doc),
            Body::Layout(layout) => {
                layout.on_event(event, doc);
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
