//! Per-adapter component tree.
//!
//! A [`Tree`] owns the root node of one adapter and drives the protocol around it:
//!
//! 1. [`Tree::build`] creates every node from the metadata, assigning ids.
//! 2. [`Tree::mount`] renders the whole markup into a [`Document`], assigns paths and
//!    binds every node depth-first pre-order. Mounting happens exactly once.
//! 3. [`Tree::apply_update`] walks a polled value tree against the nodes.
//! 4. [`Tree::dispatch`] routes a document event to the node that bound its target
//!    element and returns any resulting write.

use serde_json::Value;
use tracing::{debug, trace};

use crate::component::{ComponentNode, Routes};
use crate::dom::{Document, UiEvent};
use crate::error::{DashboardError, DashboardResult};
use crate::layout::Placement;
use crate::registry::WidgetRegistry;
use crate::widgets::WriteIntent;

/// Component tree for one adapter.
#[derive(Debug)]
pub struct Tree {
    root: ComponentNode,
    routes: Routes,
    mounted: bool,
}

impl Tree {
    /// Build the tree for an adapter named `name` from its metadata.
    #[must_use]
    pub fn build(registry: &WidgetRegistry, name: &str, meta: &Value) -> Self {
        Self {
            root: ComponentNode::build_root(registry, name.to_owned(), meta),
            routes: Routes::new(),
            mounted: false,
        }
    }

    /// Root node.
    #[must_use]
    pub fn root(&self) -> &ComponentNode {
        &self.root
    }

    /// Adapter display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.root.name()
    }

    /// Whether [`Tree::mount`] has run.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Render the markup into `doc`, then assign paths and bind every node.
    ///
    /// # Errors
    ///
    /// [`DashboardError::AlreadyMounted`] on a second call.
    pub fn mount(&mut self, doc: &mut dyn Document) -> DashboardResult<()> {
        if self.mounted {
            return Err(DashboardError::AlreadyMounted);
        }
        let markup = self.root.generate(Placement::Root);
        doc.mount(&markup);
        self.root.init("", &mut Vec::new(), &mut self.routes, &*doc);
        self.mounted = true;
        debug!(adapter = %self.root.name(), routes = self.routes.len(), "Mounted component tree");
        Ok(())
    }

    /// Apply one polled value tree. Keys missing from `values` are left as they are.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotMounted`] before [`Tree::mount`].
    pub fn apply_update(&mut self, values: &Value, doc: &mut dyn Document) -> DashboardResult<()> {
        if !self.mounted {
            return Err(DashboardError::NotMounted);
        }
        self.root.apply_update(values, doc);
        Ok(())
    }

    /// Route a document event to the node that owns its target element.
    ///
    /// Events for unknown targets are ignored.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotMounted`] before [`Tree::mount`], or whatever the widget
    /// reports, such as [`DashboardError::InvalidInput`].
    pub fn dispatch(
        &mut self,
        event: &UiEvent,
        doc: &mut dyn Document,
    ) -> DashboardResult<Option<WriteIntent>> {
        if !self.mounted {
            return Err(DashboardError::NotMounted);
        }
        let Some(chain) = self.routes.get(event.target()).cloned() else {
            trace!(element = %event.target(), "No component bound to event target");
            return Ok(None);
        };
        match self.root.descend_mut(&chain) {
            Some(node) => node.on_event(event, doc),
            None => Ok(None),
        }
    }

    /// Node at a slash-joined path; `""` is the root.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&ComponentNode> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('/')
            .try_fold(&self.root, |node, key| node.child(key))
    }
}
