//! Branch layout.
//!
//! A [`LayoutNode`] is the body of every branch in the component tree. When the
//! tree is generated it splits its children into leaves and branches (metadata order
//! kept), picks a [`DisplayMode`] once, renders itself around its children, and
//! after mount fans poll updates out to them.
//!
//! Mode inference looks only at the subtree height and whether the branch is
//! list-shaped:
//!
//! | height | list | mode |
//! |--------|------|------|
//! | 2 or 3 | yes  | [`DisplayMode::Tabular`] |
//! | 2      | no   | [`DisplayMode::Horizontal`] |
//! | 1      | yes  | [`DisplayMode::Horizontal`] |
//! | other  |      | [`DisplayMode::Vertical`] |
//!
//! The adapter root is always [`DisplayMode::Main`]. Rows of a table use the
//! internal [`DisplayMode::TableRow`] and [`DisplayMode::TableVertical`] modes.
//!
//! Branches rendered with a header get a collapse toggle. A leaf child keyed
//! `overall` is hoisted into that header as a compact status indicator.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use crate::component::ComponentNode;
use crate::dom::{escape, Document, UiEvent};
use crate::error::DashboardResult;
use crate::metadata;
use crate::widgets::{require, StatusIndicator};

/// Child key hoisted into a branch header.
pub const OVERALL_KEY: &str = "overall";

/// Collapse glyph while the body is shown.
pub const EXPANDED_GLYPH: &str = "▾";

/// Collapse glyph while the body is hidden.
pub const COLLAPSED_GLYPH: &str = "▸";

/// Class toggled on a collapsed body.
pub const HIDDEN_CLASS: &str = "hidden";

/// Claims every branch.
#[must_use]
pub fn claims(meta: &Value) -> bool {
    !metadata::is_leaf(meta)
}

/// How a branch arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Adapter root: vertical, inline title, no header.
    Main,
    /// Leaves stacked in one column, branches in another.
    Vertical,
    /// Leaves side by side, branches in a separate column.
    Horizontal,
    /// One table row per child branch.
    Tabular,
    /// Cells of one table row.
    TableRow,
    /// Stacked content of one table cell.
    TableVertical,
}

impl DisplayMode {
    /// Whether this mode renders a header with a collapse toggle.
    #[must_use]
    pub fn has_header(self) -> bool {
        matches!(self, Self::Vertical | Self::Horizontal | Self::Tabular)
    }

    fn css(self) -> &'static str {
        match self {
            Self::Main => "layout-main",
            Self::Vertical => "layout-vertical",
            Self::Horizontal => "layout-horizontal",
            Self::Tabular => "layout-tabular",
            Self::TableRow => "layout-row",
            Self::TableVertical => "table-vertical",
        }
    }
}

/// Display mode for a branch rendered outside of a table.
#[must_use]
pub fn infer_mode(height: usize, is_list: bool) -> DisplayMode {
    if (height == 2 || height == 3) && is_list {
        DisplayMode::Tabular
    } else if height == 2 || (height == 1 && is_list) {
        DisplayMode::Horizontal
    } else {
        DisplayMode::Vertical
    }
}

/// Where a node is being generated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Placement<'a> {
    Root,
    Nested,
    Row(&'a [String]),
    Cell,
}

/// Identity of the branch being generated.
pub(crate) struct Frame<'a> {
    pub binding: &'a str,
    pub name: &'a str,
    pub meta: &'a Value,
}

type Children = IndexMap<String, ComponentNode>;

fn collapse_id(binding: &str) -> String {
    format!("{binding}-collapse")
}

fn body_id(binding: &str) -> String {
    format!("{binding}-body")
}

fn overall_id(binding: &str) -> String {
    format!("{binding}-overall")
}

/// Layout state of one branch.
#[derive(Debug, Default)]
pub struct LayoutNode {
    mode: Option<DisplayMode>,
    overall: Option<StatusIndicator>,
    collapsed: bool,
    binding: Option<String>,
}

impl LayoutNode {
    /// Fresh, ungenerated layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode chosen at generation, if generated.
    #[must_use]
    pub fn mode(&self) -> Option<DisplayMode> {
        self.mode
    }

    /// Whether the body is currently hidden.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Header indicator for a hoisted `overall` child.
    #[must_use]
    pub fn overall(&self) -> Option<&StatusIndicator> {
        self.overall.as_ref()
    }

    pub(crate) fn generate(
        &mut self,
        frame: &Frame<'_>,
        children: &mut Children,
        placement: Placement<'_>,
    ) -> String {
        let height = metadata::subtree_height(frame.meta);
        let inferred = match placement {
            Placement::Root => DisplayMode::Main,
            Placement::Nested => infer_mode(height, metadata::is_list(frame.meta)),
            Placement::Row(_) => DisplayMode::TableRow,
            Placement::Cell => DisplayMode::TableVertical,
        };
        let mode = *self.mode.get_or_insert(inferred);

        let (mut leaves, branches) = partition(children);
        if mode.has_header() && leaves.first().is_some_and(|key| key == OVERALL_KEY) {
            leaves.remove(0);
            self.overall = Some(StatusIndicator::new());
        }

        let body = match mode {
            DisplayMode::Main | DisplayMode::Vertical => {
                let column = if height > 1 { "parent-column" } else { "last" };
                let mut out = String::new();
                if !leaves.is_empty() {
                    out.push_str(&leaf_column(children, &leaves, column, "vertical"));
                }
                out.push_str(&branch_column(children, &branches));
                out
            }
            DisplayMode::Horizontal => {
                let mut out = String::new();
                if !leaves.is_empty() {
                    out.push_str(&if height > 1 {
                        leaf_column(children, &leaves, "parent-column", "vertical")
                    } else {
                        leaf_column(children, &leaves, "last", "horizontal")
                    });
                }
                out.push_str(&branch_column(children, &branches));
                out
            }
            DisplayMode::Tabular => {
                let mut out = String::new();
                if !leaves.is_empty() {
                    out.push_str(&leaf_column(children, &leaves, "parent-column", "vertical"));
                }
                out.push_str(&table(children, &branches));
                out
            }
            DisplayMode::TableRow => {
                let columns: Vec<String> = match placement {
                    Placement::Row(columns) => columns.to_vec(),
                    _ => children.keys().cloned().collect(),
                };
                row_cells(children, &columns)
            }
            DisplayMode::TableVertical => {
                let mut out = pairs(children, &leaves);
                for key in &branches {
                    if let Some(child) = children.get_mut(key) {
                        out.push_str(&format!(
                            "\n<div>\n<h5>{}:</h5>\n{}\n</div>",
                            escape(child.name()),
                            child.generate(Placement::Cell)
                        ));
                    }
                }
                out
            }
        };

        let binding = frame.binding;
        let name = escape(frame.name);
        let desc = metadata::string_attr(frame.meta, "description")
            .map(|desc| format!("\n<p class=\"desc\">{}</p>", escape(desc)))
            .unwrap_or_default();
        match mode {
            DisplayMode::Main => format!(
                "<div class=\"layout {css}\" id=\"{binding}\">\n<h3>{name}</h3>{desc}\n{body}\n</div>",
                css = mode.css(),
            ),
            DisplayMode::TableRow => body,
            DisplayMode::TableVertical => format!(
                "<div class=\"{css}\" id=\"{binding}\">{body}\n</div>",
                css = mode.css(),
            ),
            DisplayMode::Vertical | DisplayMode::Horizontal | DisplayMode::Tabular => {
                let overall = if self.overall.is_some() {
                    format!("\n<span class=\"status overall\" id=\"{}\"></span>", overall_id(binding))
                } else {
                    String::new()
                };
                format!(
                    "<div class=\"layout {css}\" id=\"{binding}\">
<div class=\"layout-header\">
<span class=\"collapse-toggle\" id=\"{collapse}\">{EXPANDED_GLYPH}</span>
<h4>{name}</h4>{overall}{desc}
</div>
<div class=\"layout-body\" id=\"{body_id}\">
{body}
</div>
</div>",
                    css = mode.css(),
                    collapse = collapse_id(binding),
                    body_id = body_id(binding),
                )
            }
        }
    }

    pub(crate) fn bind(&mut self, binding: &str, doc: &dyn Document) -> DashboardResult<()> {
        if self.mode.is_some_and(DisplayMode::has_header) {
            require(doc, &collapse_id(binding))?;
            require(doc, &body_id(binding))?;
        }
        if let Some(overall) = &mut self.overall {
            overall.bind(&overall_id(binding), doc)?;
        }
        self.binding = Some(binding.to_owned());
        Ok(())
    }

    pub(crate) fn event_targets(&self) -> Vec<String> {
        match &self.binding {
            Some(binding) if self.mode.is_some_and(DisplayMode::has_header) => {
                vec![collapse_id(binding)]
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn on_event(&mut self, event: &UiEvent, doc: &mut dyn Document) {
        let Some(binding) = &self.binding else { return };
        let toggle = collapse_id(binding);
        if !matches!(event, UiEvent::Click { target } if *target == toggle) {
            return;
        }
        self.collapsed = !self.collapsed;
        let body = body_id(binding);
        if self.collapsed {
            doc.add_class(&body, HIDDEN_CLASS);
            doc.set_text(&toggle, COLLAPSED_GLYPH);
        } else {
            doc.remove_class(&body, HIDDEN_CLASS);
            doc.set_text(&toggle, EXPANDED_GLYPH);
        }
        trace!(element = %binding, collapsed = self.collapsed, "Toggled layout body");
    }

    /// Restyle the hoisted header indicator from this branch's update payload.
    pub(crate) fn apply_overall(&mut self, data: &Value, doc: &mut dyn Document) {
        if let (Some(indicator), Some(value)) = (&mut self.overall, data.get(OVERALL_KEY)) {
            indicator.apply(value, doc);
        }
    }
}

/// Split child keys into leaves and branches; an `overall` leaf goes first.
fn partition(children: &Children) -> (Vec<String>, Vec<String>) {
    let mut leaves = Vec::new();
    let mut branches = Vec::new();
    for (key, child) in children {
        if child.is_leaf() {
            leaves.push(key.clone());
        } else {
            branches.push(key.clone());
        }
    }
    if let Some(index) = leaves.iter().position(|key| key == OVERALL_KEY) {
        let overall = leaves.remove(index);
        leaves.insert(0, overall);
    }
    (leaves, branches)
}

fn pairs(children: &mut Children, keys: &[String]) -> String {
    let mut out = String::new();
    for key in keys {
        if let Some(child) = children.get_mut(key) {
            out.push_str(&format!(
                "\n<div>\n<h5>{}:</h5>\n<div>{}</div>\n</div>",
                escape(child.name()),
                child.generate(Placement::Nested)
            ));
        }
    }
    out
}

fn leaf_column(children: &mut Children, keys: &[String], column: &str, flow: &str) -> String {
    format!(
        "<div class=\"{column}\">\n<div class=\"{flow}\">{}\n</div>\n</div>",
        pairs(children, keys)
    )
}

fn branch_column(children: &mut Children, keys: &[String]) -> String {
    if keys.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n<div class=\"child-column\">");
    for key in keys {
        if let Some(child) = children.get_mut(key) {
            out.push_str(&format!(
                "\n<div class=\"float-container\">\n{}\n</div>",
                child.generate(Placement::Nested)
            ));
        }
    }
    out.push_str("\n</div>");
    out
}

/// Union of the row branches' child keys, first seen first.
fn columns(children: &Children, rows: &[String]) -> Vec<(String, String)> {
    let mut columns: IndexMap<String, String> = IndexMap::new();
    for row in rows.iter().filter_map(|key| children.get(key)) {
        for (key, cell) in row.children() {
            columns
                .entry(key.clone())
                .or_insert_with(|| cell.name().to_owned());
        }
    }
    columns.into_iter().collect()
}

fn table(children: &mut Children, rows: &[String]) -> String {
    let columns = columns(children, rows);
    let keys: Vec<String> = columns.iter().map(|(key, _)| key.clone()).collect();
    let mut out = String::from("\n<table class=\"table\">\n<thead><tr><th></th>");
    for (_, name) in &columns {
        out.push_str(&format!("<th>{}</th>", escape(name)));
    }
    out.push_str("</tr></thead>\n<tbody>");
    for key in rows {
        if let Some(row) = children.get_mut(key) {
            let name = escape(row.name());
            out.push_str(&format!(
                "\n<tr>\n<th>{name}</th>{}\n</tr>",
                row.generate(Placement::Row(&keys))
            ));
        }
    }
    out.push_str("\n</tbody>\n</table>");
    out
}

fn row_cells(children: &mut Children, columns: &[String]) -> String {
    let mut out = String::new();
    for key in columns {
        match children.get_mut(key) {
            Some(cell) if cell.is_leaf() => {
                out.push_str(&format!("\n<td>{}</td>", cell.generate(Placement::Nested)));
            }
            Some(cell) => {
                out.push_str(&format!("\n<td>{}</td>", cell.generate(Placement::Cell)));
            }
            None => out.push_str("\n<td></td>"),
        }
    }
    out
}
