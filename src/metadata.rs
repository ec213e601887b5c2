//! Metadata classification.
//!
//! Pure functions over the metadata tree served by an odin-control adapter. A node is
//! either a *leaf* (a single parameter described by flat fields like `type` and
//! `writeable`) or a *branch* whose non-reserved keys are further nodes. Arrays are
//! branches keyed by their decimal indices.
//!
//! ```text
//! {
//!   "name": "Quad 0",            <- reserved: display name override
//!   "description": "...",        <- reserved: caption / tooltip
//!   "list": true,                <- reserved: request list layout
//!   "voltage": { "type": "float", "writeable": false, "units": "V", "dp": 2 },
//!   "enable":  { "type": "bool",  "writeable": true }
//! }
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Keys that describe a branch rather than name one of its children.
pub const RESERVED_KEYS: [&str; 3] = ["name", "description", "list"];

static WORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w").expect("Invalid word-start regex"));

/// Whether `key` is one of the reserved branch keys.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// True iff no non-reserved value of `node` is itself an object or array.
///
/// Bare scalars count as leaves.
#[must_use]
pub fn is_leaf(node: &Value) -> bool {
    match node {
        Value::Object(map) => !map
            .iter()
            .any(|(key, value)| !is_reserved(key) && is_structured(value)),
        Value::Array(items) => !items.iter().any(is_structured),
        _ => true,
    }
}

/// True for arrays and for objects carrying `list: true`.
#[must_use]
pub fn is_list(node: &Value) -> bool {
    match node {
        Value::Array(_) => true,
        Value::Object(map) => map.get("list").and_then(Value::as_bool).unwrap_or(false),
        _ => false,
    }
}

fn is_structured(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Non-reserved children of a node, in metadata order.
#[must_use]
pub fn children(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.clone(), value))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect(),
        _ => Vec::new(),
    }
}

/// Look up one child by key. Array children are addressed by decimal index.
#[must_use]
pub fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

/// Mutable counterpart of [`child`].
pub fn child_mut<'a>(node: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(move |index| items.get_mut(index)),
        _ => None,
    }
}

/// Display name for `parent[key]`: its `name` field if present, else the humanized key.
#[must_use]
pub fn resolve_name(parent: &Value, key: &str) -> String {
    child(parent, key)
        .and_then(|node| node.get("name"))
        .and_then(Value::as_str)
        .map_or_else(|| humanize(key), str::to_owned)
}

/// Turn a parameter key into a label.
///
/// Only the first underscore becomes a space; every word then gets an upper-case
/// first letter, so `foo_bar_baz` becomes `Foo Bar_baz`.
#[must_use]
pub fn humanize(key: &str) -> String {
    let spaced = key.replacen('_', " ", 1);
    WORD_START
        .replace_all(&spaced, |caps: &regex::Captures<'_>| caps[0].to_uppercase())
        .into_owned()
}

/// 0 for a leaf, otherwise 1 + the height of the tallest child.
#[must_use]
pub fn subtree_height(node: &Value) -> usize {
    if is_leaf(node) {
        return 0;
    }
    children(node)
        .into_iter()
        .map(|(_, child)| subtree_height(child))
        .max()
        .unwrap_or(0)
        + 1
}

/// Leaf `type` field; absent means a plain string-like parameter.
#[must_use]
pub fn leaf_type(node: &Value) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

/// Leaf `writeable` flag; absent means read-only.
#[must_use]
pub fn is_writeable(node: &Value) -> bool {
    node.get("writeable").and_then(Value::as_bool).unwrap_or(false)
}

/// Optional string field such as `units` or `description`.
#[must_use]
pub fn string_attr<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

/// Decimal places requested for display rounding, ignoring zero.
#[must_use]
pub fn decimal_places(node: &Value) -> Option<usize> {
    node.get("dp")
        .and_then(Value::as_u64)
        .filter(|dp| *dp > 0)
        .and_then(|dp| usize::try_from(dp).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_parameter_is_leaf() {
        assert!(is_leaf(&json!({"type": "float", "writeable": false, "units": "V"})));
        assert!(is_leaf(&json!(3.3)));
        assert!(is_leaf(&json!({})));
    }

    #[test]
    fn nested_object_is_branch() {
        assert!(!is_leaf(&json!({"voltage": {"type": "float"}})));
        assert!(!is_leaf(&json!([{"type": "float"}])));
    }

    #[test]
    fn reserved_keys_are_not_children() {
        let node = json!({
            "name": "Quad",
            "description": "Quad supply",
            "list": true,
            "a": {"type": "int"},
        });
        let keys: Vec<String> = children(&node).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a"]);
        assert!(is_list(&node));
    }

    #[test]
    fn children_keep_metadata_order() {
        let node: Value =
            serde_json::from_str(r#"{"zeta": {"x": {}}, "alpha": 1, "mid": {"y": 2}}"#).unwrap();
        let keys: Vec<String> = children(&node).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn array_children_use_indices() {
        let node = json!([{"v": 1}, {"v": 2}]);
        let keys: Vec<String> = children(&node).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["0", "1"]);
        assert_eq!(child(&node, "1"), Some(&json!({"v": 2})));
        assert_eq!(child(&node, "x"), None);
    }

    #[test]
    fn humanize_replaces_first_underscore_only() {
        assert_eq!(humanize("voltage"), "Voltage");
        assert_eq!(humanize("supply_voltage"), "Supply Voltage");
        assert_eq!(humanize("foo_bar_baz"), "Foo Bar_baz");
        assert_eq!(humanize("temp0"), "Temp0");
    }

    #[test]
    fn resolve_name_prefers_explicit_name() {
        let parent = json!({"ch_0": {"name": "Channel zero", "type": "float"}, "ch_1": {}});
        assert_eq!(resolve_name(&parent, "ch_0"), "Channel zero");
        assert_eq!(resolve_name(&parent, "ch_1"), "Ch 1");
    }

    #[test]
    fn subtree_height_counts_branch_levels() {
        assert_eq!(subtree_height(&json!({"type": "float"})), 0);
        assert_eq!(subtree_height(&json!({"a": {"type": "float"}})), 1);
        assert_eq!(subtree_height(&json!([{"v": {"type": "float"}}])), 2);
        assert_eq!(
            subtree_height(&json!({"a": {"type": "int"}, "b": {"c": {"d": {}}}})),
            3
        );
    }

    #[test]
    fn leaf_flags_default_sensibly() {
        let node = json!({"units": "mA", "dp": 2});
        assert_eq!(leaf_type(&node), None);
        assert!(!is_writeable(&node));
        assert_eq!(string_attr(&node, "units"), Some("mA"));
        assert_eq!(decimal_places(&node), Some(2));
        assert_eq!(decimal_places(&json!({"dp": 0})), None);
    }
}
