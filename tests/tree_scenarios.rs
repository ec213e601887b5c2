//! Integration tests for building, mounting and updating component trees.

use odin_dashboard::dom::{PatchDocument, UiEvent};
use odin_dashboard::layout::DisplayMode;
use odin_dashboard::{Tree, WidgetKind, WidgetRegistry};
use serde_json::{json, Value};

fn mounted(meta: &Value) -> (Tree, PatchDocument) {
    let mut tree = Tree::build(&WidgetRegistry::standard(), "Test Adapter", meta);
    let mut doc = PatchDocument::new();
    tree.mount(&mut doc).expect("Failed to mount tree");
    (tree, doc)
}

fn keys_of(tree: &Tree, path: &str) -> Vec<String> {
    tree.find(path)
        .expect("Missing node")
        .children()
        .map(|(key, _)| key.clone())
        .collect()
}

/// Power supply style metadata used across several tests.
fn supply_metadata() -> Value {
    json!({
        "name": "LPD Power",
        "description": "Power supply control",
        "overall": {"type": "status", "writeable": false},
        "temperature": {"type": "float", "writeable": false, "units": "C", "dp": 1},
        "quad": [
            {
                "enable": {"type": "bool", "writeable": true, "description": "Output enable"},
                "voltage": {"type": "float", "writeable": false, "units": "V", "dp": 2},
                "current": {"type": "float", "writeable": false, "units": "A", "dp": 2}
            },
            {
                "enable": {"type": "bool", "writeable": true},
                "voltage": {"type": "float", "writeable": false, "units": "V", "dp": 2},
                "trace": {"type": "bool", "writeable": false}
            }
        ],
        "setpoints": {
            "list": false,
            "target": {"type": "float", "writeable": true, "units": "V"},
            "label": {"type": "str", "writeable": true}
        }
    })
}

#[test]
fn test_tree_mirrors_metadata_shape() {
    let meta = supply_metadata();
    let (tree, _) = mounted(&meta);

    assert_eq!(keys_of(&tree, ""), vec!["overall", "temperature", "quad", "setpoints"]);
    assert_eq!(keys_of(&tree, "quad"), vec!["0", "1"]);
    assert_eq!(keys_of(&tree, "quad/0"), vec!["enable", "voltage", "current"]);
    assert_eq!(keys_of(&tree, "quad/1"), vec!["enable", "voltage", "trace"]);
    assert_eq!(keys_of(&tree, "setpoints"), vec!["target", "label"]);
    assert!(keys_of(&tree, "quad/0/enable").is_empty());
}

#[test]
fn test_paths_join_keys_from_root() {
    let (tree, _) = mounted(&json!({"a": {"b": {"type": "float", "writeable": true}}}));
    assert_eq!(tree.find("a/b").expect("Missing node").path(), "a/b");

    let (tree, _) = mounted(&supply_metadata());
    for path in ["quad/1/voltage", "setpoints/target", "temperature"] {
        assert_eq!(tree.find(path).expect("Missing node").path(), path);
    }
}

#[test]
fn test_widget_selection() {
    let (tree, _) = mounted(&supply_metadata());
    let kind = |path: &str| tree.find(path).expect("Missing node").kind();

    assert_eq!(kind("quad/0/enable"), WidgetKind::Button);
    assert_eq!(kind("quad/1/trace"), WidgetKind::StatusBox);
    assert_eq!(kind("quad/0/voltage"), WidgetKind::Label);
    assert_eq!(kind("setpoints/target"), WidgetKind::TextField);
    assert_eq!(kind("setpoints/label"), WidgetKind::TextField);
    assert_eq!(kind("quad"), WidgetKind::Layout);
}

#[test]
fn test_same_value_twice_mutates_once() {
    let (mut tree, mut doc) = mounted(&json!({"v": {"type": "float", "writeable": false}}));
    tree.apply_update(&json!({"v": 2.5}), &mut doc).expect("Update failed");
    tree.apply_update(&json!({"v": 2.5}), &mut doc).expect("Update failed");
    assert_eq!(doc.mutation_count(), 1);
}

#[test]
fn test_rounding_is_idempotent() {
    let (mut tree, mut doc) = mounted(&json!({"v": {"type": "float", "writeable": false, "dp": 1}}));
    let binding = tree.find("v").expect("Missing node").binding();

    tree.apply_update(&json!({"v": 1.04}), &mut doc).expect("Update failed");
    tree.apply_update(&json!({"v": 1.049}), &mut doc).expect("Update failed");

    assert_eq!(doc.text(&binding), Some("1.0"));
    assert_eq!(doc.mutation_count(), 1);
}

#[test]
fn test_layout_inference() {
    let (tree, _) = mounted(&json!({
        "rows": [
            {"v": {"type": "float"}, "i": {"type": "float"}},
            {"v": {"type": "float"}, "i": {"type": "float"}}
        ],
        "flat": {"a": {"type": "int"}, "b": {"type": "str"}}
    }));
    let mode = |path: &str| {
        tree.find(path)
            .and_then(|node| node.layout())
            .and_then(|layout| layout.mode())
    };
    assert_eq!(mode(""), Some(DisplayMode::Main));
    assert_eq!(mode("rows"), Some(DisplayMode::Tabular));
    assert_eq!(mode("flat"), Some(DisplayMode::Vertical));
}

#[test]
fn test_missing_keys_are_tolerated() {
    let (mut tree, mut doc) = mounted(&supply_metadata());

    tree.apply_update(&json!({"quad": [{"voltage": 3.3}]}), &mut doc)
        .expect("Update failed");
    assert_eq!(tree.find("quad/0/voltage").expect("Missing node").display_text(), "3.30 V");
    assert_eq!(tree.find("quad/1/voltage").expect("Missing node").display_text(), "- V");

    tree.apply_update(&json!({"unknown": {"x": 1}, "temperature": "hot"}), &mut doc)
        .expect("Update failed");
    tree.apply_update(&json!({"quad": 5}), &mut doc).expect("Update failed");
    tree.apply_update(&json!(null), &mut doc).expect("Update failed");
    assert_eq!(tree.find("quad/0/voltage").expect("Missing node").display_text(), "3.30 V");
}

#[test]
fn test_button_writes_negation() {
    let (mut tree, mut doc) = mounted(&supply_metadata());
    let target = tree.find("quad/1/enable").expect("Missing node").binding();

    let intent = tree
        .dispatch(&UiEvent::Click { target: target.clone() }, &mut doc)
        .expect("Dispatch failed")
        .expect("No write emitted");
    assert_eq!(intent.path, "quad/1/enable");
    assert_eq!(intent.value, json!(true));

    tree.apply_update(&json!({"quad": [{}, {"enable": true}]}), &mut doc)
        .expect("Update failed");
    let intent = tree
        .dispatch(&UiEvent::Click { target }, &mut doc)
        .expect("Dispatch failed")
        .expect("No write emitted");
    assert_eq!(intent.value, json!(false));
}

#[test]
fn test_text_field_round_trip_through_dispatch() {
    let (mut tree, mut doc) = mounted(&supply_metadata());
    let binding = tree.find("setpoints/target").expect("Missing node").binding();

    tree.dispatch(
        &UiEvent::Input {
            target: format!("{binding}-input"),
            value: "12.5".into(),
        },
        &mut doc,
    )
    .expect("Dispatch failed");
    let intent = tree
        .dispatch(
            &UiEvent::Click {
                target: format!("{binding}-button"),
            },
            &mut doc,
        )
        .expect("Dispatch failed")
        .expect("No write emitted");
    assert_eq!(intent.path, "setpoints/target");
    assert_eq!(intent.value, json!(12.5));

    tree.apply_update(&json!({"setpoints": {"target": 12.5}}), &mut doc)
        .expect("Update failed");
    assert_eq!(doc.placeholder(&format!("{binding}-input")), Some("12.5"));
}

#[test]
fn test_end_to_end_label_with_units() {
    let meta = json!([{"name": "Ch0", "value": {"type": "float", "writeable": false, "units": "V"}}]);
    let (mut tree, mut doc) = mounted(&meta);

    let channel = tree.find("0").expect("Missing channel");
    assert_eq!(channel.name(), "Ch0");
    let label = tree.find("0/value").expect("Missing label");
    assert_eq!(label.kind(), WidgetKind::Label);
    let binding = label.binding();
    assert_eq!(doc.text(&binding), Some("-"));

    tree.apply_update(&json!([{"value": 3.3}]), &mut doc).expect("Update failed");
    let label = tree.find("0/value").expect("Missing label");
    assert_eq!(label.display_text(), "3.3 V");
    assert_eq!(doc.text(&binding), Some("3.3"));
}

#[test]
fn test_overall_status_in_root_renders_inline() {
    let (mut tree, mut doc) = mounted(&supply_metadata());
    let overall = tree.find("overall").expect("Missing node");
    assert_eq!(overall.kind(), WidgetKind::StatusBox);
    assert!(overall.is_bound());
    let binding = overall.binding();

    tree.apply_update(&json!({"overall": "ok"}), &mut doc).expect("Update failed");
    assert!(doc.has_class(&binding, "status-ok"));
}

#[test]
fn test_rendered_markup_contains_names_and_tooltips() {
    let (_, doc) = mounted(&supply_metadata());
    let markup = doc.markup();
    assert!(markup.contains("<h3>Test Adapter</h3>"));
    assert!(markup.contains("Power supply control"));
    assert!(markup.contains(r#"title="Output enable""#));
    assert!(markup.contains("<h5>Temperature:</h5>"));
}

#[test]
fn test_ids_are_unique_across_trees() {
    let (first, _) = mounted(&json!({"v": {"type": "int"}}));
    let (second, _) = mounted(&json!({"v": {"type": "int"}}));
    assert_ne!(
        first.find("v").expect("Missing node").id(),
        second.find("v").expect("Missing node").id()
    );
}

fn mode_of(tree: &Tree, path: &str) -> Option<DisplayMode> {
    tree.find(path)
        .expect("Missing node")
        .layout()
        .and_then(|layout| layout.mode())
}

#[test]
fn test_list_of_leaves_lays_out_side_by_side() {
    let meta = json!({
        "gains": [
            {"type": "float", "writeable": false},
            {"type": "float", "writeable": false}
        ]
    });
    let (mut tree, mut doc) = mounted(&meta);

    assert_eq!(mode_of(&tree, "gains"), Some(DisplayMode::Horizontal));
    let binding = tree.find("gains").expect("Missing node").binding();
    let markup = doc.markup();
    assert!(markup.contains(&format!(
        r#"<div class="layout layout-horizontal" id="{binding}">"#
    )));
    assert!(markup.contains("<div class=\"last\">\n<div class=\"horizontal\">"));
    assert!(markup.contains("<h5>0:</h5>"));

    tree.apply_update(&json!({"gains": [1.5, 2.5]}), &mut doc)
        .expect("Update failed");
    assert_eq!(tree.find("gains/1").expect("Missing node").display_text(), "2.5");
}

#[test]
fn test_height_two_branch_puts_leaves_in_parent_column() {
    let meta = json!({
        "psu": {
            "enable": {"type": "bool", "writeable": false},
            "rail": {"voltage": {"type": "float", "writeable": false, "units": "V"}}
        }
    });
    let (mut tree, mut doc) = mounted(&meta);

    assert_eq!(mode_of(&tree, "psu"), Some(DisplayMode::Horizontal));
    assert_eq!(mode_of(&tree, "psu/rail"), Some(DisplayMode::Vertical));
    let markup = doc.markup();
    assert!(markup.contains("<div class=\"parent-column\">\n<div class=\"vertical\">"));
    assert!(markup.contains("<div class=\"child-column\">"));
    assert!(!markup.contains("class=\"horizontal\""));

    tree.apply_update(&json!({"psu": {"rail": {"voltage": 12.0}}}), &mut doc)
        .expect("Update failed");
    assert_eq!(
        tree.find("psu/rail/voltage").expect("Missing node").display_text(),
        "12.0 V"
    );
}

#[test]
fn test_height_three_list_renders_stacked_cells() {
    let meta = json!({
        "quads": [
            {"ch": {"v": {"type": "float", "writeable": false}}},
            {"ch": {"v": {"type": "float", "writeable": false}}}
        ]
    });
    let (mut tree, mut doc) = mounted(&meta);

    assert_eq!(mode_of(&tree, "quads"), Some(DisplayMode::Tabular));
    assert_eq!(mode_of(&tree, "quads/0"), Some(DisplayMode::TableRow));
    assert_eq!(mode_of(&tree, "quads/0/ch"), Some(DisplayMode::TableVertical));

    let cell = tree.find("quads/1/ch").expect("Missing node").binding();
    let markup = doc.markup();
    assert!(markup.contains("<th>Ch</th>"));
    assert!(markup.contains(&format!(r#"<div class="table-vertical" id="{cell}">"#)));
    assert!(markup.contains("<h5>V:</h5>"));
    assert!(tree.find("quads/0/ch/v").expect("Missing node").is_bound());

    tree.apply_update(
        &json!({"quads": [{"ch": {"v": 2.5}}, {"ch": {"v": 0.5}}]}),
        &mut doc,
    )
    .expect("Update failed");
    assert_eq!(tree.find("quads/0/ch/v").expect("Missing node").display_text(), "2.5");
    assert_eq!(tree.find("quads/1/ch/v").expect("Missing node").display_text(), "0.5");
}
