use std::path::PathBuf;

use treescope::engine::Engine;
use treescope::geometry::{FrameGeometry, NoGeometry};
use treescope::host::fixture::load_tree;
use treescope::host::HostTree;

fn screen() -> HostTree {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/screen.json");
    load_tree(path).expect("Failed to load screen fixture")
}

#[test]
fn test_query_pressables_in_traversal_order() {
    let tree = screen();
    let engine = Engine::default();

    let records = engine.query_selector(&tree, &FrameGeometry, "ScrollView > Pressable:has-press");
    let uids: Vec<&str> = records.iter().map(|r| r.uid.as_str()).collect();
    assert_eq!(uids, vec!["buy", "0.0.0.1"]);

    let buy = &records[0];
    assert_eq!(buy.text.as_deref(), Some("Buy now"));
    assert_eq!(buy.accessibility_label.as_deref(), Some("Buy item"));
    assert_eq!(buy.measure.map(|m| m.page_y), Some(140.0));
    assert_eq!(buy.measure_fallback_uid.as_deref(), Some("0.0.0.0.0"));

    let cancel = &records[1];
    assert_eq!(cancel.text.as_deref(), Some("Cancel"));
    assert_eq!(cancel.disabled, Some(true));
    assert_eq!(cancel.measure, None);
}

#[test]
fn test_nth_and_last_of_type() {
    let tree = screen();
    let engine = Engine::default();

    let second = engine.query_selector(&tree, &NoGeometry, "Pressable:nth-of-type(2)");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].text.as_deref(), Some("Cancel"));

    let last = engine.query_selector(&tree, &NoGeometry, "Pressable:last-of-type");
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].uid, "0.0.0.1");
}

#[test]
fn test_union_dedupes_and_invalid_selector_is_empty() {
    let tree = screen();
    let engine = Engine::default();

    let records = engine.query_selector(&tree, &NoGeometry, r#"#buy, Pressable:text("Buy")"#);
    assert_eq!(records.len(), 1);
    assert!(records[0].has_on_press);

    let scrollers = engine.query_selector(&tree, &NoGeometry, "ScrollView:has-scroll");
    assert_eq!(scrollers[0].uid, "feed");

    assert!(engine.query_selector(&tree, &NoGeometry, "Pressable[").is_empty());
}

#[test]
fn test_snapshot_and_inspect() {
    let tree = screen();
    let engine = Engine::default();

    let snapshot = engine.snapshot(&tree, &NoGeometry, 2).expect("tree has a root");
    let app = &snapshot.children.as_ref().expect("root has children")[0];
    assert_eq!(app.record.node_type, "App");
    let feed = &app.children.as_ref().expect("app has children")[0];
    assert_eq!(feed.record.uid, "feed");
    assert!(feed.children.is_none());

    let details = engine.inspect(&tree, &NoGeometry, "buy").expect("buy is addressable");
    assert_eq!(details.path, "0.0.0.0");
    assert_eq!(details.ancestor_identifier.as_deref(), Some("feed"));
    assert!(details.props.contains_key("onPress"));
}
