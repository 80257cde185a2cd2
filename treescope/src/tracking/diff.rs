//! Per-category diffs between a node and its alternate.

use std::collections::BTreeSet;
use treescope_common::{ContextDiff, PropDiff, StateDiff};

use crate::capture::capture;
use crate::config::CaptureLimits;
use crate::host::{shallow_equal, HostValue, Node, CHILDREN_PROP};

/// Stateful hook slots whose value changed, compared in lock-step.
#[must_use]
pub fn state_diff(current: &Node, previous: &Node, limits: &CaptureLimits) -> Vec<StateDiff> {
    current
        .hooks
        .iter()
        .zip(&previous.hooks)
        .enumerate()
        .filter(|(_, (now, before))| now.has_queue && !shallow_equal(&now.value, &before.value))
        .map(|(hook_index, (now, before))| StateDiff {
            hook_index,
            prev: capture(&before.value, limits),
            next: capture(&now.value, limits),
        })
        .collect()
}

/// Props whose reference changed, over the union of both key sets.
///
/// The children prop is skipped. A removed key reports `next` as undefined.
#[must_use]
pub fn prop_diff(current: &Node, previous: &Node, limits: &CaptureLimits) -> Vec<PropDiff> {
    let keys: BTreeSet<&String> = current.props.keys().chain(previous.props.keys()).collect();
    keys.into_iter()
        .filter(|key| key.as_str() != CHILDREN_PROP)
        .filter_map(|key| {
            let next = current.props.get(key).unwrap_or(&HostValue::Undefined);
            let prev = previous.props.get(key).unwrap_or(&HostValue::Undefined);
            (!next.strict_equals(prev)).then(|| PropDiff {
                key: key.clone(),
                prev: capture(prev, limits),
                next: capture(next, limits),
            })
        })
        .collect()
}

/// Context dependencies whose memoized value changed, in read order.
#[must_use]
pub fn context_diff(current: &Node, previous: &Node, limits: &CaptureLimits) -> Vec<ContextDiff> {
    let len = current.context_deps.len().max(previous.context_deps.len());
    (0..len)
        .filter_map(|index| {
            let next = current.context_deps.get(index).unwrap_or(&HostValue::Undefined);
            let prev = previous.context_deps.get(index).unwrap_or(&HostValue::Undefined);
            (!next.strict_equals(prev)).then(|| ContextDiff {
                index,
                prev: capture(prev, limits),
                next: capture(next, limits),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Hook;
    use serde_json::json;

    #[test]
    fn test_state_diff_uses_shallow_equality() {
        let limits = CaptureLimits::default();
        let before = Node::function("Form")
            .with_hook(Hook::state(HostValue::object([("name", HostValue::from("a"))])))
            .with_hook(Hook::state(HostValue::object([("age", HostValue::from(1))])));
        // Fresh objects: hook 0 has identical contents, hook 1 changes one key
        let after = Node::function("Form")
            .with_hook(Hook::state(HostValue::object([("name", HostValue::from("a"))])))
            .with_hook(Hook::state(HostValue::object([("age", HostValue::from(2))])));

        let diffs = state_diff(&after, &before, &limits);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].hook_index, 1);
        assert_eq!(diffs[0].prev, Some(json!({ "age": 1 })));
        assert_eq!(diffs[0].next, Some(json!({ "age": 2 })));
    }

    #[test]
    fn test_state_diff_ignores_slots_without_queue() {
        let limits = CaptureLimits::default();
        let before = Node::function("A").with_hook(Hook::passive(1)).with_hook(Hook::state(1));
        let after = Node::function("A").with_hook(Hook::passive(2)).with_hook(Hook::state(1));
        assert!(state_diff(&after, &before, &limits).is_empty());
    }

    #[test]
    fn test_prop_diff_union_and_removed_keys() {
        let limits = CaptureLimits::default();
        let handler = HostValue::function("onPress");
        let before = Node::function("Row")
            .with_prop("onPress", handler.clone())
            .with_prop("title", "a")
            .with_prop("gone", true)
            .with_prop("children", HostValue::array([]));
        let after = Node::function("Row")
            .with_prop("onPress", handler)
            .with_prop("title", "b")
            .with_prop("added", 1)
            .with_prop("children", HostValue::array([]));

        let diffs = prop_diff(&after, &before, &limits);
        let keys: Vec<&str> = diffs.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["added", "gone", "title"]);
        assert_eq!(diffs[1].prev, Some(json!(true)));
        assert_eq!(diffs[1].next, None);
        assert_eq!(diffs[0].prev, None);
    }

    #[test]
    fn test_context_diff_by_reference() {
        let limits = CaptureLimits::default();
        let theme = HostValue::object([("dark", HostValue::from(true))]);
        let before = Node::function("Themed").with_context(theme.clone()).with_context("en");
        let after = Node::function("Themed").with_context(theme).with_context("fr");

        let diffs = context_diff(&after, &before, &limits);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].index, 1);
        assert_eq!(diffs[0].next, Some(json!("fr")));
    }
}
