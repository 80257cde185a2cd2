//! Bounded value capture for diff payloads.
//!
//! Host values can be arbitrarily deep, wide or cyclic. Everything stored in
//! a buffer goes through [`capture`], which copies a value into JSON while
//! replacing cycles, excess depth and excess width with markers.

use serde_json::{Map, Number, Value as JsonValue};

use crate::config::CaptureLimits;
use crate::host::HostValue;

pub const CIRCULAR_MARKER: &str = "[Circular]";
pub const OBJECT_MARKER: &str = "[Object]";
pub const ARRAY_MARKER: &str = "[Array]";
pub const TRUNCATED_KEY: &str = "__truncated__";

/// Copy a host value into JSON. Returns `None` for `undefined`.
#[must_use]
pub fn capture(value: &HostValue, limits: &CaptureLimits) -> Option<JsonValue> {
    let mut path = Vec::new();
    capture_at(value, limits, 0, &mut path)
}

/// `path` holds the identities of the compounds currently being copied;
/// meeting one of them again means the value refers back to an ancestor.
fn capture_at(
    value: &HostValue,
    limits: &CaptureLimits,
    depth: usize,
    path: &mut Vec<usize>,
) -> Option<JsonValue> {
    match value {
        HostValue::Undefined => None,
        HostValue::Null => Some(JsonValue::Null),
        HostValue::Bool(b) => Some(JsonValue::Bool(*b)),
        HostValue::Number(n) => Some(json_number(*n)),
        HostValue::Str(s) => Some(JsonValue::String(s.to_string())),
        HostValue::Function(f) => Some(JsonValue::String(format!("[Function {}]", f.name))),
        HostValue::Array(items) => {
            let id = value.identity()?;
            if path.contains(&id) {
                return Some(JsonValue::String(CIRCULAR_MARKER.to_string()));
            }
            if depth >= limits.max_depth {
                return Some(JsonValue::String(ARRAY_MARKER.to_string()));
            }
            path.push(id);
            let items = items.borrow();
            let mut out: Vec<JsonValue> = items
                .iter()
                .take(limits.max_items)
                .map(|item| capture_at(item, limits, depth + 1, path).unwrap_or(JsonValue::Null))
                .collect();
            if items.len() > limits.max_items {
                out.push(JsonValue::String(format!("[+{} more]", items.len() - limits.max_items)));
            }
            path.pop();
            Some(JsonValue::Array(out))
        }
        HostValue::Object(entries) => {
            let id = value.identity()?;
            if path.contains(&id) {
                return Some(JsonValue::String(CIRCULAR_MARKER.to_string()));
            }
            if depth >= limits.max_depth {
                return Some(JsonValue::String(OBJECT_MARKER.to_string()));
            }
            path.push(id);
            let entries = entries.borrow();
            let mut out = Map::new();
            for (key, item) in entries.iter().take(limits.max_keys) {
                if let Some(captured) = capture_at(item, limits, depth + 1, path) {
                    out.insert(key.clone(), captured);
                }
            }
            if entries.len() > limits.max_keys {
                out.insert(TRUNCATED_KEY.to_string(), JsonValue::from(entries.len() - limits.max_keys));
            }
            path.pop();
            Some(JsonValue::Object(out))
        }
    }
}

/// Integral numbers are emitted as JSON integers, non-finite ones as null.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn json_number(n: f64) -> JsonValue {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        JsonValue::from(n as i64)
    } else {
        Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits(max_depth: usize, max_keys: usize, max_items: usize) -> CaptureLimits {
        CaptureLimits { max_depth, max_keys, max_items }
    }

    #[test]
    fn test_capture_primitives() {
        let l = CaptureLimits::default();
        assert_eq!(capture(&HostValue::Undefined, &l), None);
        assert_eq!(capture(&HostValue::Null, &l), Some(json!(null)));
        assert_eq!(capture(&HostValue::from(2.5), &l), Some(json!(2.5)));
        assert_eq!(capture(&HostValue::Number(f64::NAN), &l), Some(json!(null)));
        assert_eq!(capture(&HostValue::from("hi"), &l), Some(json!("hi")));
        assert_eq!(capture(&HostValue::function("onPress"), &l), Some(json!("[Function onPress]")));
    }

    #[test]
    fn test_capture_nested_object_drops_undefined() {
        let value = HostValue::object([
            ("name", HostValue::from("a")),
            ("gone", HostValue::Undefined),
            ("list", HostValue::array([HostValue::from(1), HostValue::Undefined])),
        ]);
        assert_eq!(
            capture(&value, &CaptureLimits::default()),
            Some(json!({ "name": "a", "list": [1, null] }))
        );
    }

    #[test]
    fn test_capture_depth_marker() {
        let value = HostValue::object([(
            "a",
            HostValue::object([("b", HostValue::object([("c", HostValue::from(1))]))]),
        )]);
        assert_eq!(capture(&value, &limits(2, 50, 50)), Some(json!({ "a": { "b": "[Object]" } })));
    }

    #[test]
    fn test_capture_width_markers() {
        let wide = HostValue::object((0..5).map(|i| (format!("k{i}"), HostValue::from(i))));
        let captured = capture(&wide, &limits(4, 3, 50)).unwrap();
        assert_eq!(captured.as_object().unwrap().len(), 4);
        assert_eq!(captured[TRUNCATED_KEY], 2);

        let long = HostValue::array((0..5).map(HostValue::from));
        assert_eq!(capture(&long, &limits(4, 50, 2)), Some(json!([0, 1, "[+3 more]"])));
    }

    #[test]
    fn test_capture_cycle_marker() {
        let obj = HostValue::object([("id", HostValue::from(1))]);
        if let HostValue::Object(inner) = &obj {
            inner.borrow_mut().insert("self".to_string(), obj.clone());
        }

        assert_eq!(
            capture(&obj, &CaptureLimits::default()),
            Some(json!({ "id": 1, "self": "[Circular]" }))
        );

        if let HostValue::Object(inner) = &obj {
            inner.borrow_mut().clear();
        }
    }

    #[test]
    fn test_capture_repeated_sibling_is_not_a_cycle() {
        let shared = HostValue::array([HostValue::from(1)]);
        let value = HostValue::array([shared.clone(), shared]);
        assert_eq!(capture(&value, &CaptureLimits::default()), Some(json!([[1], [1]])));
    }
}
