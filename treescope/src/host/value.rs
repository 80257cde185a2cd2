//! Host values: the dynamically typed values found in props, hook slots and
//! context dependencies.
//!
//! Compound values (functions, arrays, objects) are reference-counted and
//! compared by identity, exactly like the host runtime compares them. Arrays
//! and objects are interior-mutable because the host may mutate them in
//! place between commits, which is also why they can form cycles.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A named host function (event handler, callback, render prop).
#[derive(Debug)]
pub struct HostFunction {
    pub name: String,
}

pub type HostArray = Rc<RefCell<Vec<HostValue>>>;
pub type HostObject = Rc<RefCell<BTreeMap<String, HostValue>>>;

#[derive(Clone)]
pub enum HostValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Function(Rc<HostFunction>),
    Array(HostArray),
    Object(HostObject),
}

impl HostValue {
    pub fn string(s: impl AsRef<str>) -> Self {
        HostValue::Str(Rc::from(s.as_ref()))
    }

    pub fn function(name: impl Into<String>) -> Self {
        HostValue::Function(Rc::new(HostFunction { name: name.into() }))
    }

    pub fn array(items: impl IntoIterator<Item = HostValue>) -> Self {
        HostValue::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, HostValue)>) -> Self {
        HostValue::Object(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Type tag used by shallow equality ("differing types are unequal").
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::Str(_) => "string",
            HostValue::Function(_) => "function",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
        }
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(self, HostValue::Function(_))
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, HostValue::Undefined)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key on an object value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<HostValue> {
        match self {
            HostValue::Object(obj) => obj.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// Pointer identity of a compound value, used for cycle detection.
    #[must_use]
    pub fn identity(&self) -> Option<usize> {
        match self {
            HostValue::Function(f) => Some(Rc::as_ptr(f) as usize),
            HostValue::Array(a) => Some(Rc::as_ptr(a).cast::<u8>() as usize),
            HostValue::Object(o) => Some(Rc::as_ptr(o).cast::<u8>() as usize),
            _ => None,
        }
    }

    /// Strict equality: primitives by value (NaN is never equal), compounds by reference.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn strict_equals(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) | (HostValue::Null, HostValue::Null) => {
                true
            }
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Function(a), HostValue::Function(b)) => Rc::ptr_eq(a, b),
            (HostValue::Array(a), HostValue::Array(b)) => Rc::ptr_eq(a, b),
            (HostValue::Object(a), HostValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// String coercion with the host's `String(value)` semantics.
    #[must_use]
    pub fn coerce_string(&self) -> String {
        let mut seen = Vec::new();
        self.coerce_into(&mut seen)
    }

    fn coerce_into(&self, seen: &mut Vec<usize>) -> String {
        match self {
            HostValue::Undefined => "undefined".to_string(),
            HostValue::Null => "null".to_string(),
            HostValue::Bool(b) => b.to_string(),
            HostValue::Number(n) => format_number(*n),
            HostValue::Str(s) => s.to_string(),
            HostValue::Function(f) => format!("function {}() {{}}", f.name),
            HostValue::Object(_) => "[object Object]".to_string(),
            HostValue::Array(items) => {
                let Some(id) = self.identity() else { return String::new() };
                // A self-referencing array joins to an empty string at the cycle.
                if seen.contains(&id) {
                    return String::new();
                }
                seen.push(id);
                let joined = items
                    .borrow()
                    .iter()
                    .map(|item| match item {
                        HostValue::Undefined | HostValue::Null => String::new(),
                        other => other.coerce_into(seen),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                seen.pop();
                joined
            }
        }
    }
}

/// Shallow equality used for hook-slot comparison.
///
/// Identical references are equal; values of different types are unequal;
/// arrays are equal when they have the same length and every element is
/// strictly equal; objects are equal when they have identical key sets and
/// every value is strictly equal; everything else compares strictly.
#[must_use]
pub fn shallow_equal(a: &HostValue, b: &HostValue) -> bool {
    if a.strict_equals(b) {
        return true;
    }
    match (a, b) {
        (HostValue::Array(x), HostValue::Array(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| l.strict_equals(r))
        }
        (HostValue::Object(x), HostValue::Object(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().all(|(key, l)| y.get(key).is_some_and(|r| l.strict_equals(r)))
        }
        _ => false,
    }
}

/// Number to string the way the host prints numbers (`1`, `1.5`, `NaN`).
#[must_use]
#[allow(clippy::float_cmp)]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

impl fmt::Debug for HostValue {
    // Compound values print a summary only; they may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => f.write_str("undefined"),
            HostValue::Null => f.write_str("null"),
            HostValue::Bool(b) => write!(f, "{b}"),
            HostValue::Number(n) => f.write_str(&format_number(*n)),
            HostValue::Str(s) => write!(f, "{s:?}"),
            HostValue::Function(func) => write!(f, "[Function {}]", func.name),
            HostValue::Array(items) => write!(f, "Array({})", items.borrow().len()),
            HostValue::Object(obj) => write!(f, "Object({} keys)", obj.borrow().len()),
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::string(s)
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(Rc::from(s))
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(f64::from(n))
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}
