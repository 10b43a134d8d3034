//! Parsed values and the namespace a parse produces.
//!
//! A [`Namespace`] maps canonical entity names to [`Value`]s. Subcommands
//! contribute a nested namespace under their own name, so the result of a
//! parse is a tree of namespaces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

/// A dynamically-typed value produced by an entity's handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value (`None` in a default, for instance)
    None,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Unconverted or string-typed value
    Str(String),
    /// Ordered list (also used for tuples)
    List(Vec<Value>),
    /// Nested namespace, e.g. a subcommand's result
    Map(Namespace),
}

impl Value {
    /// Borrow as a string slice if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view of a `Float` or an `Int`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Boolean view of a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the items of a `List`
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the nested namespace of a `Map`
    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Value::Map(ns) => Some(ns),
            _ => None,
        }
    }

    /// Whether this is `Value::None`
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(ns) => write!(f, "{{{}}}", ns.pretty(", ", ": ")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Namespace> for Value {
    fn from(ns: Namespace) -> Self {
        Value::Map(ns)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::None)
    }
}

/// Flat mapping of canonical entity name to parsed value.
///
/// Built fresh by every parse and handed to the caller; nothing in the
/// parser keeps a reference to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace {
    entries: BTreeMap<String, Value>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Mutable access to a value by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries.get_mut(name)
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Remove a value by name
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    /// Whether a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the namespace has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Values in name order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `other` on top of this namespace; `other` wins on conflict
    pub fn merge(&mut self, other: Namespace) {
        self.entries.extend(other.entries);
    }

    /// Render as `name<sep>value` pairs joined by `delim`
    pub fn pretty(&self, delim: &str, sep: &str) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}{}{}", k, sep, v))
            .collect::<Vec<_>>()
            .join(delim)
    }

    /// Serialize to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Index<&str> for Namespace {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.entries.get(name) {
            Some(value) => value,
            None => panic!("no entry named {:?} in namespace", name),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for Namespace {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_equality_ignores_insert_order() {
        let mut a = Namespace::new();
        a.insert("b", 2);
        a.insert("a", "x");
        let b: Namespace = [("a", Value::from("x")), ("b", Value::from(2))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_overrides() {
        let mut defaults: Namespace = [("flag", 3), ("arg", 2)].into_iter().collect();
        let parsed: Namespace = [("flag", "2")].into_iter().collect();
        defaults.merge(parsed);
        assert_eq!(defaults["flag"], Value::from("2"));
        assert_eq!(defaults["arg"], Value::from(2));
    }

    #[test]
    fn test_nested_json() {
        let inner: Namespace = [("transition", "20")].into_iter().collect();
        let mut outer = Namespace::new();
        outer.insert("preview", inner);
        outer.insert("find", Value::None);
        let json = outer.to_json();
        assert_eq!(json["preview"]["transition"], "20");
        assert!(json["find"].is_null());
    }

    #[test]
    fn test_pretty_and_display() {
        let ns: Namespace = [
            ("consumed", Value::from(vec![Value::from(8), Value::from("d")])),
            ("first", Value::from("one")),
        ]
        .into_iter()
        .collect();
        assert_eq!(ns.pretty("\n", ": "), "consumed: [8, d]\nfirst: one");
    }

    #[test]
    fn test_untagged_deserialize() {
        let v: Value = serde_json::from_str("[1, 2.5, \"x\", true, null]").unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Bool(true),
                Value::None,
            ])
        );
    }
}
