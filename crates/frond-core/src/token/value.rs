//! Invocation variable values.

use std::fmt;

use serde_json::Value as JsonValue;

/// A variable value supplied to a component invocation.
///
/// Only scalars (and, policy permitting, arrays whose leaves are scalars)
/// can be encoded into tokens. [`Variable::Element`] and
/// [`Variable::Model`] represent references to host-owned domain objects;
/// they may flow through hooks but are always rejected by the codec, with a
/// distinct error kind per category so the caller can render a precise
/// diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// Absent value; canonicalizes to the empty string.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// Array of values. Encodable only when every leaf is a scalar and the
    /// array policy is lenient.
    Array(Vec<Variable>),
    /// Arbitrary JSON object. Never encodable.
    Object(serde_json::Map<String, JsonValue>),
    /// A site element reference owned by the host, identified by its type
    /// name for diagnostics. Never encodable.
    Element(String),
    /// A structured model owned by the host, identified by its type name
    /// for diagnostics. Never encodable.
    Model(String),
}

/// The category of a value rejected by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// A site element reference.
    Element,
    /// A structured model.
    Model,
    /// An arbitrary object.
    Object,
    /// An array (rejected under the strict policy).
    Array,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Element => "element",
            Self::Model => "model",
            Self::Object => "object",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

impl Variable {
    /// Converts the value to its JSON representation. Returns `None` for
    /// host-owned values that have no JSON form.
    #[must_use]
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            Self::Null => Some(JsonValue::Null),
            Self::Bool(b) => Some(JsonValue::Bool(*b)),
            Self::Int(n) => Some(JsonValue::from(*n)),
            Self::Float(n) => Some(JsonValue::from(*n)),
            Self::String(s) => Some(JsonValue::String(s.clone())),
            Self::Array(items) => {
                let values: Option<Vec<_>> = items.iter().map(Self::to_json).collect();
                Some(JsonValue::Array(values?))
            }
            Self::Object(map) => Some(JsonValue::Object(map.clone())),
            Self::Element(_) | Self::Model(_) => None,
        }
    }
}

impl From<JsonValue> for Variable {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => n.as_i64().map_or_else(
                || Self::Float(n.as_f64().unwrap_or(f64::NAN)),
                Self::Int,
            ),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::Object(map),
        }
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Variable {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Variable {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// An insertion-ordered mapping of variable names to values.
///
/// Order is preserved so that encode failures point at the first offending
/// variable deterministically and serialized state is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMap {
    entries: Vec<(String, Variable)>,
}

impl VariableMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Inserts or overwrites a variable. An existing key keeps its
    /// position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Variable>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of variables in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Variable>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}
