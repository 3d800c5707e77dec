//! Insertion-ordered attribute sets.
//!
//! HTML attribute order is not significant for correctness, but the engine
//! serializes attribute sets deterministically so that rewrites are
//! testable and stable across renders. Keys are unique; inserting an
//! existing key overwrites its value in place without moving it.

use std::fmt;

/// The mutable set of attributes on one element.
///
/// Backed by a vector because attribute sets are small (rarely more than a
/// couple dozen entries) and iteration order must match discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    entries: Vec<(String, String)>,
}

impl AttributeSet {
    /// Creates an empty attribute set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a set from `(name, value)` pairs, later pairs overwriting
    /// earlier ones with the same name.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.insert(name, value);
        }
        set
    }

    /// Returns the value of the attribute `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the attribute `name` is present, even with an
    /// empty value (bare marker attributes have empty values).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Inserts or overwrites an attribute. An existing key keeps its
    /// position; a new key is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Removes an attribute, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the attribute names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of attributes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges `other` into `self`, with `other` winning on key collision.
    pub fn merge_from(&mut self, other: &Self) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{name}=\"{value}\"")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_insert_preserves_position_on_overwrite() {
        let mut attrs = AttributeSet::from_pairs([("a", "1"), ("b", "2"), ("c", "3")]);
        attrs.insert("b", "20");

        let names: Vec<_> = attrs.iter().map(|(name, _)| name.to_string()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(attrs.get("b"), Some("20"));
    }

    #[test]
    fn test_contains_with_empty_value() {
        let attrs = AttributeSet::from_pairs([("frond", "")]);
        assert!(attrs.contains("frond"));
        assert_eq!(attrs.get("frond"), Some(""));
    }

    #[test]
    fn test_remove() {
        let mut attrs = AttributeSet::from_pairs([("a", "1"), ("b", "2")]);
        assert_eq!(attrs.remove("a"), Some("1".to_string()));
        assert_eq!(attrs.remove("a"), None);
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_merge_from_other_wins() {
        let mut base = AttributeSet::from_pairs([("id", "x"), ("class", "c")]);
        let caller = AttributeSet::from_pairs([("class", "mine"), ("title", "t")]);
        base.merge_from(&caller);

        assert_eq!(base.get("class"), Some("mine"));
        assert_eq!(base.get("title"), Some("t"));
        let names: Vec<_> = base.iter().map(|(name, _)| name.to_string()).collect();
        assert_eq!(names, ["id", "class", "title"]);
    }
}
