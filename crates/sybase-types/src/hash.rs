//! Insertion-ordered string-keyed map.
//!
//! Result rows, columnar result sets and multi-result wrappers are all
//! represented as a [`Hash`]. Key order is the order of insertion, which for
//! rows is the column order of the result set.

use crate::value::Value;

/// Insertion-ordered map from column or result names to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hash {
    entries: Vec<(String, Value)>,
}

impl Hash {
    /// Create an empty hash.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty hash with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the hash has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Get a mutable value by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Insert a value, replacing and returning any previous value under the key.
    ///
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns `name` if unused, otherwise the first free `name_1`, `name_2`, ...
    #[must_use]
    pub fn unique_key(&self, name: &str) -> String {
        if !self.contains_key(name) {
            return name.to_owned();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{name}_{n}");
            if !self.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Insert under a unique key derived from `name`; returns the key used.
    pub fn insert_unique(&mut self, name: &str, value: Value) -> String {
        let key = self.unique_key(name);
        self.entries.push((key.clone(), value));
        key
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// The first entry in insertion order.
    #[must_use]
    pub fn first(&self) -> Option<(&str, &Value)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v))
    }

    /// Entry at a position in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&str, &Value)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable value at a position in insertion order.
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.entries.get_mut(index).map(|(_, v)| v)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume the hash, yielding values in insertion order.
    pub fn into_values(self) -> impl Iterator<Item = Value> {
        self.entries.into_iter().map(|(_, v)| v)
    }
}

impl IntoIterator for Hash {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Hash {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut hash = Self::new();
        for (k, v) in iter {
            hash.insert(k, v);
        }
        hash
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order() {
        let mut h = Hash::new();
        h.insert("b", Value::Int(1));
        h.insert("a", Value::Int(2));
        h.insert("b", Value::Int(3));
        assert_eq!(h.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(h.get("b"), Some(&Value::Int(3)));
        assert_eq!(h.first().unwrap().0, "b");
    }

    #[test]
    fn test_unique_keys() {
        let mut h = Hash::new();
        assert_eq!(h.insert_unique("x", Value::Null), "x");
        assert_eq!(h.insert_unique("x", Value::Null), "x_1");
        assert_eq!(h.insert_unique("x", Value::Null), "x_2");
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_remove() {
        let mut h: Hash = [("a", Value::Int(1)), ("b", Value::Int(2))]
            .into_iter()
            .collect();
        assert_eq!(h.remove("a"), Some(Value::Int(1)));
        assert_eq!(h.get_index(0).unwrap().0, "b");
        assert!(h.remove("a").is_none());
    }
}
