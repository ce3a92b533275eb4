//! Bijection between external string ids and dense matrix indices.

use std::collections::HashMap;

/// Maps external ids to dense `0..len` indices and back.
///
/// Indices are handed out in first-seen order and never reused or removed,
/// so `index_of(id_of(i)) == Some(i)` holds for every valid `i`. A model
/// builds a fresh mapping on every rebuild instead of mutating an old one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexMapping {
    to_index: HashMap<String, usize>,
    to_id: Vec<String>,
}

impl IndexMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `id`, assigning the next free one if it is new.
    pub fn get_or_insert(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.to_index.get(id) {
            return idx;
        }
        let idx = self.to_id.len();
        self.to_index.insert(id.to_string(), idx);
        self.to_id.push(id.to_string());
        idx
    }

    /// Insert `id` only if unseen. Returns the new index, or `None` for a duplicate.
    pub fn insert_new(&mut self, id: &str) -> Option<usize> {
        if self.to_index.contains_key(id) {
            return None;
        }
        Some(self.get_or_insert(id))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.to_index.get(id).copied()
    }

    pub fn id_of(&self, idx: usize) -> Option<&str> {
        self.to_id.get(idx).map(|s| s.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.to_index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_id.is_empty()
    }

    /// Ids in index order
    pub fn ids(&self) -> &[String] {
        &self.to_id
    }
}

impl<S: AsRef<str>> FromIterator<S> for IndexMapping {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut mapping = IndexMapping::new();
        for id in iter {
            mapping.get_or_insert(id.as_ref());
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mapping: IndexMapping = ["b", "a", "b", "c"].into_iter().collect();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.index_of("b"), Some(0));
        assert_eq!(mapping.index_of("a"), Some(1));
        assert_eq!(mapping.index_of("c"), Some(2));
        assert_eq!(mapping.ids(), &["b", "a", "c"]);
    }

    #[test]
    fn test_bijection() {
        let mapping: IndexMapping = ["x", "y", "z", "x", "y"].into_iter().collect();
        for i in 0..mapping.len() {
            let id = mapping.id_of(i).unwrap();
            assert_eq!(mapping.index_of(id), Some(i));
        }
        assert_eq!(mapping.id_of(mapping.len()), None);
    }

    #[test]
    fn test_insert_new_rejects_duplicates() {
        let mut mapping = IndexMapping::new();
        assert_eq!(mapping.insert_new("m1"), Some(0));
        assert_eq!(mapping.insert_new("m1"), None);
        assert_eq!(mapping.insert_new("m2"), Some(1));
    }
}
