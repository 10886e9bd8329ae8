//! BTreeMap-based index buckets
//!
//! Each index maps a key to the list of record ids carrying that key.
//! Ids inside a bucket are always sorted ascending and never duplicated.

use std::collections::BTreeMap;

use crate::record::RecordId;

/// A single secondary index: key -> sorted record ids.
#[derive(Debug, Clone)]
pub struct IndexTree<K: Ord> {
    tree: BTreeMap<K, Vec<RecordId>>,
}

impl<K: Ord> Default for IndexTree<K> {
    fn default() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }
}

impl<K: Ord> IndexTree<K> {
    /// Creates a new empty index tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an id under a key, creating the bucket if absent.
    ///
    /// Maintains ascending order; inserting an id twice is a no-op.
    pub fn insert(&mut self, key: K, id: RecordId) {
        let ids = self.tree.entry(key).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
    }

    /// Remove an id from a key's bucket.
    ///
    /// Empty buckets are dropped so no stale keys survive.
    pub fn remove(&mut self, key: &K, id: RecordId) {
        if let Some(ids) = self.tree.get_mut(key) {
            if let Ok(pos) = ids.binary_search(&id) {
                ids.remove(pos);
            }
            if ids.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Lookup all ids for an exact key match, sorted ascending.
    pub fn lookup_eq(&self, key: &K) -> Vec<RecordId> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns the total number of ids across all buckets
    pub fn id_count(&self) -> usize {
        self.tree.values().map(|v| v.len()).sum()
    }
}
