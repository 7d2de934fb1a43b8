//! Per-chunk persistent storage for iterative calculations

use std::collections::BTreeMap;

use super::ChunkKey;
use crate::core_types::VarMap;

/// Chunk-local values persisted between iterations
pub type StoreFragment = VarMap;

/// Chunk store keyed by chunk position
///
/// Fragments travel with their chunk to whichever worker computes it and
/// come back with the chunk result, so the store is only touched by the
/// coordinating thread.
#[derive(Debug, Default, Clone)]
pub struct ChunkStore {
    fragments: BTreeMap<ChunkKey, StoreFragment>,
}

impl ChunkStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return a chunk's fragment, empty if none was stored
    pub fn take(&mut self, key: ChunkKey) -> StoreFragment {
        self.fragments.remove(&key).unwrap_or_default()
    }

    /// Store a chunk's fragment, replacing any previous one
    pub fn insert(&mut self, key: ChunkKey, fragment: StoreFragment) {
        self.fragments.insert(key, fragment);
    }

    /// Fragment of a chunk
    #[must_use]
    pub fn get(&self, key: ChunkKey) -> Option<&StoreFragment> {
        self.fragments.get(&key)
    }

    /// Drop every fragment
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// True if no fragment is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of stored fragments
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Axis, VarArray};

    #[test]
    fn test_take_removes_fragment() {
        let mut store = ChunkStore::new();
        let key = ChunkKey::new(1, 0);
        let mut fragment = StoreFragment::default();
        fragment.insert("CT".to_string(), VarArray::from_1d(Axis::State, vec![0.8]));
        store.insert(key, fragment);
        assert_eq!(store.len(), 1);
        assert!(store.get(key).is_some());

        let taken = store.take(key);
        assert!(taken.contains_key("CT"));
        assert!(store.is_empty());
        assert!(store.take(key).is_empty());
    }
}
