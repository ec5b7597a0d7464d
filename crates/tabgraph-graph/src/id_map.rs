//! External id -> dense index remapping.
//!
//! Ids arrive duplicated and in arbitrary order. The first occurrence of an id
//! claims the next free index; later occurrences resolve to that same index.

use ahash::AHashMap;

/// Insertion-ordered map from external 64-bit ids to `0..len` indices.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    index: AHashMap<i64, usize>,
    ids: Vec<i64>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: AHashMap::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Map `id`, returning its dense index and whether this call assigned it.
    pub fn insert(&mut self, id: i64) -> (usize, bool) {
        if let Some(&idx) = self.index.get(&id) {
            return (idx, false);
        }
        let idx = self.ids.len();
        self.index.insert(id, idx);
        self.ids.push(id);
        (idx, true)
    }

    pub fn get(&self, id: i64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// External ids in index order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Dedupe `ids`, returning the map and the row of each id's first occurrence
/// (in index order).
pub fn first_occurrences(ids: &[i64]) -> (IdMap, Vec<usize>) {
    let mut map = IdMap::with_capacity(ids.len());
    let mut rows = Vec::with_capacity(ids.len());
    for (row, &id) in ids.iter().enumerate() {
        if map.insert(id).1 {
            rows.push(row);
        }
    }
    (map, rows)
}
