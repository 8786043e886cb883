//! KeyIndex implementation
//!
//! Chained hash table with explicit grow/shrink thresholds.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use super::Location;

/// Grow when `len / buckets > GROW_LOAD_FACTOR` (integer division)
pub const GROW_LOAD_FACTOR: usize = 3;

/// Shrink when `len / buckets < SHRINK_LOAD_FACTOR` (integer division)
pub const SHRINK_LOAD_FACTOR: usize = 1;

/// Floor for the bucket count
pub const MIN_BUCKETS: usize = 1;

#[derive(Debug, Clone)]
struct IndexEntry {
    hash: u64,
    key: Vec<u8>,
    location: Location,
}

/// In-memory index from key to value location
pub struct KeyIndex {
    buckets: Vec<Vec<IndexEntry>>,
    len: usize,
    hasher: RandomState,
}

impl KeyIndex {
    /// Create an empty index with a single bucket
    pub fn new() -> Self {
        Self::with_buckets(MIN_BUCKETS)
    }

    /// Create an empty index with `count` buckets (at least one)
    pub fn with_buckets(count: usize) -> Self {
        let count = count.max(MIN_BUCKETS);
        Self {
            buckets: vec![Vec::new(); count],
            len: 0,
            hasher: RandomState::new(),
        }
    }

    /// Insert or replace the location for `key`
    ///
    /// Returns the previous location if the key was already present.
    pub fn set(&mut self, key: Vec<u8>, location: Location) -> Option<Location> {
        let hash = self.hash(&key);
        let slot = self.slot(hash);

        if let Some(entry) = self.buckets[slot]
            .iter_mut()
            .find(|e| e.hash == hash && e.key == key)
        {
            return Some(std::mem::replace(&mut entry.location, location));
        }

        self.buckets[slot].push(IndexEntry {
            hash,
            key,
            location,
        });
        self.len += 1;

        if self.len / self.buckets.len() > GROW_LOAD_FACTOR {
            self.rehash(self.buckets.len() * 2);
        }
        None
    }

    /// Look up the location for `key`
    pub fn get(&self, key: &[u8]) -> Option<Location> {
        let hash = self.hash(key);
        self.buckets[self.slot(hash)]
            .iter()
            .find(|e| e.hash == hash && e.key == key)
            .map(|e| e.location)
    }

    /// Whether `key` has a live location
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key` entirely, returning its last location
    pub fn delete(&mut self, key: &[u8]) -> Option<Location> {
        let hash = self.hash(key);
        let slot = self.slot(hash);
        let bucket = &mut self.buckets[slot];
        let pos = bucket.iter().position(|e| e.hash == hash && e.key == key)?;
        let removed = bucket.swap_remove(pos);
        self.len -= 1;

        let buckets = self.buckets.len();
        if buckets > MIN_BUCKETS && self.len < SHRINK_LOAD_FACTOR * buckets {
            self.rehash(buckets / 2);
        }
        Some(removed.location)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Iterate over all `(key, location)` pairs in unspecified order
    pub fn iter(&self) -> IndexIter<'_> {
        IndexIter {
            buckets: self.buckets.iter(),
            current: Default::default(),
        }
    }

    /// Sum of all value lengths (live bytes referenced by the index)
    pub fn live_value_bytes(&self) -> u64 {
        self.iter().map(|(_, loc)| loc.length).sum()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn hash(&self, key: &[u8]) -> u64 {
        self.hasher.hash_one(key)
    }

    fn slot(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Move every entry into a fresh bucket array of `new_count` buckets
    fn rehash(&mut self, new_count: usize) {
        let new_count = new_count.max(MIN_BUCKETS);
        let old = std::mem::replace(&mut self.buckets, vec![Vec::new(); new_count]);
        for entry in old.into_iter().flatten() {
            let slot = self.slot(entry.hash);
            self.buckets[slot].push(entry);
        }
        tracing::trace!(buckets = new_count, len = self.len, "key index rehashed");
    }
}

impl Default for KeyIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over KeyIndex entries
pub struct IndexIter<'a> {
    buckets: std::slice::Iter<'a, Vec<IndexEntry>>,
    current: std::slice::Iter<'a, IndexEntry>,
}

impl<'a> Iterator for IndexIter<'a> {
    type Item = (&'a [u8], Location);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some((entry.key.as_slice(), entry.location));
            }
            self.current = self.buckets.next()?.iter();
        }
    }
}
