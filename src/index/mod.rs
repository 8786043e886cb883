//! Key Index Module
//!
//! Volatile map from key to the location of its latest value in the log.
//!
//! ## Responsibilities
//! - Point lookups of value locations in O(1) expected time
//! - Upsert on every successful set, removal on every delete
//! - Load-factor driven growth and shrinkage of the bucket array
//!
//! ## Data Structure Choice
//! Chained buckets (`Vec<Vec<IndexEntry>>`) keyed by a 64-bit hash:
//! - Keys inside a bucket are compared by full byte equality, so a hash
//!   collision never produces a false match
//! - Resize thresholds are explicit instead of inherited from `HashMap`:
//!   grow (double) when `len / buckets > 3`, shrink (halve, never below one
//!   bucket) when `len / buckets < 1`, both in integer division, so a table
//!   of `n` buckets grows on reaching `4 * n` keys
//!
//! The index is never persisted; `Engine::open` rebuilds it from the log.

mod table;

pub use table::{IndexIter, KeyIndex, GROW_LOAD_FACTOR, MIN_BUCKETS, SHRINK_LOAD_FACTOR};

/// Position of a value's bytes inside the current log file
///
/// Points at the value payload, never at the record header. A location is
/// valid until the key is rewritten, deleted, or the log is compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Absolute byte offset of the first value byte
    pub offset: u64,

    /// Number of value bytes
    pub length: u64,
}

impl Location {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Offset one past the last value byte
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}
