//! String interning: text <-> dense `TermId`.
//!
//! Buckets are chained and their number is fixed when the table is built;
//! there is no rehashing, so the bucket count is what keeps chains short.
//! Entries are append-only. Identifiers are handed out in insertion order
//! starting at 0, and `resolve` is a direct index into the dense text table.

use std::hash::BuildHasher;

use ahash::RandomState;

use crate::TermId;

// Fixed seeds keep bucket placement identical between runs.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

pub struct StringTable {
    /// Chains of ids per bucket; the newest entry is at the end and is
    /// scanned first.
    buckets: Vec<Vec<TermId>>,
    /// Dense id -> text table.
    strings: Vec<Box<str>>,
    hasher: RandomState,
}

impl StringTable {
    pub fn with_buckets(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            buckets: vec![Vec::new(); bucket_count],
            strings: Vec::new(),
            hasher: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
        }
    }

    fn bucket_of(&self, text: &str) -> usize {
        (self.hasher.hash_one(text) % self.buckets.len() as u64) as usize
    }

    fn find_in_chain(&self, bucket: usize, text: &str) -> Option<TermId> {
        self.buckets[bucket]
            .iter()
            .rev()
            .copied()
            .find(|id| &*self.strings[id.index()] == text)
    }

    /// Intern `text`, returning its stable id.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&mut self, text: &str) -> TermId {
        let bucket = self.bucket_of(text);
        if let Some(id) = self.find_in_chain(bucket, text) {
            return id;
        }

        let next = self.strings.len();
        assert!(
            next < u32::MAX as usize,
            "string table overflow: cannot intern more than {} strings",
            u32::MAX
        );
        if next == self.strings.capacity() {
            self.strings.reserve_exact(next.max(16));
        }

        let id = TermId::new(next as u32);
        self.strings.push(text.into());
        self.buckets[bucket].push(id);
        id
    }

    /// Id of `text` if it has been interned. Never inserts.
    pub fn id_of(&self, text: &str) -> Option<TermId> {
        self.find_in_chain(self.bucket_of(text), text)
    }

    pub fn resolve(&self, id: TermId) -> Option<&str> {
        self.strings.get(id.index()).map(|s| &**s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the longest chain; a quick check that the bucket count
    /// suits the workload.
    pub fn longest_chain(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::with_buckets(4096)
    }
}

impl std::fmt::Debug for StringTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringTable")
            .field("len", &self.strings.len())
            .field("buckets", &self.buckets.len())
            .finish()
    }
}
