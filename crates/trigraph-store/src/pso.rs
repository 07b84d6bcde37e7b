//! PSO index: `(predicate, subject) -> [object]`.
//!
//! A fixed-capacity, open-addressed table resolved by linear probing from a
//! hash of the key. Slots are `Option<PsoEntry>`: emptiness is a tag on the
//! slot, never a reserved key value, so `(0, 0)` is an ordinary key.
//!
//! The table never resizes. Insertion probes the whole table and reports
//! [`DbError::PsoTableFull`] when no slot is left. Reads follow the
//! configured [`ProbeLimit`]:
//!
//! - `Unbounded` scans until the key or an empty slot is found. Exact.
//! - `Bounded(n)` gives up after `n` slots (home slot plus `n - 1`
//!   successors). Latency is bounded, but a key that was displaced `n` or
//!   more slots from its home by collisions reads as absent. Callers that pick
//!   this mode accept false negatives under heavy load.

use std::hash::BuildHasher;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};
use crate::TermId;

const SEEDS: [u64; 4] = [
    0x9e37_79b9_7f4a_7c15,
    0xbf58_476d_1ce4_e5b9,
    0x94d0_49bb_1331_11eb,
    0x2545_f491_4f6c_dd1d,
];

/// Base capacity of an entry's object list; it doubles from here.
const OBJECT_LIST_BASE: usize = 4;

/// Load factor above which a warning is logged (once per table).
const LOAD_WARN_THRESHOLD: f64 = 0.75;

/// How far a read-side lookup may probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeLimit {
    /// Probe until the key or an empty slot is found.
    #[default]
    Unbounded,
    /// Probe at most this many slots.
    Bounded(usize),
}

impl ProbeLimit {
    /// Home slot plus three successors.
    pub const FAST: ProbeLimit = ProbeLimit::Bounded(4);

    fn max_probes(self, capacity: usize) -> usize {
        match self {
            ProbeLimit::Unbounded => capacity,
            ProbeLimit::Bounded(n) => n.min(capacity),
        }
    }
}

/// Objects recorded for one `(predicate, subject)` pair, in insertion order.
/// Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsoEntry {
    predicate: TermId,
    subject: TermId,
    objects: Vec<TermId>,
}

impl PsoEntry {
    fn new(predicate: TermId, subject: TermId) -> Self {
        Self {
            predicate,
            subject,
            objects: Vec::new(),
        }
    }

    fn is_key(&self, predicate: TermId, subject: TermId) -> bool {
        self.predicate == predicate && self.subject == subject
    }

    pub fn predicate(&self) -> TermId {
        self.predicate
    }

    pub fn subject(&self) -> TermId {
        self.subject
    }

    pub fn objects(&self) -> &[TermId] {
        &self.objects
    }

    pub fn count(&self) -> usize {
        self.objects.len()
    }

    /// Append without deduplicating. Capacity goes 4, 8, 16, ...
    pub fn append_object(&mut self, object: TermId) {
        let cap = self.objects.capacity();
        if self.objects.len() == cap {
            self.objects.reserve_exact(cap.max(OBJECT_LIST_BASE));
        }
        self.objects.push(object);
    }
}

pub struct PsoIndex {
    slots: Vec<Option<PsoEntry>>,
    len: usize,
    probe_limit: ProbeLimit,
    hasher: RandomState,
    load_warned: bool,
}

impl PsoIndex {
    /// A table with `capacity` slots (at least one).
    pub fn new(capacity: usize, probe_limit: ProbeLimit) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            len: 0,
            probe_limit,
            hasher: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
            load_warned: false,
        }
    }

    pub(crate) fn home_slot(&self, predicate: TermId, subject: TermId) -> usize {
        let h = self.hasher.hash_one((predicate.raw(), subject.raw()));
        (h % self.slots.len() as u64) as usize
    }

    /// Entry for the key, claiming an empty slot if the key is new.
    pub fn find_or_create(&mut self, predicate: TermId, subject: TermId) -> Result<&mut PsoEntry> {
        let capacity = self.slots.len();
        let home = self.home_slot(predicate, subject);

        for step in 0..capacity {
            let idx = (home + step) % capacity;
            let claim = match &self.slots[idx] {
                None => true,
                Some(entry) if entry.is_key(predicate, subject) => false,
                Some(_) => continue,
            };
            if claim {
                self.len += 1;
                self.note_load();
            }
            return Ok(self.slots[idx].get_or_insert_with(|| PsoEntry::new(predicate, subject)));
        }

        tracing::error!(
            capacity,
            predicate = predicate.raw(),
            subject = subject.raw(),
            "PSO table exhausted"
        );
        Err(DbError::PsoTableFull { capacity })
    }

    fn note_load(&mut self) {
        if !self.load_warned && self.load_factor() > LOAD_WARN_THRESHOLD {
            self.load_warned = true;
            tracing::warn!(
                len = self.len,
                capacity = self.slots.len(),
                "PSO table load factor above {LOAD_WARN_THRESHOLD}; probe chains will lengthen"
            );
        }
    }

    /// Entry lookup under an explicit probe strategy.
    pub fn entry_with(
        &self,
        predicate: TermId,
        subject: TermId,
        limit: ProbeLimit,
    ) -> Option<&PsoEntry> {
        let capacity = self.slots.len();
        let home = self.home_slot(predicate, subject);

        for step in 0..limit.max_probes(capacity) {
            match &self.slots[(home + step) % capacity] {
                None => return None,
                Some(entry) if entry.is_key(predicate, subject) => return Some(entry),
                Some(_) => {}
            }
        }
        None
    }

    /// Entry lookup under the table's configured probe strategy.
    pub fn entry(&self, predicate: TermId, subject: TermId) -> Option<&PsoEntry> {
        self.entry_with(predicate, subject, self.probe_limit)
    }

    /// Objects for the key; empty when the key is unknown (or, with a bounded
    /// probe limit, displaced beyond reach).
    pub fn lookup(&self, predicate: TermId, subject: TermId) -> &[TermId] {
        self.entry(predicate, subject)
            .map(PsoEntry::objects)
            .unwrap_or(&[])
    }

    pub fn lookup_with(&self, predicate: TermId, subject: TermId, limit: ProbeLimit) -> &[TermId] {
        self.entry_with(predicate, subject, limit)
            .map(PsoEntry::objects)
            .unwrap_or(&[])
    }

    pub fn probe_limit(&self) -> ProbeLimit {
        self.probe_limit
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.slots.len() as f64
    }

    /// Occupied entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &PsoEntry> + '_ {
        self.slots.iter().flatten()
    }
}

impl std::fmt::Debug for PsoIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PsoIndex")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("probe_limit", &self.probe_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> TermId {
        TermId::new(raw)
    }

    /// `count` distinct subjects whose key `(predicate, s)` hashes to `slot`.
    fn colliding_subjects(index: &PsoIndex, predicate: TermId, slot: usize, count: usize) -> Vec<TermId> {
        (0u32..)
            .map(TermId::new)
            .filter(|&s| index.home_slot(predicate, s) == slot)
            .take(count)
            .collect()
    }

    #[test]
    fn zero_zero_is_an_ordinary_key() {
        let mut index = PsoIndex::new(16, ProbeLimit::Unbounded);
        assert!(index.lookup(id(0), id(0)).is_empty());

        index.find_or_create(id(0), id(0)).unwrap().append_object(id(0));
        assert_eq!(index.lookup(id(0), id(0)), &[id(0)]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn find_or_create_returns_the_same_entry() {
        let mut index = PsoIndex::new(16, ProbeLimit::Unbounded);
        index.find_or_create(id(1), id(2)).unwrap().append_object(id(3));
        index.find_or_create(id(1), id(2)).unwrap().append_object(id(3));
        index.find_or_create(id(1), id(2)).unwrap().append_object(id(4));

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(id(1), id(2)), &[id(3), id(3), id(4)]);
    }

    #[test]
    fn object_list_capacity_doubles_from_four() {
        let mut entry = PsoEntry::new(id(0), id(0));
        entry.append_object(id(1));
        assert_eq!(entry.objects.capacity(), 4);
        for o in 2..=5 {
            entry.append_object(id(o));
        }
        assert_eq!(entry.objects.capacity(), 8);
        assert_eq!(entry.count(), 5);
    }

    #[test]
    fn full_table_is_reported() {
        let mut index = PsoIndex::new(2, ProbeLimit::Unbounded);
        index.find_or_create(id(1), id(1)).unwrap();
        index.find_or_create(id(1), id(2)).unwrap();

        // Existing keys remain reachable in a full table.
        assert!(index.find_or_create(id(1), id(1)).is_ok());

        let err = index.find_or_create(id(1), id(3)).unwrap_err();
        assert!(matches!(err, DbError::PsoTableFull { capacity: 2 }));
        assert!(index.lookup(id(1), id(3)).is_empty());
    }

    #[test]
    fn bounded_probe_misses_displaced_keys() {
        let predicate = id(7);
        let mut index = PsoIndex::new(64, ProbeLimit::FAST);
        let subjects = colliding_subjects(&index, predicate, 0, 5);

        for &s in &subjects {
            index.find_or_create(predicate, s).unwrap().append_object(s);
        }

        // First four fit inside the home slot + 3 successors.
        for &s in &subjects[..4] {
            assert_eq!(index.lookup(predicate, s), &[s]);
        }

        let displaced = subjects[4];
        assert!(index.lookup(predicate, displaced).is_empty());
        assert_eq!(
            index.lookup_with(predicate, displaced, ProbeLimit::Unbounded),
            &[displaced]
        );
    }

    #[test]
    fn probing_wraps_around_the_table_end() {
        let predicate = id(3);
        let mut index = PsoIndex::new(8, ProbeLimit::Unbounded);
        let subjects = colliding_subjects(&index, predicate, 7, 3);

        for &s in &subjects {
            index.find_or_create(predicate, s).unwrap().append_object(s);
        }
        for &s in &subjects {
            assert_eq!(index.lookup(predicate, s), &[s]);
        }
    }

    #[test]
    fn iter_visits_every_entry() {
        let mut index = PsoIndex::new(32, ProbeLimit::Unbounded);
        for s in 0..10 {
            index.find_or_create(id(1), id(s)).unwrap().append_object(id(100 + s));
        }
        let mut subjects: Vec<u32> = index.iter().map(|e| e.subject().raw()).collect();
        subjects.sort_unstable();
        assert_eq!(subjects, (0..10).collect::<Vec<_>>());
        assert!((index.load_factor() - 10.0 / 32.0).abs() < f64::EPSILON);
    }
}
