//! Trigraph: an in-memory subject–predicate–object triple index.
//!
//! Key structures:
//! 1. **String Interning**: every term is stored once and referenced by a
//!    dense `u32` id ([`TermId`])
//! 2. **Subject Bit Sets**: per predicate and per object value, the set of
//!    subjects that used it, so `(?s, p, o)` is one bitwise AND
//! 3. **PSO Index**: open-addressed `(predicate, subject) -> [object]` table,
//!    the source of truth for per-subject cardinality
//! 4. **Type Tags**: one class id per term for class-membership checks
//!
//! On top of those sit the constraint primitives (`has_property`,
//! `min_count`, `max_count`, `has_class`, `validate`) and SHACL-style
//! [`shape`] reports.
//!
//! ## Access contract
//!
//! The store has no internal locking. Ingestion (`add_triple`, `set_class`)
//! takes `&mut TripleDB`; every query takes `&TripleDB`. Ingestion grows
//! arrays and bit sets in place, so readers and the writer must never
//! overlap: either finish ingesting before sharing `&TripleDB` across
//! threads, or wrap the store in [`SharedTripleDB`].
//!
//! ## Failure model
//!
//! Unknown ids are never errors; they read as empty. The only runtime error
//! is [`DbError::PsoTableFull`], which means the PSO table was configured too
//! small for the workload. Allocation failure aborts the process.

pub mod bitset;
pub mod config;
mod constraints;
mod db;
pub mod error;
pub mod interner;
pub mod pso;
pub mod shape;
mod shared;

use serde::{Deserialize, Serialize};

pub use bitset::BitSet;
pub use config::DbConfig;
pub use db::{DbStats, TripleDB};
pub use error::{DbError, Result};
pub use interner::StringTable;
pub use pso::{ProbeLimit, PsoEntry, PsoIndex};
pub use shape::{NodeShape, PropertyShape, ValidationReport, Violation};
pub use shared::SharedTripleDB;

// ============================================================================
// Identifiers
// ============================================================================

/// Interned term id (4 bytes). Dense, assigned from 0, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TermId(u32);

impl TermId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TermId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One graph edge, as ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: TermId,
    pub predicate: TermId,
    pub object: TermId,
}

impl Triple {
    pub fn new(subject: TermId, predicate: TermId, object: TermId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut db = TripleDB::new();

        let alice = db.intern("Alice");
        let bob = db.intern("Bob");
        let knows = db.intern("knows");

        db.add_triple(alice, knows, bob).unwrap();

        assert_eq!(db.objects_of(knows, alice), &[bob]);
        assert!(db.subjects_with(knows, bob).test(alice.raw()));
        assert!(!db.subjects_with(knows, alice).test(bob.raw()));
        assert_eq!(db.resolve(bob), Some("Bob"));
    }

    #[test]
    fn term_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&TermId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: TermId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TermId::new(42));
    }
}
