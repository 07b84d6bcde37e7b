//! Shared handle for embedders that interleave ingestion and queries across
//! threads.
//!
//! `TripleDB` itself has no locking. Ingestion reallocates bit sets and
//! per-id columns in place, so a reader must never observe the store while a
//! writer is active. `SharedTripleDB` makes that discipline concrete with a
//! read/write lock: any number of readers, or exactly one writer.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::db::TripleDB;
use crate::error::Result;
use crate::{TermId, Triple};

#[derive(Clone, Default)]
pub struct SharedTripleDB {
    inner: Arc<RwLock<TripleDB>>,
}

impl SharedTripleDB {
    pub fn new(db: TripleDB) -> Self {
        Self {
            inner: Arc::new(RwLock::new(db)),
        }
    }

    /// Shared read access; blocks while a writer holds the lock.
    pub fn read(&self) -> RwLockReadGuard<'_, TripleDB> {
        self.inner.read()
    }

    /// Exclusive access for ingestion.
    pub fn write(&self) -> RwLockWriteGuard<'_, TripleDB> {
        self.inner.write()
    }

    pub fn intern(&self, text: &str) -> TermId {
        self.inner.write().intern(text)
    }

    pub fn add_triple(&self, subject: TermId, predicate: TermId, object: TermId) -> Result<()> {
        self.inner.write().add_triple(subject, predicate, object)
    }

    /// Ingest a batch under a single write lock.
    pub fn add_triples(&self, triples: impl IntoIterator<Item = Triple>) -> Result<usize> {
        let mut db = self.inner.write();
        let mut added = 0;
        for t in triples {
            db.add_triple(t.subject, t.predicate, t.object)?;
            added += 1;
        }
        Ok(added)
    }

    /// The store, if this is the last handle.
    pub fn try_into_inner(self) -> std::result::Result<TripleDB, Self> {
        Arc::try_unwrap(self.inner)
            .map(|lock| lock.into_inner())
            .map_err(|inner| Self { inner })
    }
}

impl std::fmt::Debug for SharedTripleDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTripleDB")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
