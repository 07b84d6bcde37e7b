//! Store configuration.
//!
//! Every table in the store is sized once, up front. The PSO table in
//! particular never resizes, so `pso_capacity` must exceed the number of
//! distinct `(predicate, subject)` pairs the embedding application will
//! submit.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};
use crate::pso::ProbeLimit;

/// Configuration for a [`crate::TripleDB`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Number of slots in the open-addressed PSO table.
    pub pso_capacity: usize,
    /// Number of chained buckets in the string intern table.
    pub intern_buckets: usize,
    /// Initial length of the per-identifier arrays (bit set tables, property
    /// counters, type tags). They double from here as identifiers arrive.
    pub initial_id_capacity: usize,
    /// Probe strategy for read-side PSO lookups.
    pub probe_limit: ProbeLimit,
    /// Predicate whose triples also tag the subject's class
    /// (e.g. `"rdf:type"`). Interned when the store is created.
    pub type_predicate: Option<String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            pso_capacity: 1 << 16,
            intern_buckets: 4096,
            initial_id_capacity: 64,
            probe_limit: ProbeLimit::Unbounded,
            type_predicate: None,
        }
    }
}

impl DbConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: DbConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pso_capacity == 0 {
            return Err(DbError::InvalidConfig(
                "pso_capacity must be greater than zero".to_string(),
            ));
        }
        if self.intern_buckets == 0 {
            return Err(DbError::InvalidConfig(
                "intern_buckets must be greater than zero".to_string(),
            ));
        }
        if self.probe_limit == ProbeLimit::Bounded(0) {
            return Err(DbError::InvalidConfig(
                "a bounded probe limit must allow at least one probe".to_string(),
            ));
        }
        if let Some(pred) = &self.type_predicate {
            if pred.is_empty() {
                return Err(DbError::InvalidConfig(
                    "type_predicate must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
