//! Error taxonomy for the store.
//!
//! The set is deliberately small. Lookups never fail: unknown subjects,
//! predicates and objects produce empty results. The only runtime error is a
//! PSO table that was sized too small for the workload; everything else is
//! configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Linear probing visited every slot without finding the key or a free
    /// slot. The table does not resize; raise `DbConfig::pso_capacity`.
    #[error("PSO table is full ({capacity} slots); configure a larger pso_capacity")]
    PsoTableFull { capacity: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
