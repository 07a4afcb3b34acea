//! Synchronization triggers.
//!
//! A `SyncTrigger` mirrors every write on a source table into a target table
//! within the same transaction, keeping row ids aligned. This is how a
//! full-text index stays in sync with its content table: the commit's
//! write-set then contains both tables.

use std::fmt;
use std::sync::Arc;
use vista_core::{Row, Value};

/// Maps a source row to the values of its mirrored target row.
pub type RowMapper = Arc<dyn Fn(&Row) -> Vec<Value> + Send + Sync>;

/// Trigger mirroring writes from one table into another.
#[derive(Clone)]
pub struct SyncTrigger {
    source: String,
    target: String,
    mapper: RowMapper,
}

impl SyncTrigger {
    /// Creates a trigger from `source` into `target`.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        mapper: impl Fn(&Row) -> Vec<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mapper: Arc::new(mapper),
        }
    }

    /// Returns the source table name.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the target table name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns true if writes on `table` fire this trigger.
    pub fn fires_on(&self, table: &str) -> bool {
        self.source.eq_ignore_ascii_case(table)
    }

    /// Builds the target row mirroring `row`.
    pub fn map(&self, row: &Row) -> Row {
        Row::new(row.id(), (self.mapper)(row))
    }
}

impl fmt::Debug for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncTrigger")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
