//! Read snapshots.

use crate::cache::TableCache;
use parking_lot::Mutex;
use std::sync::Arc;
use vista_core::{Error, ReadSnapshot, Result, Row, RowId, TableSet, Value};

/// A consistent read view of committed state.
///
/// Every successful read records the table it read, so an observation can
/// learn which tables its fetch depends on.
#[derive(Debug)]
pub struct Snapshot {
    tables: Arc<TableCache>,
    accessed: Mutex<TableSet>,
}

impl Snapshot {
    pub(crate) fn new(tables: Arc<TableCache>) -> Self {
        Self {
            tables,
            accessed: Mutex::new(TableSet::new()),
        }
    }

    /// Returns every row of a table, in row id order.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>> {
        let store = self.tables.table(table)?;
        self.record(table);
        Ok(store.scan().cloned().collect())
    }

    /// Returns one row of a table.
    pub fn get(&self, table: &str, row_id: RowId) -> Result<Option<Row>> {
        let store = self.tables.table(table)?;
        self.record(table);
        Ok(store.get(row_id).cloned())
    }

    /// Returns the number of rows of a table.
    pub fn count(&self, table: &str) -> Result<usize> {
        let store = self.tables.table(table)?;
        self.record(table);
        Ok(store.len())
    }

    /// Returns one column of every row of a table, in row id order.
    pub fn column(&self, table: &str, column: &str) -> Result<Vec<Value>> {
        let store = self.tables.table(table)?;
        let index = store
            .column_index(column)
            .ok_or_else(|| Error::column_not_found(table, column))?;
        self.record(table);
        Ok(store
            .scan()
            .map(|row| row.get(index).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Returns true if the table exists. Schema lookups are not recorded as
    /// reads.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.has_table(table)
    }

    fn record(&self, table: &str) {
        self.accessed.lock().insert(table);
    }
}

impl Clone for Snapshot {
    /// The clone reads the same committed state and records its own reads.
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.tables))
    }
}

impl ReadSnapshot for Snapshot {
    fn accessed_tables(&self) -> TableSet {
        self.accessed.lock().clone()
    }
}
