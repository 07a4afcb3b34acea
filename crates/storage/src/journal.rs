//! Journal for tracking changes in a Vista transaction.
//!
//! This module provides the `Journal` struct which records every row change
//! of a transaction, including the changes triggers make. The journal is
//! what determines a commit's write-set.

use vista_core::{Row, RowId, TableSet};

/// A single journal entry representing a change.
#[derive(Clone, Debug, PartialEq)]
pub enum JournalEntry {
    /// A row was inserted.
    Insert { table: String, row: Row },
    /// A row was rewritten, possibly with identical values.
    Update { table: String, old: Row, new: Row },
    /// A row was deleted.
    Delete { table: String, row: Row },
}

impl JournalEntry {
    /// Returns the table name for this entry.
    pub fn table(&self) -> &str {
        match self {
            JournalEntry::Insert { table, .. }
            | JournalEntry::Update { table, .. }
            | JournalEntry::Delete { table, .. } => table,
        }
    }

    /// Returns the row ID for this entry.
    pub fn row_id(&self) -> RowId {
        match self {
            JournalEntry::Insert { row, .. } | JournalEntry::Delete { row, .. } => row.id(),
            JournalEntry::Update { new, .. } => new.id(),
        }
    }
}

/// Ordered record of the changes made by one transaction.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Creates a new empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an insert operation.
    pub fn record_insert(&mut self, table: &str, row: Row) {
        self.entries.push(JournalEntry::Insert {
            table: table.into(),
            row,
        });
    }

    /// Records an update operation.
    pub fn record_update(&mut self, table: &str, old: Row, new: Row) {
        self.entries.push(JournalEntry::Update {
            table: table.into(),
            old,
            new,
        });
    }

    /// Records a delete operation.
    pub fn record_delete(&mut self, table: &str, row: Row) {
        self.entries.push(JournalEntry::Delete {
            table: table.into(),
            row,
        });
    }

    /// Returns all journal entries in the order they were recorded.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Returns the number of recorded changes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns every table the journal wrote to.
    ///
    /// A table stays in the set even when its changes cancel out, such as an
    /// insert followed by a delete of the same row.
    pub fn write_set(&self) -> TableSet {
        self.entries.iter().map(JournalEntry::table).collect()
    }

    /// Consumes the journal and returns its entries.
    pub fn into_entries(self) -> Vec<JournalEntry> {
        self.entries
    }
}
