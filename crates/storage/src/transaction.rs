//! Transaction management for Vista's in-memory engine.
//!
//! A transaction works on a private copy-on-write copy of the committed
//! tables. Committing hands the copy and the journal back to the database;
//! rolling back discards them.

use crate::cache::TableCache;
use crate::journal::Journal;
use crate::trigger::SyncTrigger;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vista_core::{Error, Result, Row, RowId, Value};

/// Global transaction ID counter.
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Triggers firing triggers may nest at most this deep.
const MAX_TRIGGER_DEPTH: usize = 32;

/// Transaction ID type.
pub type TransactionId = u64;

/// A change that fires triggers on its table.
#[derive(Clone, Copy)]
enum RowChange<'a> {
    Inserted(&'a Row),
    Updated(&'a Row),
    Deleted(&'a Row),
}

/// A write transaction.
pub struct Transaction {
    id: TransactionId,
    tables: TableCache,
    journal: Journal,
    triggers: Arc<Vec<SyncTrigger>>,
}

impl Transaction {
    /// Begins a transaction over a copy of `tables`.
    pub fn begin(tables: TableCache, triggers: Arc<Vec<SyncTrigger>>) -> Self {
        Self {
            id: NEXT_TX_ID.fetch_add(1, Ordering::SeqCst),
            tables,
            journal: Journal::new(),
            triggers,
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Inserts a row with the next free row id and returns that id.
    pub fn insert(&mut self, table: &str, values: Vec<Value>) -> Result<RowId> {
        self.apply_insert(table, Row::dummy(values), 0)
    }

    /// Inserts a row keeping its row id.
    pub fn insert_row(&mut self, table: &str, row: Row) -> Result<RowId> {
        self.apply_insert(table, row, 0)
    }

    /// Rewrites a row. Writing identical values still counts as a change.
    pub fn update(&mut self, table: &str, row_id: RowId, values: Vec<Value>) -> Result<()> {
        self.apply_update(table, row_id, values, 0)
    }

    /// Rewrites every row matching `predicate` with the values `update`
    /// computes. Returns the number of rows written.
    pub fn update_where(
        &mut self,
        table: &str,
        predicate: impl Fn(&Row) -> bool,
        update: impl Fn(&Row) -> Vec<Value>,
    ) -> Result<usize> {
        let targets: Vec<(RowId, Vec<Value>)> = self
            .tables
            .table(table)?
            .scan()
            .filter(|row| predicate(*row))
            .map(|row| (row.id(), update(row)))
            .collect();
        let count = targets.len();
        for (row_id, values) in targets {
            self.apply_update(table, row_id, values, 0)?;
        }
        Ok(count)
    }

    /// Deletes a row and returns it.
    pub fn delete(&mut self, table: &str, row_id: RowId) -> Result<Row> {
        self.apply_delete(table, row_id, 0)
    }

    /// Deletes every row matching `predicate`. Returns the number of rows
    /// deleted.
    pub fn delete_where(&mut self, table: &str, predicate: impl Fn(&Row) -> bool) -> Result<usize> {
        let targets: Vec<RowId> = self
            .tables
            .table(table)?
            .scan()
            .filter(|row| predicate(*row))
            .map(Row::id)
            .collect();
        let count = targets.len();
        for row_id in targets {
            self.apply_delete(table, row_id, 0)?;
        }
        Ok(count)
    }

    /// Returns the rows of a table as this transaction sees them.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>> {
        Ok(self.tables.table(table)?.scan().cloned().collect())
    }

    /// Gets a row as this transaction sees it.
    pub fn get(&self, table: &str, row_id: RowId) -> Result<Option<Row>> {
        Ok(self.tables.table(table)?.get(row_id).cloned())
    }

    /// Returns the changes recorded so far.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Commits the transaction, returning the new tables and the journal.
    pub fn commit(self) -> (TableCache, Journal) {
        (self.tables, self.journal)
    }

    /// Rolls back the transaction, discarding every change. Returns the
    /// number of changes discarded.
    pub fn rollback(self) -> usize {
        self.journal.len()
    }

    fn apply_insert(&mut self, table: &str, mut row: Row, depth: usize) -> Result<RowId> {
        let row_id = self.tables.table_mut(table)?.insert(row.clone())?;
        row.set_id(row_id);
        self.journal.record_insert(table, row.clone());
        self.fire(table, RowChange::Inserted(&row), depth)?;
        Ok(row_id)
    }

    fn apply_update(
        &mut self,
        table: &str,
        row_id: RowId,
        values: Vec<Value>,
        depth: usize,
    ) -> Result<()> {
        let new = Row::new(row_id, values.clone());
        let old = self.tables.table_mut(table)?.update(row_id, values)?;
        self.journal.record_update(table, old, new.clone());
        self.fire(table, RowChange::Updated(&new), depth)
    }

    fn apply_delete(&mut self, table: &str, row_id: RowId, depth: usize) -> Result<Row> {
        let row = self.tables.table_mut(table)?.delete(row_id)?;
        self.journal.record_delete(table, row.clone());
        self.fire(table, RowChange::Deleted(&row), depth)?;
        Ok(row)
    }

    fn fire(&mut self, table: &str, change: RowChange<'_>, depth: usize) -> Result<()> {
        let triggers = Arc::clone(&self.triggers);
        for trigger in triggers.iter().filter(|t| t.fires_on(table)) {
            if depth >= MAX_TRIGGER_DEPTH {
                return Err(Error::invalid_operation(format!(
                    "trigger recursion from {} exceeds {} levels",
                    table, MAX_TRIGGER_DEPTH
                )));
            }
            match change {
                RowChange::Inserted(row) => {
                    self.apply_insert(trigger.target(), trigger.map(row), depth + 1)?;
                }
                RowChange::Updated(row) => {
                    let mirrored = trigger.map(row);
                    self.apply_update(
                        trigger.target(),
                        mirrored.id(),
                        mirrored.into_values(),
                        depth + 1,
                    )?;
                }
                RowChange::Deleted(row) => {
                    self.apply_delete(trigger.target(), row.id(), depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> TableCache {
        let mut tables = TableCache::new();
        tables.create_table("document", &["body"]).unwrap();
        tables.create_table("document_fts", &["body"]).unwrap();
        tables
    }

    fn fts_trigger() -> Arc<Vec<SyncTrigger>> {
        Arc::new(vec![SyncTrigger::new("document", "document_fts", |row: &Row| {
            row.values().to_vec()
        })])
    }

    #[test]
    fn test_transaction_ids_increase() {
        let first = Transaction::begin(TableCache::new(), Arc::default());
        let second = Transaction::begin(TableCache::new(), Arc::default());
        assert!(second.id() > first.id());
    }

    #[test]
    fn test_insert_commit() {
        let mut tx = Transaction::begin(tables(), Arc::default());
        let id = tx.insert("document", vec![Value::from("hello")]).unwrap();
        assert_eq!(tx.get("document", id).unwrap().map(|r| r.id()), Some(id));

        let (tables, journal) = tx.commit();
        assert_eq!(tables.table("document").unwrap().len(), 1);
        assert_eq!(journal.len(), 1);
        assert!(journal.write_set().contains("document"));
    }

    #[test]
    fn test_transaction_works_on_a_copy() {
        let committed = tables();
        let mut tx = Transaction::begin(committed.clone(), Arc::default());
        tx.insert("document", vec![Value::from("draft")]).unwrap();
        assert_eq!(tx.rollback(), 1);
        assert_eq!(committed.total_row_count(), 0);
    }

    #[test]
    fn test_update_with_same_values_is_journaled() {
        let mut tx = Transaction::begin(tables(), Arc::default());
        let id = tx.insert("document", vec![Value::from("same")]).unwrap();
        let (tables, _) = tx.commit();

        let mut tx = Transaction::begin(tables, Arc::default());
        tx.update("document", id, vec![Value::from("same")]).unwrap();
        assert!(tx.journal().write_set().contains("document"));
    }

    #[test]
    fn test_update_where_and_delete_where() {
        let mut tx = Transaction::begin(tables(), Arc::default());
        for body in ["a", "b", "c"] {
            tx.insert("document", vec![Value::from(body)]).unwrap();
        }
        let updated = tx
            .update_where(
                "document",
                |row| row.get(0) != Some(&Value::from("b")),
                |_| vec![Value::from("x")],
            )
            .unwrap();
        assert_eq!(updated, 2);

        let deleted = tx
            .delete_where("document", |row| row.get(0) == Some(&Value::from("x")))
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(tx.rows("document").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_table() {
        let mut tx = Transaction::begin(tables(), Arc::default());
        assert_eq!(
            tx.insert("missing", vec![]),
            Err(Error::table_not_found("missing"))
        );
        assert!(tx.rows("missing").is_err());
        assert!(tx.journal().is_empty());
    }

    #[test]
    fn test_triggers_mirror_every_write() {
        let mut tx = Transaction::begin(tables(), fts_trigger());
        let id = tx.insert("document", vec![Value::from("one")]).unwrap();
        assert_eq!(
            tx.get("document_fts", id).unwrap().map(Row::into_values),
            Some(vec![Value::from("one")])
        );

        tx.update("document", id, vec![Value::from("two")]).unwrap();
        assert_eq!(
            tx.get("document_fts", id).unwrap().map(Row::into_values),
            Some(vec![Value::from("two")])
        );

        tx.delete("document", id).unwrap();
        assert!(tx.get("document_fts", id).unwrap().is_none());

        let write_set = tx.journal().write_set();
        assert!(write_set.contains("document"));
        assert!(write_set.contains("document_fts"));
        assert_eq!(tx.journal().len(), 6);
    }

    #[test]
    fn test_trigger_cycle_is_rejected() {
        let mut tables = TableCache::new();
        tables.create_table("a", &["v"]).unwrap();
        tables.create_table("b", &["v"]).unwrap();
        let triggers = Arc::new(vec![
            SyncTrigger::new("a", "b", |row: &Row| row.values().to_vec()),
            SyncTrigger::new("b", "a", |row: &Row| row.values().to_vec()),
        ]);
        let mut tx = Transaction::begin(tables, triggers);
        let result = tx.insert("a", vec![Value::Integer(1)]);
        assert!(matches!(result, Err(Error::InvalidOperation { .. })));
    }
}
