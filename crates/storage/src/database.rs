//! The in-memory database handle.
//!
//! Writers are serialized. Committed state is an immutable `Arc<TableCache>`
//! swapped in at commit time, so snapshots never observe a partial
//! transaction. Commit listeners are invoked on the committing thread, in
//! commit order, while the state lock is held.

use crate::cache::TableCache;
use crate::snapshot::Snapshot;
use crate::transaction::{Transaction, TransactionId};
use crate::trigger::SyncTrigger;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use vista_core::{
    Commit, CommitHandler, Error, ListenerId, ObservableDatabase, Result, Row, TableSet, Value,
};

#[derive(Default)]
struct State {
    tables: Arc<TableCache>,
    triggers: Arc<Vec<SyncTrigger>>,
    listeners: BTreeMap<ListenerId, CommitHandler<Snapshot>>,
    next_listener_id: ListenerId,
}

#[derive(Default)]
struct Shared {
    /// Held for the whole duration of a write.
    writer: Mutex<()>,
    state: Mutex<State>,
}

/// Handle to an in-memory database. Clones share the same database.
#[derive(Clone, Default)]
pub struct Database {
    shared: Arc<Shared>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table. Schema changes are not reported to commit listeners.
    pub fn create_table(&self, name: &str, columns: &[&str]) -> Result<()> {
        let _writer = self.shared.writer.lock();
        let mut state = self.shared.state.lock();
        let mut tables = (*state.tables).clone();
        tables.create_table(name, columns)?;
        state.tables = Arc::new(tables);
        debug!(table = name, columns = columns.len(), "created table");
        Ok(())
    }

    /// Mirrors every write on `source` into `target` inside the writing
    /// transaction. `mapper` computes the target values of a source row; the
    /// target row keeps the source row id.
    pub fn create_sync_trigger(
        &self,
        source: &str,
        target: &str,
        mapper: impl Fn(&Row) -> Vec<Value> + Send + Sync + 'static,
    ) -> Result<()> {
        let _writer = self.shared.writer.lock();
        let mut state = self.shared.state.lock();
        for table in [source, target] {
            if !state.tables.has_table(table) {
                return Err(Error::table_not_found(table));
            }
        }
        Arc::make_mut(&mut state.triggers).push(SyncTrigger::new(source, target, mapper));
        debug!(source, target, "created sync trigger");
        Ok(())
    }

    /// Runs `f` in a write transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`. Only committed transactions that changed rows are
    /// reported to commit listeners.
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction) -> Result<T>,
    {
        let _writer = self.shared.writer.lock();
        let (tables, triggers) = {
            let state = self.shared.state.lock();
            ((*state.tables).clone(), Arc::clone(&state.triggers))
        };

        let mut tx = Transaction::begin(tables, triggers);
        let id = tx.id();
        match f(&mut tx) {
            Ok(value) => {
                let (tables, journal) = tx.commit();
                self.publish(id, tables, journal.write_set());
                Ok(value)
            }
            Err(err) => {
                let discarded = tx.rollback();
                debug!(transaction = id, discarded, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    /// Runs `f` against a snapshot of the committed state.
    pub fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        f(&self.snapshot())
    }

    /// Returns the number of registered commit listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.state.lock().listeners.len()
    }

    fn publish(&self, id: TransactionId, tables: TableCache, write_set: TableSet) {
        let mut state = self.shared.state.lock();
        state.tables = Arc::new(tables);
        if write_set.is_empty() {
            debug!(transaction = id, "transaction committed without changes");
            return;
        }
        debug!(
            transaction = id,
            write_set = ?write_set,
            listeners = state.listeners.len(),
            "transaction committed"
        );
        for handler in state.listeners.values() {
            handler(Commit {
                write_set: write_set.clone(),
                snapshot: Snapshot::new(Arc::clone(&state.tables)),
            });
        }
    }
}

impl ObservableDatabase for Database {
    type Snapshot = Snapshot;

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(Arc::clone(&self.shared.state.lock().tables))
    }

    fn add_commit_listener(&self, handler: CommitHandler<Snapshot>) -> (ListenerId, Snapshot) {
        let mut state = self.shared.state.lock();
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state.listeners.insert(id, handler);
        debug!(listener = id, "added commit listener");
        (id, Snapshot::new(Arc::clone(&state.tables)))
    }

    fn remove_commit_listener(&self, id: ListenerId) -> bool {
        let removed = self.shared.state.lock().listeners.remove(&id).is_some();
        if removed {
            debug!(listener = id, "removed commit listener");
        }
        removed
    }
}
