//! Interfaces consumed from the relational engine.
//!
//! Vista never executes statements or commits transactions itself. The
//! engine implements these traits:
//!
//! - `Executor`: runs rendered SQL with positional arguments
//! - `ReadSnapshot`: a consistent read view that records the tables it read
//! - `ObservableDatabase`: hands out snapshots and reports commit write-sets

use crate::error::Result;
use crate::row::Row;
use crate::table_set::TableSet;
use crate::value::Value;
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Identifier of a registered commit listener.
pub type ListenerId = u64;

/// Executes rendered SQL against the engine.
///
/// Each argument binds, in order, to one `?` placeholder of `sql`.
pub trait Executor {
    /// Executes a write statement and returns the number of affected rows.
    fn execute_statement(&self, sql: &str, arguments: &[Value]) -> Result<usize>;

    /// Executes a read statement and returns its rows.
    fn fetch_rows(&self, sql: &str, arguments: &[Value]) -> Result<Vec<Row>>;
}

/// A consistent, read-only view of the database.
pub trait ReadSnapshot {
    /// Returns the tables read through this snapshot so far.
    ///
    /// Reads that touch a virtual table report the virtual table itself, not
    /// its shadow tables.
    fn accessed_tables(&self) -> TableSet;
}

/// A committed transaction, as reported to commit listeners.
#[derive(Clone, Debug)]
pub struct Commit<S> {
    /// Every table physically modified by the transaction, including writes
    /// performed by triggers.
    pub write_set: TableSet,
    /// A fresh snapshot of the state right after this commit.
    pub snapshot: S,
}

/// Handler invoked once per successful commit, in commit order.
pub type CommitHandler<S> = Box<dyn Fn(Commit<S>) + Send + Sync>;

/// A database whose commits can be observed.
///
/// Rolled-back transactions never reach commit handlers. Handlers run on the
/// committing thread and must not block.
pub trait ObservableDatabase: Send + Sync {
    /// Read view type handed to fetch operations.
    type Snapshot: ReadSnapshot + Send + 'static;

    /// Returns a snapshot of the current committed state.
    fn snapshot(&self) -> Self::Snapshot;

    /// Registers a commit handler.
    ///
    /// Registration is atomic with respect to commits: the returned snapshot
    /// reflects every commit that happened before registration, and every
    /// later commit is reported to `handler`.
    fn add_commit_listener(
        &self,
        handler: CommitHandler<Self::Snapshot>,
    ) -> (ListenerId, Self::Snapshot);

    /// Unregisters a commit handler. Returns true if it was registered.
    fn remove_commit_listener(&self, id: ListenerId) -> bool;
}
