//! Vista Storage - Deterministic in-memory engine with observable commits.
//!
//! This crate provides the engine collaborator the observation layer runs
//! against:
//!
//! - `RowStore`: Rows of a single table keyed by row id
//! - `TableCache`: Copy-on-write set of tables
//! - `Journal`: Change tracking and write-sets for transactions
//! - `Transaction`: Insert, update and delete with trigger cascades
//! - `SyncTrigger`: Mirrors writes from one table into another
//! - `Snapshot`: Consistent read view recording the tables it reads
//! - `Database`: Serialized writes and commit listeners
//!
//! # Example
//!
//! ```rust
//! use vista_core::{ObservableDatabase, ReadSnapshot, Value};
//! use vista_storage::Database;
//!
//! let db = Database::new();
//! db.create_table("users", &["name"]).unwrap();
//!
//! db.write(|tx| tx.insert("users", vec![Value::from("Alice")])).unwrap();
//!
//! let snapshot = db.snapshot();
//! assert_eq!(snapshot.count("users").unwrap(), 1);
//! assert!(snapshot.accessed_tables().contains("users"));
//! ```

pub mod cache;
pub mod database;
pub mod journal;
pub mod row_store;
pub mod snapshot;
pub mod transaction;
pub mod trigger;

pub use cache::TableCache;
pub use database::Database;
pub use journal::{Journal, JournalEntry};
pub use row_store::RowStore;
pub use snapshot::Snapshot;
pub use transaction::{Transaction, TransactionId};
pub use trigger::{RowMapper, SyncTrigger};
