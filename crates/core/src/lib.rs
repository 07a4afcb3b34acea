//! Vista Core - Core types and engine interfaces for Vista.
//!
//! This crate provides the foundational types shared by the query compiler
//! and the observation engine:
//!
//! - `Value`: Values bound to statement placeholders or read from rows
//! - `StorageClass`: The storage class of a value
//! - `Row`: A row of values with its row identity
//! - `TableSet`: Case-insensitive sets of table names (read regions, write-sets)
//! - `engine`: Traits implemented by the relational engine
//! - `Error`: Error types for engine and decoding operations
//!
//! # Example
//!
//! ```rust
//! use vista_core::{Row, TableSet, Value};
//!
//! let row = Row::new(1, vec![Value::Integer(1), Value::Text("Alice".into())]);
//! assert_eq!(row.get(1), Some(&Value::Text("Alice".into())));
//!
//! let reads: TableSet = ["player"].into_iter().collect();
//! let writes: TableSet = ["Player", "team"].into_iter().collect();
//! assert!(reads.intersects(&writes));
//! ```

#![no_std]

extern crate alloc;

pub mod engine;
mod error;
mod row;
mod table_set;
mod types;
mod value;

pub use engine::{Commit, CommitHandler, Executor, ListenerId, ObservableDatabase, ReadSnapshot};
pub use error::{Error, Result};
pub use row::{Row, RowId, DUMMY_ROW_ID};
pub use table_set::TableSet;
pub use types::StorageClass;
pub use value::Value;
