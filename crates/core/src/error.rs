//! Error types for Vista.

use crate::row::RowId;
use alloc::string::String;

/// Result type alias for Vista operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Vista operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Table not found.
    #[error("Table not found: {name}")]
    TableNotFound { name: String },
    /// Table already exists.
    #[error("Table already exists: {name}")]
    TableExists { name: String },
    /// Row not found.
    #[error("Row {row_id} not found in table {table}")]
    RowNotFound { table: String, row_id: RowId },
    /// Column not found.
    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },
    /// A row did not match the shape of its table.
    #[error("Table {table} expects {expected} values, got {got}")]
    ArityMismatch {
        table: String,
        expected: usize,
        got: usize,
    },
    /// A fetched value could not be decoded.
    #[error("Decoding failed: {message}")]
    Decode { message: String },
    /// The engine failed to execute a statement.
    #[error("Execution failed: {message}")]
    Execution { message: String },
    /// Invalid operation.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl Error {
    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    /// Creates a table exists error.
    pub fn table_exists(name: impl Into<String>) -> Self {
        Error::TableExists { name: name.into() }
    }

    /// Creates a row not found error.
    pub fn row_not_found(table: impl Into<String>, row_id: RowId) -> Self {
        Error::RowNotFound {
            table: table.into(),
            row_id,
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an arity mismatch error.
    pub fn arity_mismatch(table: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityMismatch {
            table: table.into(),
            expected,
            got,
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}
