//! Row structure for Vista.
//!
//! This module defines the `Row` struct which represents a single fetched or
//! stored row.

use crate::value::Value;
use alloc::vec::Vec;

/// Identity of a row inside its table (the implicit `rowid` column).
pub type RowId = i64;

/// A dummy row ID used for rows that don't correspond to a stored row
/// (e.g., the result of an aggregate).
pub const DUMMY_ROW_ID: RowId = i64::MIN;

/// A row of values with its row identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Row {
    /// Identity of this row inside its table.
    id: RowId,
    /// Values stored in this row, indexed by column position.
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row with the given ID and values.
    pub fn new(id: RowId, values: Vec<Value>) -> Self {
        Self { id, values }
    }

    /// Creates a dummy row (for aggregate results, etc.).
    pub fn dummy(values: Vec<Value>) -> Self {
        Self::new(DUMMY_ROW_ID, values)
    }

    /// Returns the row ID.
    #[inline]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Sets the row ID.
    pub fn set_id(&mut self, id: RowId) {
        self.id = id;
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Gets a value at the given column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Sets a value at the given column index.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        if index < self.values.len() {
            self.values[index] = value;
            true
        } else {
            false
        }
    }

    /// Returns the number of values in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if this is a dummy row.
    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.id == DUMMY_ROW_ID
    }
}
