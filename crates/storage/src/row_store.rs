//! Row storage for Vista's in-memory engine.
//!
//! This module provides the `RowStore` struct which manages the rows of a
//! single table, keyed by row id.

use std::collections::BTreeMap;
use vista_core::{Error, Result, Row, RowId, Value};

/// Rows of a single table.
#[derive(Clone, Debug)]
pub struct RowStore {
    name: String,
    columns: Vec<String>,
    rows: BTreeMap<RowId, Row>,
    next_row_id: RowId,
}

impl RowStore {
    /// Creates an empty store.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: BTreeMap::new(),
            next_row_id: 1,
        }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the position of a column, compared case-insensitively.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inserts a row and returns its row id.
    ///
    /// A dummy row gets the next free row id; otherwise the row keeps its id,
    /// which must not be in use.
    pub fn insert(&mut self, mut row: Row) -> Result<RowId> {
        self.check_arity(row.values())?;
        let row_id = if row.is_dummy() {
            self.next_row_id
        } else {
            row.id()
        };
        if self.rows.contains_key(&row_id) {
            return Err(Error::invalid_operation(format!(
                "row {} already exists in table {}",
                row_id, self.name
            )));
        }
        row.set_id(row_id);
        self.next_row_id = self.next_row_id.max(row_id.saturating_add(1));
        self.rows.insert(row_id, row);
        Ok(row_id)
    }

    /// Replaces the values of a row and returns the previous row.
    pub fn update(&mut self, row_id: RowId, values: Vec<Value>) -> Result<Row> {
        self.check_arity(&values)?;
        let slot = self
            .rows
            .get_mut(&row_id)
            .ok_or_else(|| Error::row_not_found(&self.name, row_id))?;
        Ok(std::mem::replace(slot, Row::new(row_id, values)))
    }

    /// Removes a row and returns it.
    pub fn delete(&mut self, row_id: RowId) -> Result<Row> {
        self.rows
            .remove(&row_id)
            .ok_or_else(|| Error::row_not_found(&self.name, row_id))
    }

    /// Gets a row by id.
    pub fn get(&self, row_id: RowId) -> Option<&Row> {
        self.rows.get(&row_id)
    }

    /// Iterates rows in row id order.
    pub fn scan(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.values()
    }

    /// Returns all row ids in order.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.keys().copied().collect()
    }

    /// Removes every row. Row ids are not reused.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn check_arity(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::arity_mismatch(
                &self.name,
                self.columns.len(),
                values.len(),
            ));
        }
        Ok(())
    }
}
