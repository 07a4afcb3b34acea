//! Cache management for Vista's in-memory engine.
//!
//! This module provides the `TableCache` struct which manages multiple table
//! stores. Stores are shared behind `Arc`, so cloning a cache is cheap and a
//! clone only copies the tables it goes on to modify.

use crate::row_store::RowStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use vista_core::{Error, Result, Row, RowId};

/// Copy-on-write set of tables.
#[derive(Clone, Debug, Default)]
pub struct TableCache {
    /// Case-folded table name → store.
    tables: BTreeMap<String, Arc<RowStore>>,
}

impl TableCache {
    /// Creates a new empty table cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table.
    pub fn create_table(&mut self, name: &str, columns: &[&str]) -> Result<()> {
        let key = name.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            return Err(Error::table_exists(name));
        }
        let columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.tables.insert(key, Arc::new(RowStore::new(name, columns)));
        Ok(())
    }

    /// Drops a table from the cache.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        match self.tables.remove(&name.to_ascii_lowercase()) {
            Some(_) => Ok(()),
            None => Err(Error::table_not_found(name)),
        }
    }

    /// Gets a reference to a table store.
    pub fn get_table(&self, name: &str) -> Option<&RowStore> {
        self.tables.get(&name.to_ascii_lowercase()).map(Arc::as_ref)
    }

    /// Gets a mutable reference to a table store, copying it first if it is
    /// shared with another cache.
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut RowStore> {
        self.tables
            .get_mut(&name.to_ascii_lowercase())
            .map(Arc::make_mut)
    }

    /// Returns the table store or a `TableNotFound` error.
    pub fn table(&self, name: &str) -> Result<&RowStore> {
        self.get_table(name).ok_or_else(|| Error::table_not_found(name))
    }

    /// Returns the mutable table store or a `TableNotFound` error.
    pub fn table_mut(&mut self, name: &str) -> Result<&mut RowStore> {
        self.get_table_mut(name)
            .ok_or_else(|| Error::table_not_found(name))
    }

    /// Checks if a table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns the number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Returns all table names as declared.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.values().map(|t| t.name()).collect()
    }

    /// Returns the total row count across all tables.
    pub fn total_row_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    /// Gets a row by table name and row ID.
    pub fn get_row(&self, table: &str, row_id: RowId) -> Option<&Row> {
        self.get_table(table).and_then(|t| t.get(row_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_core::Value;

    fn cache() -> TableCache {
        let mut cache = TableCache::new();
        cache.create_table("users", &["name"]).unwrap();
        cache
    }

    #[test]
    fn test_cache_create_table() {
        let cache = cache();
        assert!(cache.has_table("users"));
        assert!(cache.has_table("USERS"));
        assert_eq!(cache.table_names(), vec!["users"]);
    }

    #[test]
    fn test_cache_create_duplicate_table() {
        let mut cache = cache();
        assert_eq!(
            cache.create_table("Users", &["x"]),
            Err(Error::table_exists("Users"))
        );
    }

    #[test]
    fn test_cache_drop_table() {
        let mut cache = cache();
        assert!(cache.drop_table("users").is_ok());
        assert!(!cache.has_table("users"));
        assert!(cache.drop_table("users").is_err());
    }

    #[test]
    fn test_cache_missing_table() {
        let mut cache = cache();
        assert!(cache.get_table("nonexistent").is_none());
        assert_eq!(
            cache.table_mut("nonexistent").err(),
            Some(Error::table_not_found("nonexistent"))
        );
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let mut original = cache();
        original
            .table_mut("users")
            .unwrap()
            .insert(Row::dummy(vec![Value::from("Alice")]))
            .unwrap();

        let mut copy = original.clone();
        copy.table_mut("users")
            .unwrap()
            .insert(Row::dummy(vec![Value::from("Bob")]))
            .unwrap();

        assert_eq!(original.total_row_count(), 1);
        assert_eq!(copy.total_row_count(), 2);
        assert!(copy.get_row("users", 2).is_some());
        assert!(original.get_row("users", 2).is_none());
    }
}
