//! Sets of table names.
//!
//! A `TableSet` is used both for the tables a read accessed and for the
//! write-set of a committed transaction. Table names are compared
//! case-insensitively, as the engine resolves them.

use alloc::collections::btree_set::{self, BTreeSet};
use alloc::string::String;

/// An ordered set of case-folded table names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TableSet {
    names: BTreeSet<String>,
}

impl TableSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table name. Returns true if it was not present yet.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_ascii_lowercase())
    }

    /// Returns true if the set contains the given table.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    /// Returns true if both sets share at least one table.
    pub fn intersects(&self, other: &TableSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.names.iter().any(|name| large.names.contains(name))
    }

    /// Adds every table of `other` to this set.
    pub fn union_with(&mut self, other: &TableSet) {
        self.names.extend(other.names.iter().cloned());
    }

    /// Returns the number of tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates the case-folded names in order.
    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.names.iter()
    }
}

impl<'a> FromIterator<&'a str> for TableSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = TableSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<'a> Extend<&'a str> for TableSet {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl<'a> IntoIterator for &'a TableSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
