//! Observation registry.
//!
//! This module provides `ObservationRegistry`, which tracks the dependent
//! tables of many observations and tells which of them a commit write-set
//! affects.

use hashbrown::{HashMap, HashSet};
use vista_core::TableSet;

/// Unique identifier for a registered observation.
pub type ObservationId = u64;

/// A registry that routes write-sets to observations.
///
/// The registry maintains a mapping from table names to the observations
/// that depend on them. An observation registered as pending has no known
/// tables yet and matches every write-set.
///
/// # Example
///
/// ```rust
/// use vista_core::TableSet;
/// use vista_reactive::ObservationRegistry;
///
/// let mut registry = ObservationRegistry::new();
/// let players = registry.register(["player"].into_iter().collect());
/// let teams = registry.register(["team", "player"].into_iter().collect());
///
/// let write_set: TableSet = ["TEAM"].into_iter().collect();
/// assert_eq!(registry.matching(&write_set), vec![teams]);
/// assert!(registry.unregister(players));
/// ```
#[derive(Debug)]
pub struct ObservationRegistry {
    /// Case-folded table name -> observations that depend on it
    table_observations: HashMap<String, HashSet<ObservationId>>,
    /// Observation ID -> its dependent tables
    observations: HashMap<ObservationId, TableSet>,
    /// Observations whose tables are not known yet
    pending: HashSet<ObservationId>,
    /// Next observation ID to assign
    next_id: ObservationId,
}

impl Default for ObservationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationRegistry {
    /// Creates a new registry.
    pub fn new() -> Self {
        Self {
            table_observations: HashMap::new(),
            observations: HashMap::new(),
            pending: HashSet::new(),
            next_id: 1,
        }
    }

    /// Registers an observation depending on `tables` and returns its ID.
    pub fn register(&mut self, tables: TableSet) -> ObservationId {
        let id = self.allocate();
        self.index(id, &tables);
        self.observations.insert(id, tables);
        id
    }

    /// Registers an observation whose tables are not known yet. It matches
    /// every write-set until `set_tables` is called.
    pub fn register_pending(&mut self) -> ObservationId {
        let id = self.allocate();
        self.observations.insert(id, TableSet::new());
        self.pending.insert(id);
        id
    }

    /// Sets the dependent tables of a registered observation.
    ///
    /// Returns false if the observation is not registered.
    pub fn set_tables(&mut self, id: ObservationId, tables: TableSet) -> bool {
        let Some(previous) = self.observations.get(&id).cloned() else {
            return false;
        };
        self.pending.remove(&id);
        self.unindex(id, &previous);
        self.index(id, &tables);
        self.observations.insert(id, tables);
        true
    }

    /// Unregisters an observation by ID.
    ///
    /// Returns true if the observation was found and removed.
    pub fn unregister(&mut self, id: ObservationId) -> bool {
        match self.observations.remove(&id) {
            Some(tables) => {
                self.pending.remove(&id);
                self.unindex(id, &tables);
                true
            }
            None => false,
        }
    }

    /// Returns the observations affected by a write-set, in ID order.
    pub fn matching(&self, write_set: &TableSet) -> Vec<ObservationId> {
        let mut matched: HashSet<ObservationId> = self.pending.clone();
        for table in write_set.iter() {
            if let Some(ids) = self.table_observations.get(table) {
                matched.extend(ids.iter().copied());
            }
        }
        let mut matched: Vec<ObservationId> = matched.into_iter().collect();
        matched.sort_unstable();
        matched
    }

    /// Returns the dependent tables of an observation.
    pub fn tables(&self, id: ObservationId) -> Option<&TableSet> {
        self.observations.get(&id)
    }

    /// Returns the number of registered observations.
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// Returns true if there are no registered observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Returns the number of observations depending on a specific table.
    /// Pending observations are not counted.
    pub fn observations_for_table(&self, table: &str) -> usize {
        self.table_observations
            .get(&table.to_ascii_lowercase())
            .map_or(0, HashSet::len)
    }

    /// Removes every observation.
    pub fn clear(&mut self) {
        self.table_observations.clear();
        self.observations.clear();
        self.pending.clear();
    }

    fn allocate(&mut self) -> ObservationId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn index(&mut self, id: ObservationId, tables: &TableSet) {
        for table in tables.iter() {
            self.table_observations
                .entry(table.clone())
                .or_default()
                .insert(id);
        }
    }

    fn unindex(&mut self, id: ObservationId, tables: &TableSet) {
        for table in tables.iter() {
            if let Some(ids) = self.table_observations.get_mut(table) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.table_observations.remove(table);
                }
            }
        }
    }
}
