//! Per-observation evaluation state.
//!
//! The evaluator owns the fetch operation, the dependent tables learned from
//! the first fetch, and the last fetched value. It decides, for one commit,
//! whether to fetch again and whether the result is worth delivering.

use vista_core::{Commit, Error, ReadSnapshot, Result, TableSet};

/// Result of evaluating one commit.
#[derive(Debug, PartialEq)]
pub(crate) enum Outcome<V> {
    /// The commit wrote no dependent table.
    Skipped,
    /// The value was fetched again and equals the last delivered one.
    Unchanged,
    /// A value to deliver.
    Changed(V),
    /// The fetch failed. Observation stops.
    Failed(Error),
}

pub(crate) struct Evaluator<F, V> {
    fetch: F,
    dependent_tables: TableSet,
    last_value: Option<V>,
    dedupe: bool,
}

impl<F, V> Evaluator<F, V>
where
    V: Clone + PartialEq,
{
    /// Runs the first fetch on `snapshot` and returns the evaluator together
    /// with the value to deliver first.
    pub(crate) fn initial<S>(mut fetch: F, dedupe: bool, snapshot: &S) -> Result<(Self, V)>
    where
        S: ReadSnapshot,
        F: FnMut(&S) -> Result<V>,
    {
        let value = fetch(snapshot)?;
        let evaluator = Self {
            fetch,
            dependent_tables: snapshot.accessed_tables(),
            last_value: dedupe.then(|| value.clone()),
            dedupe,
        };
        Ok((evaluator, value))
    }

    /// Returns the tables whose writes trigger a new fetch.
    pub(crate) fn dependent_tables(&self) -> &TableSet {
        &self.dependent_tables
    }

    /// Evaluates one commit.
    pub(crate) fn evaluate<S>(&mut self, commit: &Commit<S>) -> Outcome<V>
    where
        F: FnMut(&S) -> Result<V>,
    {
        if !commit.write_set.intersects(&self.dependent_tables) {
            return Outcome::Skipped;
        }
        let value = match (self.fetch)(&commit.snapshot) {
            Ok(value) => value,
            Err(err) => return Outcome::Failed(err),
        };
        if !self.dedupe {
            return Outcome::Changed(value);
        }
        let unchanged = self.last_value.as_ref() == Some(&value);
        self.last_value = Some(value.clone());
        if unchanged {
            Outcome::Unchanged
        } else {
            Outcome::Changed(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Snapshot over one counter, recording reads of table "t".
    struct Counter {
        value: i64,
        accessed: RefCell<TableSet>,
    }

    impl Counter {
        fn new(value: i64) -> Self {
            Self {
                value,
                accessed: RefCell::new(TableSet::new()),
            }
        }

        fn read(&self) -> i64 {
            self.accessed.borrow_mut().insert("t");
            self.value
        }
    }

    impl ReadSnapshot for Counter {
        fn accessed_tables(&self) -> TableSet {
            self.accessed.borrow().clone()
        }
    }

    fn commit(tables: &[&str], value: i64) -> Commit<Counter> {
        Commit {
            write_set: tables.iter().copied().collect(),
            snapshot: Counter::new(value),
        }
    }

    fn read(counter: &Counter) -> Result<i64> {
        Ok(counter.read())
    }

    #[test]
    fn test_initial_records_dependent_tables() {
        let (evaluator, value) = Evaluator::initial(read, false, &Counter::new(3)).unwrap();
        assert_eq!(value, 3);
        assert!(evaluator.dependent_tables().contains("t"));
        assert_eq!(evaluator.dependent_tables().len(), 1);
    }

    #[test]
    fn test_initial_error() {
        let result = Evaluator::<_, i64>::initial(
            |_: &Counter| Err(Error::execution("boom")),
            false,
            &Counter::new(0),
        );
        assert_eq!(result.err(), Some(Error::execution("boom")));
    }

    #[test]
    fn test_unrelated_commits_are_skipped() {
        let fetches = Cell::new(0);
        let fetch = |counter: &Counter| {
            fetches.set(fetches.get() + 1);
            Ok(counter.read())
        };
        let (mut evaluator, _) = Evaluator::initial(fetch, false, &Counter::new(0)).unwrap();
        assert_eq!(evaluator.evaluate(&commit(&["other"], 1)), Outcome::Skipped);
        assert_eq!(fetches.get(), 1);
        assert_eq!(evaluator.evaluate(&commit(&["T"], 1)), Outcome::Changed(1));
        assert_eq!(fetches.get(), 2);
    }

    #[test]
    fn test_without_dedupe_every_fetch_is_delivered() {
        let (mut evaluator, _) = Evaluator::initial(read, false, &Counter::new(1)).unwrap();
        assert_eq!(evaluator.evaluate(&commit(&["t"], 1)), Outcome::Changed(1));
        assert_eq!(evaluator.evaluate(&commit(&["t"], 1)), Outcome::Changed(1));
    }

    #[test]
    fn test_dedupe_compares_with_last_value() {
        let (mut evaluator, first) = Evaluator::initial(read, true, &Counter::new(1)).unwrap();
        assert_eq!(first, 1);
        assert_eq!(evaluator.evaluate(&commit(&["t"], 1)), Outcome::Unchanged);
        assert_eq!(evaluator.evaluate(&commit(&["t"], 2)), Outcome::Changed(2));
        assert_eq!(evaluator.evaluate(&commit(&["t"], 2)), Outcome::Unchanged);
        assert_eq!(evaluator.evaluate(&commit(&["t"], 1)), Outcome::Changed(1));
    }

    #[test]
    fn test_failed_fetch() {
        let fetch = |counter: &Counter| {
            let value = counter.read();
            if value > 1 {
                Err(Error::execution("too large"))
            } else {
                Ok(value)
            }
        };
        let (mut evaluator, _) = Evaluator::initial(fetch, true, &Counter::new(0)).unwrap();
        assert_eq!(
            evaluator.evaluate(&commit(&["t"], 5)),
            Outcome::Failed(Error::execution("too large"))
        );
    }
}
