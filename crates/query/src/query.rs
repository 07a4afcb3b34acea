//! Query definitions.
//!
//! A `QueryDefinition` is an immutable description of a SELECT statement.
//! The builder methods consume the definition and return a modified copy, so
//! derived queries (count queries, unordered queries, subqueries) never
//! mutate a shared instance.

use crate::ast::{AllColumns, Conjunction, SqlExpression, SqlOrdering, SqlSelectable};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Row cap with an optional offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limit {
    count: u64,
    offset: Option<u64>,
}

impl Limit {
    /// Creates a limit.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn new(count: u64, offset: Option<u64>) -> Self {
        assert!(count > 0, "limit count must be positive");
        Self { count, offset }
    }

    /// Maximum number of rows.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Number of rows skipped.
    #[inline]
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

/// The FROM target of a query.
#[derive(Clone, Debug)]
pub enum Source {
    /// A named table.
    Table {
        name: String,
        alias: Option<String>,
    },
    /// A nested query.
    Subquery {
        query: Box<QueryDefinition>,
        alias: Option<String>,
    },
}

impl Source {
    /// Creates an unaliased table source.
    pub fn table(name: impl Into<String>) -> Self {
        Source::Table {
            name: name.into(),
            alias: None,
        }
    }

    /// Creates an unaliased subquery source.
    pub fn subquery(query: QueryDefinition) -> Self {
        Source::Subquery {
            query: Box::new(query),
            alias: None,
        }
    }

    /// Returns the source with `alias` set.
    pub fn with_alias(mut self, new_alias: impl Into<String>) -> Self {
        match &mut self {
            Source::Table { alias, .. } | Source::Subquery { alias, .. } => {
                *alias = Some(new_alias.into());
            }
        }
        self
    }

    /// Returns the alias, if any.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Source::Table { alias, .. } | Source::Subquery { alias, .. } => alias.as_deref(),
        }
    }

    /// Returns the table name for table sources.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Source::Table { name, .. } => Some(name),
            Source::Subquery { .. } => None,
        }
    }

    /// Returns true for subquery sources.
    pub fn is_subquery(&self) -> bool {
        matches!(self, Source::Subquery { .. })
    }
}

/// Structured description of a SELECT statement.
#[derive(Clone, Debug, Default)]
pub struct QueryDefinition {
    /// Projected selectables. Must not be empty when rendered.
    pub selection: Vec<Box<dyn SqlSelectable>>,
    /// SELECT DISTINCT.
    pub is_distinct: bool,
    /// FROM target.
    pub source: Option<Source>,
    /// WHERE clause.
    pub filter: Option<Box<dyn SqlExpression>>,
    /// GROUP BY expressions.
    pub group_by: Vec<Box<dyn SqlExpression>>,
    /// HAVING clause.
    pub having: Option<Box<dyn SqlExpression>>,
    /// ORDER BY terms.
    pub orderings: Vec<Box<dyn SqlOrdering>>,
    /// Whether the ordering is reversed at render time.
    pub is_reversed: bool,
    /// LIMIT clause.
    pub limit: Option<Limit>,
}

impl QueryDefinition {
    /// Creates an empty definition. A selection must be added before it
    /// can be rendered.
    pub fn new() -> Self {
        Self::default()
    }

    /// `SELECT * FROM "name"`.
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            selection: vec![AllColumns::new().into()],
            source: Some(Source::table(name)),
            ..Self::default()
        }
    }

    /// `SELECT * FROM (<query>)`, optionally aliased.
    pub fn from_subquery(query: QueryDefinition, alias: Option<&str>) -> Self {
        let mut source = Source::subquery(query);
        if let Some(alias) = alias {
            source = source.with_alias(alias);
        }
        Self {
            selection: vec![AllColumns::new().into()],
            source: Some(source),
            ..Self::default()
        }
    }

    /// Replaces the selection.
    pub fn select<I, S>(mut self, selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<dyn SqlSelectable>>,
    {
        self.selection = selection.into_iter().map(Into::into).collect();
        self
    }

    /// Turns the query into SELECT DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.is_distinct = true;
        self
    }

    /// Sets the source alias. Has no effect on a query without a source.
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.source = self.source.map(|source| source.with_alias(alias));
        self
    }

    /// Adds a WHERE condition, ANDed with any existing one.
    pub fn filter(mut self, predicate: impl Into<Box<dyn SqlExpression>>) -> Self {
        self.filter = Some(and_with(self.filter.take(), predicate.into()));
        self
    }

    /// Replaces the GROUP BY expressions.
    pub fn group_by<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Box<dyn SqlExpression>>,
    {
        self.group_by = expressions.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a HAVING condition, ANDed with any existing one.
    pub fn having(mut self, predicate: impl Into<Box<dyn SqlExpression>>) -> Self {
        self.having = Some(and_with(self.having.take(), predicate.into()));
        self
    }

    /// Replaces the orderings and clears any reversal.
    pub fn order<I, O>(mut self, orderings: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Box<dyn SqlOrdering>>,
    {
        self.orderings = orderings.into_iter().map(Into::into).collect();
        self.is_reversed = false;
        self
    }

    /// Appends an ordering term after the existing ones.
    pub fn then_order(mut self, ordering: impl Into<Box<dyn SqlOrdering>>) -> Self {
        self.orderings.push(ordering.into());
        self
    }

    /// Toggles the reversal flag.
    pub fn reversed(mut self) -> Self {
        self.is_reversed = !self.is_reversed;
        self
    }

    /// Drops orderings and reversal.
    pub fn unordered(mut self) -> Self {
        self.orderings.clear();
        self.is_reversed = false;
        self
    }

    /// Sets the LIMIT clause.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn limit(mut self, count: u64, offset: Option<u64>) -> Self {
        self.limit = Some(Limit::new(count, offset));
        self
    }

    /// Returns true when the query ends with an ORDER BY clause.
    pub fn is_ordered(&self) -> bool {
        !self.orderings.is_empty() || self.is_reversed
    }
}

fn and_with(
    existing: Option<Box<dyn SqlExpression>>,
    predicate: Box<dyn SqlExpression>,
) -> Box<dyn SqlExpression> {
    match existing {
        None => predicate,
        Some(existing) => Box::new(Conjunction::new(vec![existing, predicate])),
    }
}
