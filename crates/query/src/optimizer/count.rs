//! Count query pass - derives a query counting the rows of another query.
//!
//! When the counted query reads a single table and its selection knows a
//! cheaper equivalent, the selection is replaced in place:
//!
//! ```text
//! SELECT a, b FROM t WHERE c ORDER BY a    =>    SELECT COUNT(*) FROM t WHERE c
//! ```
//!
//! Otherwise the whole query, ordering stripped, is wrapped in a subquery:
//!
//! ```text
//! SELECT a FROM t GROUP BY a LIMIT 5       =>    SELECT COUNT(*) FROM (SELECT a FROM t GROUP BY a LIMIT 5)
//! ```

use crate::ast::Expr;
use crate::optimizer::QueryPass;
use crate::query::{QueryDefinition, Source};
use alloc::vec;

/// Pass that turns a query into a query counting its rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct CountQueryPass;

impl QueryPass for CountQueryPass {
    fn rewrite(&self, query: &QueryDefinition) -> QueryDefinition {
        count_query(query)
    }

    fn name(&self) -> &'static str {
        "count_query"
    }
}

/// Returns a query that counts the rows `query` produces.
///
/// Always succeeds: when no cheaper rewrite is known to be correct, the
/// query is wrapped in a subquery and counted.
pub fn count_query(query: &QueryDefinition) -> QueryDefinition {
    // Grouping, a HAVING filter and limits all change what a naive COUNT(*)
    // over the same filter would count.
    if !query.group_by.is_empty() || query.having.is_some() || query.limit.is_some() {
        return trivial_count(query, "grouped or limited");
    }

    let (table, alias) = match &query.source {
        Some(Source::Table { name, alias }) => (name.as_str(), alias.as_deref()),
        Some(Source::Subquery { .. }) => return trivial_count(query, "subquery source"),
        None => return trivial_count(query, "no source"),
    };

    match query.selection.as_slice() {
        [selectable] => {
            match selectable.counting_selectable(query.is_distinct, table, alias) {
                Some(counting) => {
                    let mut counted = query.clone().unordered();
                    counted.is_distinct = false;
                    counted.selection = vec![counting];
                    counted
                }
                None => trivial_count(query, "no counting selectable"),
            }
        }
        _ if query.is_distinct => trivial_count(query, "distinct selection"),
        selection
            if selection
                .iter()
                .any(|s| s.counting_selectable(false, table, alias).is_none()) =>
        {
            trivial_count(query, "selection not counted row for row")
        }
        _ => {
            let mut counted = query.clone().unordered();
            counted.selection = vec![Expr::count_star().into()];
            counted
        }
    }
}

fn trivial_count(query: &QueryDefinition, reason: &'static str) -> QueryDefinition {
    tracing::trace!(reason, "count query falls back to a subquery");
    QueryDefinition {
        selection: vec![Expr::count_star().into()],
        source: Some(Source::subquery(query.clone().unordered())),
        ..QueryDefinition::default()
    }
}
