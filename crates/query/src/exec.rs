//! Execution helpers over an [`Executor`].

use crate::delete::render_delete;
use crate::optimizer::count_query;
use crate::query::{Limit, QueryDefinition};
use crate::render::render;
use alloc::vec::Vec;
use vista_core::{Error, Executor, Result, Row};

/// Fetches every row of `query`.
pub fn fetch_all<E: Executor + ?Sized>(executor: &E, query: &QueryDefinition) -> Result<Vec<Row>> {
    let (sql, arguments) = render(query);
    tracing::trace!(sql = %sql, arguments = arguments.len(), "fetch_all");
    executor.fetch_rows(&sql, &arguments)
}

/// Fetches the first row of `query`, if any.
///
/// The query is rendered with `LIMIT 1`, keeping any existing offset.
pub fn fetch_one<E: Executor + ?Sized>(
    executor: &E,
    query: &QueryDefinition,
) -> Result<Option<Row>> {
    let mut single = query.clone();
    single.limit = Some(Limit::new(1, query.limit.and_then(|limit| limit.offset())));
    let (sql, arguments) = render(&single);
    tracing::trace!(sql = %sql, arguments = arguments.len(), "fetch_one");
    Ok(executor.fetch_rows(&sql, &arguments)?.into_iter().next())
}

/// Counts the rows of `query` through its count query.
pub fn fetch_count<E: Executor + ?Sized>(executor: &E, query: &QueryDefinition) -> Result<i64> {
    let (sql, arguments) = render(&count_query(query));
    tracing::trace!(sql = %sql, arguments = arguments.len(), "fetch_count");
    let rows = executor.fetch_rows(&sql, &arguments)?;
    rows.first()
        .and_then(|row| row.get(0))
        .and_then(|value| value.as_i64())
        .ok_or_else(|| Error::decode("count query did not return an integer"))
}

/// Returns true when `query` produces at least one row.
pub fn exists<E: Executor + ?Sized>(executor: &E, query: &QueryDefinition) -> Result<bool> {
    Ok(fetch_one(executor, query)?.is_some())
}

/// Deletes the rows matched by `query` and returns how many were deleted.
///
/// # Panics
///
/// Panics if the query has a GROUP BY, HAVING or LIMIT clause.
pub fn delete_all<E: Executor + ?Sized>(executor: &E, query: &QueryDefinition) -> Result<usize> {
    let (sql, arguments) = render_delete(query);
    tracing::trace!(sql = %sql, arguments = arguments.len(), "delete_all");
    executor.execute_statement(&sql, &arguments)
}
