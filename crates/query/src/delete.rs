//! DELETE statement compilation.

use crate::query::QueryDefinition;
use crate::render::write_source;
use crate::sql::{Arguments, SqlContext};
use alloc::string::String;

/// Renders `DELETE [FROM <source>] [WHERE <filter>]` for a query.
///
/// Selection, distinct flag and orderings are ignored.
///
/// # Panics
///
/// Panics if the query has a GROUP BY, HAVING or LIMIT clause.
pub fn render_delete(query: &QueryDefinition) -> (String, Arguments) {
    assert!(
        query.group_by.is_empty(),
        "cannot delete from a query with a GROUP BY clause"
    );
    assert!(
        query.having.is_none(),
        "cannot delete from a query with a HAVING clause"
    );
    assert!(
        query.limit.is_none(),
        "cannot delete from a query with a LIMIT clause"
    );

    let mut ctx = SqlContext::new();
    ctx.push_str("DELETE");
    if let Some(source) = &query.source {
        ctx.push_str(" FROM ");
        write_source(source, &mut ctx);
    }
    if let Some(filter) = &query.filter {
        ctx.push_str(" WHERE ");
        filter.write_sql(&mut ctx);
    }
    ctx.finish()
}
