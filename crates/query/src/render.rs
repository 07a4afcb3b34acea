//! SQL rendering for query definitions.
//!
//! Clauses are rendered left to right in a fixed order:
//!
//! ```text
//! SELECT [DISTINCT] <selection> [FROM <source>] [WHERE <filter>]
//!     [GROUP BY <group_by>] [HAVING <having>] [ORDER BY <orderings>]
//!     [LIMIT <limit>]
//! ```
//!
//! Every literal is bound as a positional `?` argument in the order it is
//! encountered, so the returned arguments line up with the placeholders.

use crate::ast::{OrderingTerm, SqlOrdering};
use crate::query::{Limit, QueryDefinition, Source};
use crate::sql::{Arguments, SqlContext};
use alloc::format;
use alloc::string::String;

/// Renders a query to SQL text and its arguments.
///
/// # Panics
///
/// Panics if the query, or any nested subquery, has an empty selection.
pub fn render(query: &QueryDefinition) -> (String, Arguments) {
    let mut ctx = SqlContext::new();
    write_select(query, &mut ctx);
    ctx.finish()
}

pub(crate) fn write_select(query: &QueryDefinition, ctx: &mut SqlContext) {
    assert!(
        !query.selection.is_empty(),
        "cannot render a query with an empty selection"
    );

    ctx.push_str("SELECT ");
    if query.is_distinct {
        ctx.push_str("DISTINCT ");
    }
    ctx.push_joined(&query.selection, ", ", |selectable, ctx| {
        selectable.write_selection_sql(ctx)
    });

    if let Some(source) = &query.source {
        ctx.push_str(" FROM ");
        write_source(source, ctx);
    }

    if let Some(filter) = &query.filter {
        ctx.push_str(" WHERE ");
        filter.write_sql(ctx);
    }

    if !query.group_by.is_empty() {
        ctx.push_str(" GROUP BY ");
        ctx.push_joined(&query.group_by, ", ", |expr, ctx| expr.write_sql(ctx));
    }

    if let Some(having) = &query.having {
        ctx.push_str(" HAVING ");
        having.write_sql(ctx);
    }

    write_orderings(query, ctx);

    if let Some(limit) = &query.limit {
        ctx.push_str(" LIMIT ");
        write_limit(limit, ctx);
    }
}

pub(crate) fn write_source(source: &Source, ctx: &mut SqlContext) {
    match source {
        Source::Table { name, .. } => ctx.push_identifier(name),
        Source::Subquery { query, .. } => {
            ctx.push_str("(");
            write_select(query, ctx);
            ctx.push_str(")");
        }
    }
    if let Some(alias) = source.alias() {
        ctx.push_str(" AS ");
        ctx.push_identifier(alias);
    }
}

fn write_orderings(query: &QueryDefinition, ctx: &mut SqlContext) {
    if query.orderings.is_empty() {
        if query.is_reversed {
            // Assumes no user column shadows the implicit row identity.
            ctx.push_str(" ORDER BY ");
            OrderingTerm::row_id_desc().write_ordering_sql(ctx);
        }
        return;
    }

    ctx.push_str(" ORDER BY ");
    if query.is_reversed {
        ctx.push_joined(&query.orderings, ", ", |ordering, ctx| {
            ordering.reversed().write_ordering_sql(ctx)
        });
    } else {
        ctx.push_joined(&query.orderings, ", ", |ordering, ctx| {
            ordering.write_ordering_sql(ctx)
        });
    }
}

fn write_limit(limit: &Limit, ctx: &mut SqlContext) {
    let text = match limit.offset() {
        Some(offset) => format!("{} OFFSET {}", limit.count(), offset),
        None => format!("{}", limit.count()),
    };
    ctx.push_str(&text);
}
