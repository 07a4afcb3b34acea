//! Property-based tests for SQL rendering.
//!
//! These tests verify that bound arguments always line up with placeholders
//! and that ordering reversal is well behaved for random query shapes.

use proptest::prelude::*;
use vista_core::Value;
use vista_query::ast::{Expr, OrderingTerm, SortOrder};
use vista_query::{count_query, render, QueryDefinition};

/// Strategy for generating literal values.
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Integer),
        "[a-z]{0,8}".prop_map(Value::Text),
    ]
}

/// Strategy for generating ordering terms over a small set of columns.
fn ordering_strategy() -> impl Strategy<Value = OrderingTerm> {
    ("[a-c]", any::<bool>()).prop_map(|(column, ascending)| {
        let order = if ascending { SortOrder::Asc } else { SortOrder::Desc };
        OrderingTerm::new(Expr::column(column), order)
    })
}

fn filtered(values: &[Value]) -> QueryDefinition {
    values.iter().enumerate().fold(QueryDefinition::table("t"), |query, (i, value)| {
        query.filter(Expr::ne(
            Expr::column(format!("c{i}")),
            Expr::literal(value.clone()),
        ))
    })
}

proptest! {
    /// Property: one argument per placeholder, in filter order.
    #[test]
    fn arguments_match_placeholders(values in prop::collection::vec(value_strategy(), 0..8)) {
        let (sql, arguments) = render(&filtered(&values));
        let non_null: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
        prop_assert_eq!(sql.matches('?').count(), arguments.len());
        prop_assert_eq!(arguments.as_slice(), non_null.as_slice());
    }

    /// Property: reversing twice renders the same SQL as not reversing.
    #[test]
    fn double_reversal_is_identity(orderings in prop::collection::vec(ordering_strategy(), 0..5)) {
        let query = QueryDefinition::table("t").order(orderings);
        prop_assert_eq!(render(&query.clone().reversed().reversed()), render(&query));
    }

    /// Property: a reversed query keeps the number of ordering terms.
    #[test]
    fn reversal_keeps_term_count(orderings in prop::collection::vec(ordering_strategy(), 1..5)) {
        let count = orderings.len();
        let (sql, _) = render(&QueryDefinition::table("t").order(orderings).reversed());
        let order_by = sql.split(" ORDER BY ").nth(1).unwrap_or_default();
        prop_assert_eq!(order_by.split(", ").count(), count);
    }

    /// Property: counting keeps the filter arguments and drops ordering.
    #[test]
    fn count_query_keeps_arguments(
        values in prop::collection::vec(value_strategy(), 0..6),
        orderings in prop::collection::vec(ordering_strategy(), 0..3),
        limited in any::<bool>(),
    ) {
        let mut query = filtered(&values).order(orderings);
        if limited {
            query = query.limit(10, None);
        }
        let (_, expected) = render(&query.clone().unordered());
        let (sql, arguments) = render(&count_query(&query));
        prop_assert!(sql.starts_with("SELECT COUNT(*)"));
        prop_assert!(!sql.contains("ORDER BY"));
        prop_assert_eq!(arguments, expected);
    }
}
