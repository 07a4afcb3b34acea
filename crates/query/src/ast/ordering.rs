//! Ordering terms for ORDER BY.

use crate::ast::expr::{Expr, SqlExpression};
use crate::sql::SqlContext;
use alloc::boxed::Box;
use core::fmt;
use dyn_clone::DynClone;

/// Something that can appear in an ORDER BY list.
pub trait SqlOrdering: DynClone + fmt::Debug + Send + Sync {
    /// Appends the ordering term to `ctx`, binding literals as arguments.
    fn write_ordering_sql(&self, ctx: &mut SqlContext);

    /// Returns the same term with its direction flipped.
    fn reversed(&self) -> Box<dyn SqlOrdering>;
}

impl Clone for Box<dyn SqlOrdering> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

impl<T: SqlOrdering + 'static> From<T> for Box<dyn SqlOrdering> {
    fn from(ordering: T) -> Self {
        Box::new(ordering)
    }
}

/// Sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Returns the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Returns the SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// An expression with an explicit sort direction.
#[derive(Clone, Debug)]
pub struct OrderingTerm {
    /// Sorted expression.
    pub expr: Box<dyn SqlExpression>,
    /// Sort direction.
    pub order: SortOrder,
}

impl OrderingTerm {
    /// Creates an ordering term.
    pub fn new(expr: impl Into<Box<dyn SqlExpression>>, order: SortOrder) -> Self {
        Self {
            expr: expr.into(),
            order,
        }
    }

    /// Creates an ascending ordering term.
    pub fn asc(expr: impl Into<Box<dyn SqlExpression>>) -> Self {
        Self::new(expr, SortOrder::Asc)
    }

    /// Creates a descending ordering term.
    pub fn desc(expr: impl Into<Box<dyn SqlExpression>>) -> Self {
        Self::new(expr, SortOrder::Desc)
    }

    /// Ordering on the implicit row identity, descending. Used to reverse a
    /// query that has no explicit ordering.
    pub fn row_id_desc() -> Self {
        Self::desc(Expr::row_id())
    }
}

impl SqlOrdering for OrderingTerm {
    fn write_ordering_sql(&self, ctx: &mut SqlContext) {
        self.expr.write_sql(ctx);
        ctx.push_str(" ");
        ctx.push_str(self.order.as_sql());
    }

    fn reversed(&self) -> Box<dyn SqlOrdering> {
        Box::new(Self {
            expr: self.expr.clone(),
            order: self.order.reversed(),
        })
    }
}

impl Expr {
    /// Orders by this expression, ascending.
    pub fn asc(self) -> OrderingTerm {
        OrderingTerm::asc(self)
    }

    /// Orders by this expression, descending.
    pub fn desc(self) -> OrderingTerm {
        OrderingTerm::desc(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use vista_core::Value;

    fn render(ordering: &dyn SqlOrdering) -> (String, usize) {
        let mut ctx = SqlContext::new();
        ordering.write_ordering_sql(&mut ctx);
        let (sql, arguments) = ctx.finish();
        (sql, arguments.len())
    }

    #[test]
    fn test_sort_order_reversed() {
        assert_eq!(SortOrder::Asc.reversed(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.reversed(), SortOrder::Asc);
        assert_eq!(SortOrder::default(), SortOrder::Asc);
    }

    #[test]
    fn test_render_terms() {
        assert_eq!(render(&Expr::column("id").asc()).0, "\"id\" ASC");
        assert_eq!(render(&Expr::column("id").desc()).0, "\"id\" DESC");
        assert_eq!(render(&OrderingTerm::row_id_desc()).0, "\"rowid\" DESC");
    }

    #[test]
    fn test_reversed_term() {
        let term = Expr::column("score").desc();
        let reversed = term.reversed();
        assert_eq!(render(reversed.as_ref()).0, "\"score\" ASC");
        assert_eq!(render(reversed.reversed().as_ref()).0, "\"score\" DESC");
    }

    #[test]
    fn test_term_binds_arguments() {
        let term = Expr::function("abs", alloc::vec![Expr::arithmetic(
            Expr::column("a"),
            crate::ast::BinaryOp::Sub,
            Expr::literal(Value::Integer(3)),
        )])
        .asc();
        let (sql, count) = render(&term);
        assert_eq!(sql, "abs(\"a\" - ?) ASC");
        assert_eq!(count, 1);
    }
}
