//! AST module for renderable expressions, selectables and orderings.

mod expr;
mod ordering;
mod selectable;

pub use expr::{AggregateFunc, BinaryOp, ColumnRef, Conjunction, Expr, SqlExpression, UnaryOp};
pub use ordering::{OrderingTerm, SortOrder, SqlOrdering};
pub use selectable::{AllColumns, Aliased, SqlSelectable};
