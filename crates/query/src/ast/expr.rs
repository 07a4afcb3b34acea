//! Expression AST definitions.
//!
//! `SqlExpression` is the rendering capability consumed by the query
//! compiler. `Expr` is the expression tree shipped with this crate; any other
//! type may implement the trait and be used wherever an expression is
//! expected.

use crate::sql::SqlContext;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use dyn_clone::DynClone;
use vista_core::Value;

/// Something that renders itself as an SQL expression.
pub trait SqlExpression: DynClone + fmt::Debug + Send + Sync {
    /// Appends the expression to `ctx`, binding literals as arguments.
    fn write_sql(&self, ctx: &mut SqlContext);

    /// Returns true if the expression must be parenthesized when nested
    /// inside another operator.
    fn is_compound(&self) -> bool {
        true
    }
}

impl Clone for Box<dyn SqlExpression> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

impl<T: SqlExpression + 'static> From<T> for Box<dyn SqlExpression> {
    fn from(expr: T) -> Self {
        Box::new(expr)
    }
}

/// Reference to a column, optionally qualified by a table name or alias.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Table name (or alias).
    pub table: Option<String>,
    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// Creates an unqualified column reference.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    /// Creates a column reference qualified by a table name or alias.
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Returns the normalized name (table.column).
    pub fn normalized_name(&self) -> String {
        match &self.table {
            Some(table) => alloc::format!("{}.{}", table, self.column),
            None => self.column.clone(),
        }
    }

    /// Returns true if the reference resolves against the source named
    /// `table` or aliased `alias`.
    pub fn belongs_to(&self, table: &str, alias: Option<&str>) -> bool {
        match &self.table {
            None => true,
            Some(qualifier) => qualifier.eq_ignore_ascii_case(alias.unwrap_or(table)),
        }
    }

    /// Returns true if this is the implicit row identity column.
    pub fn is_row_id(&self) -> bool {
        self.column.eq_ignore_ascii_case("rowid")
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // String/Pattern
    Like,
    Concat,
}

impl BinaryOp {
    /// Returns the SQL operator token.
    pub fn as_sql(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Like => "LIKE",
            BinaryOp::Concat => "||",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// Aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Total,
}

impl AggregateFunc {
    /// Returns the SQL function name.
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Total => "TOTAL",
        }
    }
}

/// Expression AST node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(ColumnRef),
    /// Literal value, always bound as an argument.
    Literal(Value),
    /// Binary operation.
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// Function call.
    Function { name: String, args: Vec<Expr> },
    /// Aggregate function. `expr: None` means `*`.
    Aggregate {
        func: AggregateFunc,
        expr: Option<Box<Expr>>,
        distinct: bool,
    },
    /// BETWEEN / NOT BETWEEN expression.
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// IN / NOT IN expression.
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
}

impl Expr {
    /// Creates an unqualified column reference expression.
    pub fn column(column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(column))
    }

    /// Creates a qualified column reference expression.
    pub fn qualified_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::qualified(table, column))
    }

    /// Creates the implicit row identity column expression.
    pub fn row_id() -> Self {
        Expr::column("rowid")
    }

    /// Creates a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Creates an equality expression.
    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    /// Creates a not-equal expression.
    pub fn ne(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Ne, right)
    }

    /// Creates a less-than expression.
    pub fn lt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Lt, right)
    }

    /// Creates a less-than-or-equal expression.
    pub fn le(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Le, right)
    }

    /// Creates a greater-than expression.
    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Gt, right)
    }

    /// Creates a greater-than-or-equal expression.
    pub fn ge(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Ge, right)
    }

    /// Creates an AND expression.
    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::And, right)
    }

    /// Creates an OR expression.
    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Or, right)
    }

    /// Creates an arithmetic expression.
    pub fn arithmetic(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Self::binary(left, op, right)
    }

    /// Creates a string concatenation expression.
    pub fn concat(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Concat, right)
    }

    /// Creates a LIKE expression.
    pub fn like(expr: Expr, pattern: &str) -> Self {
        Self::binary(expr, BinaryOp::Like, Expr::literal(pattern))
    }

    /// Creates a NOT expression.
    pub fn not(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::Not,
            expr: Box::new(expr),
        }
    }

    /// Creates a negation expression.
    pub fn neg(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            expr: Box::new(expr),
        }
    }

    /// Creates an IS NULL expression.
    pub fn is_null(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::IsNull,
            expr: Box::new(expr),
        }
    }

    /// Creates an IS NOT NULL expression.
    pub fn is_not_null(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::IsNotNull,
            expr: Box::new(expr),
        }
    }

    /// Creates a BETWEEN expression.
    pub fn between(expr: Expr, low: Expr, high: Expr) -> Self {
        Expr::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    /// Creates a NOT BETWEEN expression.
    pub fn not_between(expr: Expr, low: Expr, high: Expr) -> Self {
        Expr::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: true,
        }
    }

    /// Creates an IN expression.
    pub fn in_list(expr: Expr, values: Vec<Value>) -> Self {
        Expr::In {
            expr: Box::new(expr),
            list: values.into_iter().map(Expr::Literal).collect(),
            negated: false,
        }
    }

    /// Creates a NOT IN expression.
    pub fn not_in_list(expr: Expr, values: Vec<Value>) -> Self {
        Expr::In {
            expr: Box::new(expr),
            list: values.into_iter().map(Expr::Literal).collect(),
            negated: true,
        }
    }

    /// Creates a function call.
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    /// Creates a COUNT(*) aggregate.
    pub fn count_star() -> Self {
        Expr::Aggregate {
            func: AggregateFunc::Count,
            expr: None,
            distinct: false,
        }
    }

    /// Creates a COUNT(expr) aggregate.
    pub fn count(expr: Expr) -> Self {
        Self::aggregate(AggregateFunc::Count, expr)
    }

    /// Creates a COUNT(DISTINCT expr) aggregate.
    pub fn count_distinct(expr: Expr) -> Self {
        Expr::Aggregate {
            func: AggregateFunc::Count,
            expr: Some(Box::new(expr)),
            distinct: true,
        }
    }

    /// Creates a SUM aggregate.
    pub fn sum(expr: Expr) -> Self {
        Self::aggregate(AggregateFunc::Sum, expr)
    }

    /// Creates an AVG aggregate.
    pub fn avg(expr: Expr) -> Self {
        Self::aggregate(AggregateFunc::Avg, expr)
    }

    /// Creates a MIN aggregate.
    pub fn min(expr: Expr) -> Self {
        Self::aggregate(AggregateFunc::Min, expr)
    }

    /// Creates a MAX aggregate.
    pub fn max(expr: Expr) -> Self {
        Self::aggregate(AggregateFunc::Max, expr)
    }

    fn aggregate(func: AggregateFunc, expr: Expr) -> Self {
        Expr::Aggregate {
            func,
            expr: Some(Box::new(expr)),
            distinct: false,
        }
    }

    /// Returns the column reference if this is a column.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(column) => Some(column),
            _ => None,
        }
    }

    /// Returns true if this expression contains an aggregate function.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Column(_) | Expr::Literal(_) => false,
            Expr::BinaryOp { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expr::UnaryOp { expr, .. } => expr.contains_aggregate(),
            Expr::Function { args, .. } => args.iter().any(Expr::contains_aggregate),
            Expr::Between {
                expr, low, high, ..
            } => expr.contains_aggregate() || low.contains_aggregate() || high.contains_aggregate(),
            Expr::In { expr, list, .. } => {
                expr.contains_aggregate() || list.iter().any(Expr::contains_aggregate)
            }
        }
    }

    fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Literal(Value::Null))
    }
}

// Writes a nested operand, parenthesized when it is itself an operator.
fn write_operand(expr: &Expr, ctx: &mut SqlContext) {
    if expr.is_compound() {
        ctx.push_str("(");
        expr.write_sql(ctx);
        ctx.push_str(")");
    } else {
        expr.write_sql(ctx);
    }
}

impl SqlExpression for Expr {
    fn write_sql(&self, ctx: &mut SqlContext) {
        match self {
            Expr::Column(column) => {
                if let Some(table) = &column.table {
                    ctx.push_identifier(table);
                    ctx.push_str(".");
                }
                ctx.push_identifier(&column.column);
            }
            Expr::Literal(value) => ctx.push_argument(value.clone()),
            // Comparisons against NULL never hold; render the IS forms instead.
            Expr::BinaryOp { left, op, right }
                if matches!(op, BinaryOp::Eq | BinaryOp::Ne)
                    && (left.is_null_literal() || right.is_null_literal()) =>
            {
                let tested = if right.is_null_literal() { left } else { right };
                write_operand(tested, ctx);
                ctx.push_str(if *op == BinaryOp::Eq {
                    " IS NULL"
                } else {
                    " IS NOT NULL"
                });
            }
            Expr::BinaryOp { left, op, right } => {
                write_operand(left, ctx);
                ctx.push_str(" ");
                ctx.push_str(op.as_sql());
                ctx.push_str(" ");
                write_operand(right, ctx);
            }
            Expr::UnaryOp { op, expr } => match op {
                UnaryOp::Not => {
                    ctx.push_str("NOT ");
                    write_operand(expr, ctx);
                }
                UnaryOp::Neg => {
                    ctx.push_str("-");
                    write_operand(expr, ctx);
                }
                UnaryOp::IsNull => {
                    write_operand(expr, ctx);
                    ctx.push_str(" IS NULL");
                }
                UnaryOp::IsNotNull => {
                    write_operand(expr, ctx);
                    ctx.push_str(" IS NOT NULL");
                }
            },
            Expr::Function { name, args } => {
                ctx.push_str(name);
                ctx.push_str("(");
                ctx.push_joined(args, ", ", |arg, ctx| arg.write_sql(ctx));
                ctx.push_str(")");
            }
            Expr::Aggregate {
                func,
                expr,
                distinct,
            } => {
                ctx.push_str(func.as_sql());
                ctx.push_str("(");
                if *distinct {
                    ctx.push_str("DISTINCT ");
                }
                match expr {
                    Some(expr) => expr.write_sql(ctx),
                    None => ctx.push_str("*"),
                }
                ctx.push_str(")");
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                write_operand(expr, ctx);
                ctx.push_str(if *negated {
                    " NOT BETWEEN "
                } else {
                    " BETWEEN "
                });
                write_operand(low, ctx);
                ctx.push_str(" AND ");
                write_operand(high, ctx);
            }
            // An empty list can never match: `x IN ()` is not portable SQL.
            Expr::In { list, negated, .. } if list.is_empty() => {
                ctx.push_str(if *negated { "1" } else { "0" });
            }
            Expr::In {
                expr,
                list,
                negated,
            } => {
                write_operand(expr, ctx);
                ctx.push_str(if *negated { " NOT IN (" } else { " IN (" });
                ctx.push_joined(list, ", ", |item, ctx| item.write_sql(ctx));
                ctx.push_str(")");
            }
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::BinaryOp { .. } | Expr::UnaryOp { .. } | Expr::Between { .. } | Expr::In { .. }
        )
    }
}

/// Conjunction of opaque expressions, as built by successive filters.
#[derive(Clone, Debug)]
pub struct Conjunction {
    terms: Vec<Box<dyn SqlExpression>>,
}

impl Conjunction {
    /// Creates a conjunction of the given terms.
    pub fn new(terms: Vec<Box<dyn SqlExpression>>) -> Self {
        Self { terms }
    }

    /// Returns the terms.
    pub fn terms(&self) -> &[Box<dyn SqlExpression>] {
        &self.terms
    }
}

impl SqlExpression for Conjunction {
    fn write_sql(&self, ctx: &mut SqlContext) {
        match self.terms.as_slice() {
            [] => ctx.push_str("1"),
            [single] => single.write_sql(ctx),
            terms => ctx.push_joined(terms, " AND ", |term, ctx| {
                if term.is_compound() {
                    ctx.push_str("(");
                    term.write_sql(ctx);
                    ctx.push_str(")");
                } else {
                    term.write_sql(ctx);
                }
            }),
        }
    }

    fn is_compound(&self) -> bool {
        match self.terms.as_slice() {
            [single] => single.is_compound(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn render(expr: &dyn SqlExpression) -> (String, Vec<Value>) {
        let mut ctx = SqlContext::new();
        expr.write_sql(&mut ctx);
        let (sql, arguments) = ctx.finish();
        (sql, arguments.into_vec())
    }

    #[test]
    fn test_column_ref() {
        let col = ColumnRef::qualified("users", "id");
        assert_eq!(col.normalized_name(), "users.id");
        assert!(col.belongs_to("users", None));
        assert!(!col.belongs_to("users", Some("u")));
        assert!(ColumnRef::new("id").belongs_to("anything", Some("a")));
        assert!(ColumnRef::new("ROWID").is_row_id());
    }

    #[test]
    fn test_render_column() {
        assert_eq!(render(&Expr::column("id")).0, "\"id\"");
        assert_eq!(render(&Expr::qualified_column("t", "id")).0, "\"t\".\"id\"");
    }

    #[test]
    fn test_render_comparison_binds_literal() {
        let (sql, args) = render(&Expr::gt(Expr::column("score"), Expr::literal(10i64)));
        assert_eq!(sql, "\"score\" > ?");
        assert_eq!(args, vec![Value::Integer(10)]);
    }

    #[test]
    fn test_render_null_comparison() {
        let (sql, args) = render(&Expr::eq(Expr::column("a"), Expr::Literal(Value::Null)));
        assert_eq!(sql, "\"a\" IS NULL");
        assert!(args.is_empty());

        let (sql, _) = render(&Expr::ne(Expr::column("a"), Expr::Literal(Value::Null)));
        assert_eq!(sql, "\"a\" IS NOT NULL");
    }

    #[test]
    fn test_render_null_on_the_left() {
        let (sql, args) = render(&Expr::eq(Expr::Literal(Value::Null), Expr::column("a")));
        assert_eq!(sql, "\"a\" IS NULL");
        assert!(args.is_empty());

        let (sql, args) = render(&Expr::ne(
            Expr::Literal(Value::Null),
            Expr::arithmetic(Expr::column("a"), BinaryOp::Add, Expr::literal(1i64)),
        ));
        assert_eq!(sql, "(\"a\" + ?) IS NOT NULL");
        assert_eq!(args, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_render_nested_logic() {
        let expr = Expr::and(
            Expr::eq(Expr::column("a"), Expr::literal(1i64)),
            Expr::or(
                Expr::lt(Expr::column("b"), Expr::literal(2i64)),
                Expr::not(Expr::is_null(Expr::column("c"))),
            ),
        );
        let (sql, args) = render(&expr);
        assert_eq!(
            sql,
            "(\"a\" = ?) AND ((\"b\" < ?) OR (NOT (\"c\" IS NULL)))"
        );
        assert_eq!(args, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_render_in_list() {
        let (sql, args) = render(&Expr::in_list(
            Expr::column("id"),
            vec![Value::Integer(1), Value::Integer(2)],
        ));
        assert_eq!(sql, "\"id\" IN (?, ?)");
        assert_eq!(args.len(), 2);

        assert_eq!(render(&Expr::in_list(Expr::column("id"), vec![])).0, "0");
        assert_eq!(render(&Expr::not_in_list(Expr::column("id"), vec![])).0, "1");
    }

    #[test]
    fn test_render_between_and_functions() {
        let (sql, args) = render(&Expr::not_between(
            Expr::column("n"),
            Expr::literal(1i64),
            Expr::literal(5i64),
        ));
        assert_eq!(sql, "\"n\" NOT BETWEEN ? AND ?");
        assert_eq!(args, vec![Value::Integer(1), Value::Integer(5)]);

        let (sql, _) = render(&Expr::function("lower", vec![Expr::column("name")]));
        assert_eq!(sql, "lower(\"name\")");
    }

    #[test]
    fn test_render_aggregates() {
        assert_eq!(render(&Expr::count_star()).0, "COUNT(*)");
        assert_eq!(
            render(&Expr::count_distinct(Expr::column("a"))).0,
            "COUNT(DISTINCT \"a\")"
        );
        assert_eq!(render(&Expr::max(Expr::column("a"))).0, "MAX(\"a\")");
    }

    #[test]
    fn test_contains_aggregate() {
        assert!(Expr::count_star().contains_aggregate());
        assert!(Expr::arithmetic(Expr::sum(Expr::column("a")), BinaryOp::Add, Expr::literal(1i64))
            .contains_aggregate());
        assert!(!Expr::eq(Expr::column("a"), Expr::literal(1i64)).contains_aggregate());
    }

    #[test]
    fn test_conjunction() {
        let single = Conjunction::new(vec![Expr::column("active").into()]);
        assert_eq!(render(&single).0, "\"active\"");
        assert!(!single.is_compound());

        let pair = Conjunction::new(vec![
            Expr::column("active").into(),
            Expr::gt(Expr::column("score"), Expr::literal(3i64)).into(),
        ]);
        let (sql, args) = render(&pair);
        assert_eq!(sql, "\"active\" AND (\"score\" > ?)");
        assert_eq!(args, vec![Value::Integer(3)]);
    }
}
