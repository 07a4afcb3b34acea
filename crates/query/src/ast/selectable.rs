//! Selectable definitions for the SELECT list.

use crate::ast::expr::{Expr, SqlExpression};
use crate::sql::SqlContext;
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;
use dyn_clone::DynClone;

/// Something that can appear in a SELECT list.
pub trait SqlSelectable: DynClone + fmt::Debug + Send + Sync {
    /// Appends the selectable to `ctx`, binding literals as arguments.
    fn write_selection_sql(&self, ctx: &mut SqlContext);

    /// Returns a selectable that counts the rows this selectable would
    /// produce when it is the only one projected from `table` (aliased
    /// `alias`), with `DISTINCT` applied when `distinct` is set.
    ///
    /// Returns `None` when no cheaper equivalent can be proven correct; the
    /// caller then counts through a subquery.
    fn counting_selectable(
        &self,
        distinct: bool,
        table: &str,
        alias: Option<&str>,
    ) -> Option<Box<dyn SqlSelectable>> {
        let _ = (distinct, table, alias);
        None
    }
}

impl Clone for Box<dyn SqlSelectable> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

impl<T: SqlSelectable + 'static> From<T> for Box<dyn SqlSelectable> {
    fn from(selectable: T) -> Self {
        Box::new(selectable)
    }
}

impl SqlSelectable for Expr {
    fn write_selection_sql(&self, ctx: &mut SqlContext) {
        self.write_sql(ctx);
    }

    fn counting_selectable(
        &self,
        distinct: bool,
        table: &str,
        alias: Option<&str>,
    ) -> Option<Box<dyn SqlSelectable>> {
        if self.contains_aggregate() {
            // Aggregates collapse rows: the count is not the row count.
            return None;
        }
        if !distinct {
            if let Some(column) = self.as_column() {
                if !column.belongs_to(table, alias) {
                    return None;
                }
            }
            return Some(Box::new(Expr::count_star()));
        }
        // `SELECT DISTINCT x` keeps one NULL row where `COUNT(DISTINCT x)`
        // skips NULLs, so only the never-null row identity is safe.
        match self.as_column() {
            Some(column) if column.is_row_id() && column.belongs_to(table, alias) => {
                Some(Box::new(Expr::count_star()))
            }
            _ => None,
        }
    }
}

/// All columns of the source (`*`) or of one qualified source (`"t".*`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllColumns {
    /// Table name or alias the star is qualified with.
    pub qualifier: Option<String>,
}

impl AllColumns {
    /// Creates an unqualified `*`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a qualified `"table".*`.
    pub fn qualified(table: impl Into<String>) -> Self {
        Self {
            qualifier: Some(table.into()),
        }
    }
}

impl SqlSelectable for AllColumns {
    fn write_selection_sql(&self, ctx: &mut SqlContext) {
        if let Some(qualifier) = &self.qualifier {
            ctx.push_identifier(qualifier);
            ctx.push_str(".");
        }
        ctx.push_str("*");
    }

    fn counting_selectable(
        &self,
        distinct: bool,
        table: &str,
        alias: Option<&str>,
    ) -> Option<Box<dyn SqlSelectable>> {
        if distinct {
            return None;
        }
        let belongs = match &self.qualifier {
            None => true,
            Some(qualifier) => qualifier.eq_ignore_ascii_case(alias.unwrap_or(table)),
        };
        if belongs {
            Some(Box::new(Expr::count_star()))
        } else {
            None
        }
    }
}

/// A selectable renamed with `AS`.
#[derive(Clone, Debug)]
pub struct Aliased {
    /// The aliased selectable.
    pub selectable: Box<dyn SqlSelectable>,
    /// Result column name.
    pub alias: String,
}

impl Aliased {
    /// Creates an aliased selectable.
    pub fn new(selectable: impl Into<Box<dyn SqlSelectable>>, alias: impl Into<String>) -> Self {
        Self {
            selectable: selectable.into(),
            alias: alias.into(),
        }
    }
}

impl SqlSelectable for Aliased {
    fn write_selection_sql(&self, ctx: &mut SqlContext) {
        self.selectable.write_selection_sql(ctx);
        ctx.push_str(" AS ");
        ctx.push_identifier(&self.alias);
    }

    fn counting_selectable(
        &self,
        distinct: bool,
        table: &str,
        alias: Option<&str>,
    ) -> Option<Box<dyn SqlSelectable>> {
        self.selectable.counting_selectable(distinct, table, alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use vista_core::Value;

    fn render(selectable: &dyn SqlSelectable) -> String {
        let mut ctx = SqlContext::new();
        selectable.write_selection_sql(&mut ctx);
        ctx.finish().0
    }

    fn counted(
        selectable: &dyn SqlSelectable,
        distinct: bool,
        alias: Option<&str>,
    ) -> Option<String> {
        selectable
            .counting_selectable(distinct, "t", alias)
            .map(|s| render(s.as_ref()))
    }

    #[test]
    fn test_render_all_columns() {
        assert_eq!(render(&AllColumns::new()), "*");
        assert_eq!(render(&AllColumns::qualified("t")), "\"t\".*");
    }

    #[test]
    fn test_render_aliased() {
        let aliased = Aliased::new(Expr::count_star(), "n");
        assert_eq!(render(&aliased), "COUNT(*) AS \"n\"");
    }

    #[test]
    fn test_all_columns_counting() {
        assert_eq!(counted(&AllColumns::new(), false, None).as_deref(), Some("COUNT(*)"));
        assert_eq!(counted(&AllColumns::new(), true, None), None);
        assert_eq!(
            counted(&AllColumns::qualified("x"), false, Some("x")).as_deref(),
            Some("COUNT(*)")
        );
        assert_eq!(counted(&AllColumns::qualified("other"), false, None), None);
    }

    #[test]
    fn test_expression_counting() {
        let column = Expr::column("name");
        assert_eq!(counted(&column, false, None).as_deref(), Some("COUNT(*)"));
        assert_eq!(counted(&column, true, None), None);

        assert_eq!(
            counted(&Expr::row_id(), true, None).as_deref(),
            Some("COUNT(*)")
        );
        assert_eq!(counted(&Expr::max(Expr::column("a")), false, None), None);
        assert_eq!(
            counted(&Expr::qualified_column("other", "a"), false, None),
            None
        );

        let computed = Expr::gt(Expr::column("a"), Expr::literal(Value::Integer(1)));
        assert_eq!(counted(&computed, false, None).as_deref(), Some("COUNT(*)"));
    }

    #[test]
    fn test_aliased_counting_delegates() {
        let aliased = Aliased::new(Expr::column("a"), "b");
        assert_eq!(counted(&aliased, false, None).as_deref(), Some("COUNT(*)"));
        assert_eq!(counted(&aliased, true, None), None);
    }
}
