//! Vista Query - SQL compilation for structured query definitions.
//!
//! This crate turns composable query descriptions into SQL text plus an
//! ordered argument list:
//!
//! - `ast`: Renderable expressions, selectables and ordering terms
//! - `sql`: Identifier quoting and the `SqlContext` render accumulator
//! - `query`: `QueryDefinition`, `Source` and `Limit`
//! - `render`: SELECT rendering
//! - `delete`: DELETE rendering
//! - `optimizer`: Query rewrites such as the count query
//! - `exec`: Helpers running definitions through an `Executor`
//!
//! # Example
//!
//! ```
//! use vista_query::ast::Expr;
//! use vista_query::{count_query, render, QueryDefinition};
//! use vista_core::Value;
//!
//! let query = QueryDefinition::table("player")
//!     .select([Expr::column("name"), Expr::column("score")])
//!     .filter(Expr::ge(Expr::column("score"), Expr::literal(Value::Integer(1000))))
//!     .order([Expr::column("score").desc()]);
//!
//! let (sql, arguments) = render(&query);
//! assert_eq!(
//!     sql,
//!     "SELECT \"name\", \"score\" FROM \"player\" WHERE \"score\" >= ? ORDER BY \"score\" DESC"
//! );
//! assert_eq!(arguments.as_slice(), &[Value::Integer(1000)]);
//!
//! let (sql, _) = render(&count_query(&query));
//! assert_eq!(sql, "SELECT COUNT(*) FROM \"player\" WHERE \"score\" >= ?");
//! ```

#![no_std]

extern crate alloc;

pub mod ast;
pub mod delete;
pub mod exec;
pub mod optimizer;
pub mod query;
pub mod render;
pub mod sql;

pub use delete::render_delete;
pub use optimizer::count_query;
pub use query::{Limit, QueryDefinition, Source};
pub use render::render;
pub use sql::{quote_identifier, Arguments, SqlContext};
