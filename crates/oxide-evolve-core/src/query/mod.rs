//! Typed SQL expressions and statement builders.
//!
//! Expressions are a closed AST ([`Expr`]) over column references,
//! constants, aggregates and operators. [`compile`] turns one into SQL with
//! named `:pN` placeholders; every constant is bound, never spliced, so
//! hostile input cannot change the statement's shape.
//!
//! ```rust
//! use oxide_evolve_core::dialect::Dialect;
//! use oxide_evolve_core::query::{column, Update};
//!
//! let query = Update::table("users")
//!     .set("name", "'; DROP TABLE users; --")
//!     .where_clause(column("id").eq(1))
//!     .build(Dialect::Postgres);
//!
//! assert_eq!(query.sql, "UPDATE \"users\" SET \"name\" = :p1 WHERE \"id\" = :p2");
//!
//! let (sql, params) = query.to_positional(Dialect::Postgres);
//! assert_eq!(sql, "UPDATE \"users\" SET \"name\" = $1 WHERE \"id\" = $2");
//! assert_eq!(params.len(), 2);
//! ```

mod compile;
mod delete;
mod expr;
mod insert;
mod select;
mod update;
mod upsert;
mod value;

pub use compile::{compile, Binding, CompiledQuery, Fragment, ParamAllocator};
pub use delete::Delete;
pub use expr::{
    all, any, avg, col, column, count, count_all, max, min, sum, AggregateFunction, ColumnRef,
    CompareOp, Expr, MathOp,
};
pub use insert::Insert;
pub use select::{HasColumns, HasFrom, JoinKind, NoColumns, NoFrom, Order, Select};
pub use update::{HasSet, NoSet, Update};
pub use upsert::Upsert;
pub use value::{SqlValue, ToSqlValue};

/// Marker: no values specified yet.
pub struct NoValues;
/// Marker: at least one value specified.
pub struct HasValues;
