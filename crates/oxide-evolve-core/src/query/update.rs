//! UPDATE builder.

use std::marker::PhantomData;

use super::compile::{CompiledQuery, ParamAllocator, Writer};
use super::expr::Expr;
use super::value::ToSqlValue;
use crate::dialect::Dialect;

/// Marker: no assignment yet.
pub struct NoSet;
/// Marker: at least one assignment.
pub struct HasSet;

/// An UPDATE statement builder.
///
/// Assignments and the WHERE clause draw placeholder names from one
/// allocator, SET first.
pub struct Update<State> {
    table: String,
    assignments: Vec<(String, Expr)>,
    filter: Option<Expr>,
    _state: PhantomData<State>,
}

impl Update<NoSet> {
    /// Starts an UPDATE of `table`.
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            table: String::from(table),
            assignments: Vec::new(),
            filter: None,
            _state: PhantomData,
        }
    }
}

impl<State> Update<State> {
    /// Assigns a bound value: `column = :pN`.
    #[must_use]
    pub fn set<T: ToSqlValue>(self, column: &str, value: T) -> Update<HasSet> {
        self.set_expr(column, Expr::constant(value))
    }

    /// Assigns an expression, e.g. `column = column + 1`.
    #[must_use]
    pub fn set_expr(mut self, column: &str, expr: impl Into<Expr>) -> Update<HasSet> {
        self.assignments.push((String::from(column), expr.into()));
        Update {
            table: self.table,
            assignments: self.assignments,
            filter: self.filter,
            _state: PhantomData,
        }
    }
}

impl Update<HasSet> {
    /// Sets the WHERE clause.
    #[must_use]
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }

    /// Builds the statement.
    #[must_use]
    pub fn build(self, dialect: Dialect) -> CompiledQuery {
        let mut allocator = ParamAllocator::new();
        let mut w = Writer::new(&mut allocator, dialect);
        w.push("UPDATE ");
        w.identifier(&self.table);
        write_assignments(&mut w, &self.assignments);
        if let Some(ref filter) = self.filter {
            w.push(" WHERE ");
            w.expr(filter);
        }
        w.finish().into()
    }
}

/// Writes ` SET a = …, b = …`.
pub fn write_assignments(w: &mut Writer<'_>, assignments: &[(String, Expr)]) {
    w.push(" SET ");
    for (i, (column, expr)) in assignments.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.identifier(column);
        w.push(" = ");
        w.expr(expr);
    }
}
