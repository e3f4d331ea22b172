//! DELETE builder.

use super::compile::{CompiledQuery, ParamAllocator, Writer};
use super::expr::Expr;
use crate::dialect::Dialect;

/// A DELETE statement builder.
#[derive(Debug, Clone)]
pub struct Delete {
    table: String,
    filter: Option<Expr>,
}

impl Delete {
    /// Starts a DELETE from `table`.
    #[must_use]
    pub fn from_table(table: &str) -> Self {
        Self {
            table: String::from(table),
            filter: None,
        }
    }

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
        w.push("DELETE FROM ");
        w.identifier(&self.table);
        if let Some(ref filter) = self.filter {
            w.push(" WHERE ");
            w.expr(filter);
        }
        w.finish().into()
    }
}
