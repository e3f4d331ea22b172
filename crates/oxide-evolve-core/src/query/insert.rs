//! INSERT builder.

use std::marker::PhantomData;

use super::compile::{CompiledQuery, ParamAllocator, Writer};
use super::value::{SqlValue, ToSqlValue};
use super::{HasValues, NoValues};
use crate::dialect::Dialect;

/// An INSERT statement builder binding every value to a named placeholder.
pub struct Insert<State> {
    table: String,
    columns: Vec<String>,
    values: Vec<SqlValue>,
    returning: Option<String>,
    _state: PhantomData<State>,
}

impl Insert<NoValues> {
    /// Starts an INSERT into `table`.
    #[must_use]
    pub fn into_table(table: &str) -> Self {
        Self {
            table: String::from(table),
            columns: Vec::new(),
            values: Vec::new(),
            returning: None,
            _state: PhantomData,
        }
    }
}

impl<State> Insert<State> {
    /// Sets a column value.
    #[must_use]
    pub fn value<T: ToSqlValue>(mut self, column: &str, value: T) -> Insert<HasValues> {
        self.columns.push(String::from(column));
        self.values.push(value.to_sql_value());
        Insert {
            table: self.table,
            columns: self.columns,
            values: self.values,
            returning: self.returning,
            _state: PhantomData,
        }
    }

    /// Asks for the generated key in dialects that can return it.
    #[must_use]
    pub fn returning_key(mut self, column: &str) -> Self {
        self.returning = Some(String::from(column));
        self
    }
}

impl Insert<HasValues> {
    /// Builds the statement.
    #[must_use]
    pub fn build(self, dialect: Dialect) -> CompiledQuery {
        let mut allocator = ParamAllocator::new();
        let mut w = Writer::new(&mut allocator, dialect);
        write_insert(&mut w, &self.table, &self.columns, &self.values);
        if let Some(ref key) = self.returning {
            if let Some(clause) = dialect.renderer().returning_clause(key) {
                w.push(" ");
                w.push(&clause);
            }
        }
        w.finish().into()
    }
}

/// Writes `INSERT INTO t (a, b) VALUES (:p1, :p2)`.
pub fn write_insert(w: &mut Writer<'_>, table: &str, columns: &[String], values: &[SqlValue]) {
    w.push("INSERT INTO ");
    w.identifier(table);
    w.push(" (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.identifier(column);
    }
    w.push(") VALUES (");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.bind(value);
    }
    w.push(")");
}
