//! UPSERT (INSERT ... ON CONFLICT ... DO UPDATE) builder.

use std::marker::PhantomData;

use super::compile::{CompiledQuery, ParamAllocator, Writer};
use super::insert::write_insert;
use super::value::{SqlValue, ToSqlValue};
use super::{HasValues, NoValues};
use crate::dialect::Dialect;
use crate::error::QueryError;

/// An UPSERT builder.
///
/// Key columns form the conflict target unless `on_conflict` names one
/// explicitly; every other column is overwritten on conflict.
pub struct Upsert<State> {
    table: String,
    keys: Vec<(String, SqlValue)>,
    values: Vec<(String, SqlValue)>,
    conflict: Vec<String>,
    _state: PhantomData<State>,
}

impl Upsert<NoValues> {
    /// Starts an UPSERT into `table`.
    #[must_use]
    pub fn into_table(table: &str) -> Self {
        Self {
            table: String::from(table),
            keys: Vec::new(),
            values: Vec::new(),
            conflict: Vec::new(),
            _state: PhantomData,
        }
    }
}

impl<State> Upsert<State> {
    fn transition<S>(self) -> Upsert<S> {
        Upsert {
            table: self.table,
            keys: self.keys,
            values: self.values,
            conflict: self.conflict,
            _state: PhantomData,
        }
    }

    /// Sets a key column value. Key columns are inserted but never updated.
    #[must_use]
    pub fn key<T: ToSqlValue>(mut self, column: &str, value: T) -> Upsert<HasValues> {
        self.keys.push((String::from(column), value.to_sql_value()));
        self.transition()
    }

    /// Sets a non-key column value.
    #[must_use]
    pub fn value<T: ToSqlValue>(mut self, column: &str, value: T) -> Upsert<HasValues> {
        self.values.push((String::from(column), value.to_sql_value()));
        self.transition()
    }

    /// Names the conflict target explicitly.
    #[must_use]
    pub fn on_conflict(mut self, columns: &[&str]) -> Self {
        self.conflict = columns.iter().map(|c| String::from(*c)).collect();
        self
    }
}

impl Upsert<HasValues> {
    /// Builds the statement.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UpsertUnsupported`] for dialects without an
    /// `ON CONFLICT` form and [`QueryError::MissingConflictKey`] when no
    /// conflict target can be determined.
    pub fn build(self, dialect: Dialect) -> Result<CompiledQuery, QueryError> {
        let renderer = dialect.renderer();
        if !renderer.supports_upsert() {
            return Err(QueryError::UpsertUnsupported(renderer.name()));
        }

        let conflict: Vec<&str> = if self.conflict.is_empty() {
            self.keys.iter().map(|(c, _)| c.as_str()).collect()
        } else {
            self.conflict.iter().map(String::as_str).collect()
        };
        if conflict.is_empty() {
            return Err(QueryError::MissingConflictKey(self.table));
        }

        let (columns, values): (Vec<String>, Vec<SqlValue>) =
            self.keys.iter().chain(&self.values).cloned().unzip();

        let mut allocator = ParamAllocator::new();
        let mut w = Writer::new(&mut allocator, dialect);
        write_insert(&mut w, &self.table, &columns, &values);

        w.push(" ON CONFLICT (");
        for (i, column) in conflict.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.identifier(column);
        }
        w.push(")");

        let updates: Vec<&(String, SqlValue)> = self
            .values
            .iter()
            .filter(|(c, _)| !conflict.contains(&c.as_str()))
            .collect();
        if updates.is_empty() {
            w.push(" DO NOTHING");
        } else {
            w.push(" DO UPDATE SET ");
            for (i, (column, value)) in updates.into_iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.identifier(column);
                w.push(" = ");
                w.bind(value);
            }
        }
        Ok(w.finish().into())
    }
}
