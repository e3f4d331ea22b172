//! Dialect-specific SQL rendering.
//!
//! [`SchemaDialect`] holds the shared, mostly ANSI rendering in its default
//! methods; [`MySqlDialect`], [`PostgresDialect`] and [`SqliteDialect`]
//! override what their database does differently. Renderers are stateless:
//! every call receives the enum state, column list or previous rendering it
//! needs. An operation returning no statement means the dialect has nothing
//! to do for it.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{Result, SchemaError};
use crate::model::{ColumnType, EnumState, FunctionVersion, Property};

/// The closed set of supported dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL 8.
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite 3.35+.
    Sqlite,
}

impl Dialect {
    /// Every dialect.
    pub const ALL: [Self; 3] = [Self::MySql, Self::Postgres, Self::Sqlite];

    /// Returns the renderer for this dialect.
    #[must_use]
    pub const fn renderer(self) -> &'static dyn SchemaDialect {
        match self {
            Self::MySql => &MySqlDialect,
            Self::Postgres => &PostgresDialect,
            Self::Sqlite => &SqliteDialect,
        }
    }

    /// Returns the dialect name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.renderer().name()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect '{0}' (expected mysql, postgres or sqlite)")]
pub struct ParseDialectError(String);

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(ParseDialectError(s.to_string())),
        }
    }
}

/// Answers "which values does enum X have" for one version.
pub trait EnumLookup {
    /// Returns the state of the enum designated by `reference`.
    ///
    /// # Errors
    ///
    /// Fails if the enum is unknown or has no values yet.
    fn lookup(&self, reference: &str) -> Result<&EnumState>;
}

impl EnumLookup for EnumState {
    fn lookup(&self, reference: &str) -> Result<&EnumState> {
        if self.reference == reference || self.name == reference {
            Ok(self)
        } else {
            Err(SchemaError::UnknownEnum {
                reference: reference.to_string(),
            })
        }
    }
}

/// Lookup for contexts where enums cannot appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnums;

impl EnumLookup for NoEnums {
    fn lookup(&self, reference: &str) -> Result<&EnumState> {
        Err(SchemaError::UnknownEnum {
            reference: reference.to_string(),
        })
    }
}

/// A live property together with the column definition text it was last
/// rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedProperty {
    /// The property.
    pub property: Property,
    /// Column definition as emitted in DDL.
    pub definition: String,
}

/// A column typed as an enum, as seen at the start of a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumColumn {
    /// Current table name.
    pub table: String,
    /// The column.
    pub property: Property,
}

/// An index as it stands on a live table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLayout<'a> {
    /// Index or constraint name.
    pub name: &'a str,
    /// Indexed columns, in order.
    pub columns: &'a [String],
    /// Whether the index is unique.
    pub unique: bool,
}

impl IndexLayout<'_> {
    /// True when `column` is one of the indexed columns.
    #[must_use]
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// The live shape of a table handed to operations that may have to rebuild
/// it or clear what depends on a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout<'a> {
    /// Current table name.
    pub name: &'a str,
    /// Every column, in order.
    pub columns: &'a [RenderedProperty],
    /// The primary key, if any.
    pub primary_key: Option<IndexLayout<'a>>,
    /// Secondary indices.
    pub indices: Vec<IndexLayout<'a>>,
}

impl<'a> TableLayout<'a> {
    /// A table without keys or indices.
    #[must_use]
    pub const fn new(name: &'a str, columns: &'a [RenderedProperty]) -> Self {
        Self {
            name,
            columns,
            primary_key: None,
            indices: Vec::new(),
        }
    }
}

/// A plain decimal literal, optionally signed, with an optional exponent.
static NUMBER_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid number regex")
});

/// Quotes a string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn is_current_keyword(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_uppercase().as_str(),
        "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
    )
}

/// Parses a date/time literal and returns it in canonical ISO form.
fn canonical_temporal(column_type: &ColumnType, raw: &str) -> Option<String> {
    let raw = raw.trim();
    match column_type {
        ColumnType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|d| d.format("%Y-%m-%d").to_string()),
        ColumnType::Time => NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .ok()
            .map(|t| t.format("%H:%M:%S").to_string()),
        _ => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
    }
}

/// True when `columns` is exactly one serial property.
fn is_serial_key(columns: &[String], properties: &[RenderedProperty]) -> bool {
    match columns {
        [column] => properties
            .iter()
            .any(|p| &p.property.name == column && p.property.is_serial()),
        _ => false,
    }
}

/// Dialect-specific SQL generation for schema changes and queries.
pub trait SchemaDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    #[must_use]
    fn quote_char(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling embedded quote characters.
    #[must_use]
    fn quote_identifier(&self, name: &str) -> String {
        let q = self.quote_char();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Returns the positional placeholder for the 1-based `position`.
    #[must_use]
    fn placeholder(&self, _position: usize) -> String {
        String::from("?")
    }

    /// Returns whether `INSERT … ON CONFLICT … DO UPDATE` is available.
    #[must_use]
    fn supports_upsert(&self) -> bool {
        true
    }

    /// Returns the clause that hands back a generated key after INSERT, if
    /// the dialect has one.
    #[must_use]
    fn returning_clause(&self, column: &str) -> Option<String> {
        Some(format!("RETURNING {}", self.quote_identifier(column)))
    }

    /// Maps a column type to the dialect's SQL type.
    ///
    /// # Errors
    ///
    /// Fails with [`SchemaError::UnsupportedType`] for types the dialect
    /// cannot express, or when an enum cannot be resolved.
    fn map_type(
        &self,
        property: &str,
        column_type: &ColumnType,
        enums: &dyn EnumLookup,
    ) -> Result<String>;

    /// Attribute text appended to auto-increment columns.
    #[must_use]
    fn autoincrement_keyword(&self) -> &'static str {
        ""
    }

    /// Whether a serial column already carries the table's primary key.
    #[must_use]
    fn serial_carries_primary_key(&self) -> bool {
        false
    }

    /// Boolean literal used in defaults.
    #[must_use]
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Renders a validated, canonical date/time default.
    #[must_use]
    fn temporal_default(&self, _column_type: &ColumnType, canonical: &str) -> String {
        quote_literal(canonical)
    }

    /// Formats a default literal for a column type.
    ///
    /// # Errors
    ///
    /// Fails with [`SchemaError::InvalidDefault`] when the literal does not
    /// fit the type.
    fn format_default(&self, property: &str, column_type: &ColumnType, raw: &str) -> Result<String> {
        let invalid = |reason: &str| SchemaError::InvalidDefault {
            property: property.to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };
        match column_type {
            ColumnType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(self.boolean_literal(true).to_string()),
                "false" | "0" => Ok(self.boolean_literal(false).to_string()),
                _ => Err(invalid("expected a boolean")),
            },
            t if t.is_numeric() => {
                let literal = raw.trim();
                if NUMBER_LITERAL.is_match(literal) {
                    Ok(literal.to_string())
                } else {
                    Err(invalid("expected a number"))
                }
            }
            t if t.is_temporal() => {
                if is_current_keyword(raw) {
                    return Ok(raw.trim().to_ascii_uppercase());
                }
                let canonical = canonical_temporal(column_type, raw)
                    .ok_or_else(|| invalid("expected ISO date/time text"))?;
                Ok(self.temporal_default(column_type, &canonical))
            }
            ColumnType::Blob | ColumnType::Array(_) => {
                Err(invalid("defaults are not supported for this type"))
            }
            _ => Ok(quote_literal(raw)),
        }
    }

    /// Renders a full column definition.
    ///
    /// # Errors
    ///
    /// Propagates type mapping and default formatting errors.
    fn column_definition(&self, property: &Property, enums: &dyn EnumLookup) -> Result<String> {
        let spec = &property.spec;
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&property.name),
            self.map_type(&property.name, &spec.column_type, enums)?
        );
        if spec.column_type.is_serial() {
            sql.push_str(self.autoincrement_keyword());
        } else if !spec.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(ref raw) = spec.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.format_default(&property.name, &spec.column_type, raw)?);
        }
        Ok(sql)
    }

    /// Generates CREATE TABLE.
    #[must_use]
    fn create_table(&self, table: &str, columns: &[RenderedProperty]) -> Vec<String> {
        let column_defs: Vec<String> = columns
            .iter()
            .map(|c| format!("    {}", c.definition))
            .collect();
        vec![format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quote_identifier(table),
            column_defs.join(",\n")
        )]
    }

    /// Generates a table rename.
    #[must_use]
    fn rename_table(&self, from: &str, to: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_identifier(from),
            self.quote_identifier(to)
        )]
    }

    /// Generates ADD COLUMN.
    #[must_use]
    fn create_column(&self, table: &str, column: &RenderedProperty) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table),
            column.definition
        )]
    }

    /// Generates RENAME COLUMN.
    #[must_use]
    fn rename_column(&self, table: &str, from: &str, to: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_identifier(table),
            self.quote_identifier(from),
            self.quote_identifier(to)
        )]
    }

    /// Generates the statements changing a column's type, nullability or
    /// default. `table.columns` already holds `after`.
    ///
    /// # Errors
    ///
    /// Fails when the new type cannot be rendered.
    fn retype_column(
        &self,
        table: &TableLayout<'_>,
        before: &RenderedProperty,
        after: &RenderedProperty,
        enums: &dyn EnumLookup,
    ) -> Result<Vec<String>>;

    /// Generates DROP COLUMN. `table` still holds the column.
    #[must_use]
    fn remove_column(&self, table: &TableLayout<'_>, column: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table.name),
            self.quote_identifier(column)
        )]
    }

    /// Generates the creation of a named enum type.
    #[must_use]
    fn create_enum(&self, _state: &EnumState) -> Vec<String> {
        Vec::new()
    }

    /// Generates the addition of `added` values to an enum whose full state
    /// (including `added`) is `state`. `users` are the columns typed as this
    /// enum before the version's table changes run.
    ///
    /// # Errors
    ///
    /// Fails when a user column cannot be re-rendered.
    fn add_enum_values(
        &self,
        _state: &EnumState,
        _added: &[String],
        _users: &[EnumColumn],
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Generates ADD PRIMARY KEY.
    #[must_use]
    fn create_primary_key(
        &self,
        table: &str,
        name: &str,
        columns: &[String],
        properties: &[RenderedProperty],
    ) -> Vec<String> {
        if self.serial_carries_primary_key() && is_serial_key(columns, properties) {
            return Vec::new();
        }
        let cols: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.quote_identifier(table),
            self.quote_identifier(name),
            cols.join(", ")
        )]
    }

    /// Generates DROP PRIMARY KEY.
    #[must_use]
    fn remove_primary_key(
        &self,
        table: &str,
        name: &str,
        columns: &[String],
        properties: &[RenderedProperty],
    ) -> Vec<String> {
        if self.serial_carries_primary_key() && is_serial_key(columns, properties) {
            return Vec::new();
        }
        vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table),
            self.quote_identifier(name)
        )]
    }

    /// Generates ADD FOREIGN KEY.
    #[must_use]
    fn create_foreign_key(
        &self,
        table: &str,
        name: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
    ) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(table),
            self.quote_identifier(name),
            self.quote_identifier(column),
            self.quote_identifier(referenced_table),
            self.quote_identifier(referenced_column)
        )]
    }

    /// Generates DROP FOREIGN KEY.
    #[must_use]
    fn remove_foreign_key(&self, table: &str, name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table),
            self.quote_identifier(name)
        )]
    }

    /// Generates CREATE INDEX.
    #[must_use]
    fn create_index(&self, table: &str, name: &str, columns: &[String]) -> Vec<String> {
        vec![index_sql(self, table, name, columns, false)]
    }

    /// Generates CREATE UNIQUE INDEX.
    #[must_use]
    fn create_unique_index(&self, table: &str, name: &str, columns: &[String]) -> Vec<String> {
        vec![index_sql(self, table, name, columns, true)]
    }

    /// Generates DROP INDEX.
    #[must_use]
    fn remove_index(&self, _table: &str, name: &str) -> Vec<String> {
        vec![format!("DROP INDEX {}", self.quote_identifier(name))]
    }

    /// Generates the (re)creation of a function at one version.
    ///
    /// # Errors
    ///
    /// Fails when a parameter or return type cannot be rendered.
    fn create_function(&self, _function: &str, _version: &FunctionVersion) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

fn index_sql<D: SchemaDialect + ?Sized>(
    dialect: &D,
    table: &str,
    name: &str,
    columns: &[String],
    unique: bool,
) -> String {
    let mut sql = String::from("CREATE ");
    if unique {
        sql.push_str("UNIQUE ");
    }
    sql.push_str("INDEX ");
    sql.push_str(&dialect.quote_identifier(name));
    sql.push_str(" ON ");
    sql.push_str(&dialect.quote_identifier(table));
    sql.push_str(" (");
    let cols: Vec<String> = columns.iter().map(|c| dialect.quote_identifier(c)).collect();
    sql.push_str(&cols.join(", "));
    sql.push(')');
    sql
}
