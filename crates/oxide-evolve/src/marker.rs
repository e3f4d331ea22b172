//! Version marker storage.
//!
//! The marker is one row of a key/value metadata table recording the last
//! applied version. Every statement is built with the crate's own query
//! builders and bound positionally.

use oxide_evolve_core::query::{column, CompiledQuery, Insert, Select, SqlValue, Update};
use oxide_evolve_core::Dialect;
use sqlx::sqlite::{SqliteArguments, SqliteConnection};
use sqlx::{Row, Sqlite};
use tracing::debug;

use crate::error::{MigrateError, Result};

/// Default name of the metadata table.
pub const DEFAULT_METADATA_TABLE: &str = "oxide_evolve_metadata";

/// Key of the version marker row.
pub const VERSION_KEY: &str = "version";

/// Reads and writes the version marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataStore {
    table: String,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self {
            table: DEFAULT_METADATA_TABLE.to_string(),
        }
    }
}

impl MetadataStore {
    /// Creates a store over `table`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::InvalidMetadataTable`] unless the name is a
    /// plain identifier (ASCII letters, digits, underscores, not starting
    /// with a digit).
    pub fn new(table: &str) -> Result<Self> {
        let mut chars = table.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(MigrateError::InvalidMetadataTable(table.to_string()));
        }
        Ok(Self {
            table: table.to_string(),
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the metadata table if it does not exist.
    pub async fn ensure_table(&self, conn: &mut SqliteConnection) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (key TEXT NOT NULL PRIMARY KEY, value TEXT)",
            Dialect::Sqlite.renderer().quote_identifier(&self.table)
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }

    /// Returns the last applied version, if any.
    pub async fn version(&self, conn: &mut SqliteConnection) -> Result<Option<String>> {
        let query = Select::new()
            .columns([column("value")])
            .from(&self.table)
            .where_clause(column("key").eq(VERSION_KEY))
            .build(Dialect::Sqlite);
        let (sql, values) = positional(&query);
        let row = bind_all(sqlx::query(&sql), values)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(row.try_get::<Option<String>, _>(0)?),
            None => Ok(None),
        }
    }

    /// Records `version` as the last applied version.
    pub async fn set_version(&self, conn: &mut SqliteConnection, version: &str) -> Result<()> {
        let update = Update::table(&self.table)
            .set("value", version)
            .where_clause(column("key").eq(VERSION_KEY))
            .build(Dialect::Sqlite);
        let (sql, values) = positional(&update);
        let result = bind_all(sqlx::query(&sql), values)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            let insert = Insert::into_table(&self.table)
                .value("key", VERSION_KEY)
                .value("value", version)
                .build(Dialect::Sqlite);
            let (sql, values) = positional(&insert);
            bind_all(sqlx::query(&sql), values)
                .execute(&mut *conn)
                .await?;
        }
        debug!(table = %self.table, version = %version, "version marker stored");
        Ok(())
    }
}

fn positional(query: &CompiledQuery) -> (String, Vec<SqlValue>) {
    query.to_positional(Dialect::Sqlite)
}

/// Binds every value, in order, to a raw query.
fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    values: Vec<SqlValue>,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::Float(f) => query.bind(f),
            SqlValue::Text(s) => query.bind(s),
            SqlValue::Blob(b) => query.bind(b),
        };
    }
    query
}
