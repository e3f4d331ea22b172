#![allow(dead_code)]

use oxide_evolve_core::model::{ColumnSpec, ColumnType, Definitions, TableDefinition, VersionChange};
use oxide_evolve_core::{Changelog, ChangelogBuilder, Dialect};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub async fn create_test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// `users` created at 1.0.0 and extended at 1.0.1.
pub fn definitions() -> Definitions {
    Definitions::new().table(
        TableDefinition::new("app.User")
            .change(
                VersionChange::new("1.0.0")
                    .named("users")
                    .add("id", ColumnSpec::new(ColumnType::Serial))
                    .add("name", ColumnSpec::new(ColumnType::Varchar(12)))
                    .index("idx_users_name", &["name"]),
            )
            .change(
                VersionChange::new("1.0.1")
                    .add("display_name", ColumnSpec::new(ColumnType::Text).nullable()),
            ),
    )
}

pub fn changelog(definitions: &Definitions) -> Changelog {
    ChangelogBuilder::new(definitions, Dialect::Sqlite)
        .build()
        .expect("changelog build failed")
}

pub async fn table_exists(pool: &SqlitePool, table: &str) -> bool {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(pool)
            .await
            .unwrap();
    row.is_some()
}

pub async fn columns(pool: &SqlitePool, table: &str) -> Vec<String> {
    let rows: Vec<(String,)> = sqlx::query_as(&format!("SELECT name FROM pragma_table_info('{table}')"))
        .fetch_all(pool)
        .await
        .unwrap();
    rows.into_iter().map(|(name,)| name).collect()
}

pub async fn integrity(pool: &SqlitePool) -> String {
    let (status,): (String,) = sqlx::query_as("PRAGMA integrity_check")
        .fetch_one(pool)
        .await
        .unwrap();
    status
}
