#![allow(dead_code)]

use oxide_evolve_core::model::{
    ColumnSpec, ColumnType, Definitions, EnumDefinition, TableDefinition, VersionChange,
};
use oxide_evolve_core::{Changelog, ChangelogBuilder, Dialect, SchemaError};

/// `users` with a serial key and a short name; display name and wider name
/// arrive in 1.0.1.
pub fn users() -> TableDefinition {
    TableDefinition::new("app.User")
        .change(
            VersionChange::new("1.0.0")
                .named("users")
                .add("id", ColumnSpec::new(ColumnType::Serial))
                .add("name", ColumnSpec::new(ColumnType::Varchar(12)))
                .primary_key("pk_users", &["id"]),
        )
        .change(
            VersionChange::new("1.0.1")
                .retype("name", ColumnSpec::new(ColumnType::Varchar(24)))
                .add("display_name", ColumnSpec::new(ColumnType::Text).nullable()),
        )
}

pub fn status_enum() -> EnumDefinition {
    EnumDefinition::new("status", "app.Status")
        .add_values("1.0.0", &["active", "inactive"])
        .add_values("1.0.2", &["banned"])
}

pub fn build(definitions: &Definitions, dialect: Dialect) -> Changelog {
    ChangelogBuilder::new(definitions, dialect)
        .build()
        .unwrap_or_else(|e| panic!("changelog build failed: {e}"))
}

pub fn build_err(definitions: &Definitions, dialect: Dialect) -> SchemaError {
    ChangelogBuilder::new(definitions, dialect)
        .build()
        .expect_err("expected changelog build to fail")
}

pub fn queries(changelog: &Changelog, version: &str) -> Vec<String> {
    changelog
        .all_changes()
        .into_iter()
        .filter(|c| c.version == version)
        .flat_map(|c| c.statements.into_iter().map(|s| s.query))
        .collect()
}

pub fn descriptions(changelog: &Changelog, version: &str) -> Vec<String> {
    changelog
        .all_changes()
        .into_iter()
        .filter(|c| c.version == version)
        .flat_map(|c| c.statements.into_iter().map(|s| s.description))
        .collect()
}
