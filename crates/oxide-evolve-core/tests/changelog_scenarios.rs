//! End-to-end changelog scenarios across dialects.

mod common;

use common::{build, build_err, descriptions, queries, status_enum, users};
use oxide_evolve_core::model::{
    ColumnSpec, ColumnType, Definitions, IndexKind, TableDefinition, VersionChange,
};
use oxide_evolve_core::{Dialect, SchemaError};

fn orders() -> TableDefinition {
    TableDefinition::new("app.Order").change(
        VersionChange::new("1.0.1")
            .named("orders")
            .add("id", ColumnSpec::new(ColumnType::BigSerial))
            .add("user_id", ColumnSpec::new(ColumnType::Integer))
            .add("total", ColumnSpec::new(ColumnType::Decimal(10, 2)).default_value("0"))
            .foreign_key("fk_orders_user", "user_id", "app.User", "id")
            .index("idx_orders_user", &["user_id"]),
    )
}

fn accounts() -> TableDefinition {
    TableDefinition::new("app.Account").change(
        VersionChange::new("1.0.0")
            .named("accounts")
            .add("id", ColumnSpec::new(ColumnType::Serial))
            .add("status", ColumnSpec::new(ColumnType::Enum("app.Status".into()))),
    )
}

// =============================================================================
// Property evolution
// =============================================================================

#[test]
fn test_retype_and_add_emit_exactly_two_statements() {
    let changelog = build(&Definitions::new().table(users()), Dialect::MySql);

    assert_eq!(
        queries(&changelog, "1.0.0"),
        vec!["CREATE TABLE `users` (\n    `id` INT NOT NULL AUTO_INCREMENT PRIMARY KEY,\n    `name` VARCHAR(12) NOT NULL\n)"]
    );
    assert_eq!(
        queries(&changelog, "1.0.1"),
        vec![
            "ALTER TABLE `users` MODIFY COLUMN `name` VARCHAR(24) NOT NULL",
            "ALTER TABLE `users` ADD COLUMN `display_name` TEXT",
        ]
    );

    let properties = changelog.properties("app.User").unwrap();
    let names: Vec<&str> = properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "display_name"]);
    assert_eq!(properties[1].spec.column_type, ColumnType::Varchar(24));
    assert_eq!(changelog.table_name("app.User"), Some("users"));
}

#[test]
fn test_postgres_primary_key_is_explicit() {
    let changelog = build(&Definitions::new().table(users()), Dialect::Postgres);
    let first = queries(&changelog, "1.0.0");
    assert_eq!(first.len(), 2);
    assert_eq!(
        first[1],
        "ALTER TABLE \"users\" ADD CONSTRAINT \"pk_users\" PRIMARY KEY (\"id\")"
    );
}

#[test]
fn test_sqlite_retype_with_same_affinity_is_skipped() {
    let changelog = build(&Definitions::new().table(users()), Dialect::Sqlite);
    assert_eq!(
        queries(&changelog, "1.0.1"),
        vec!["ALTER TABLE \"users\" ADD COLUMN \"display_name\" TEXT"]
    );
    assert_eq!(
        descriptions(&changelog, "1.0.1"),
        vec!["add-column-users-display_name"]
    );
}

#[test]
fn test_sqlite_retype_rebuilds_table_with_its_indices() {
    let table = users()
        .change(VersionChange::new("1.0.2").unique_index("idx_users_name", &["name"]))
        .change(
            VersionChange::new("1.0.3")
                .retype("name", ColumnSpec::new(ColumnType::Varchar(24)).nullable()),
        );
    let changelog = build(&Definitions::new().table(table), Dialect::Sqlite);

    assert_eq!(
        queries(&changelog, "1.0.3"),
        vec![
            "CREATE TABLE \"users_rebuild\" (\n    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
             \"name\" TEXT,\n    \"display_name\" TEXT\n)",
            "INSERT INTO \"users_rebuild\" (\"id\", \"name\", \"display_name\") \
             SELECT \"id\", \"name\", \"display_name\" FROM \"users\"",
            "DROP TABLE \"users\"",
            "ALTER TABLE \"users_rebuild\" RENAME TO \"users\"",
            "CREATE UNIQUE INDEX \"idx_users_name\" ON \"users\" (\"name\")",
        ]
    );
    assert!(descriptions(&changelog, "1.0.3")
        .iter()
        .all(|d| d == "retype-column-users-name"));
}

#[test]
fn test_sqlite_remove_column_drops_its_index_first() {
    let table = users()
        .change(VersionChange::new("1.0.2").index("idx_users_name", &["name"]))
        .change(
            VersionChange::new("1.0.3")
                .remove("name")
                .drop_index(IndexKind::Index, "idx_users_name"),
        );
    let changelog = build(&Definitions::new().table(table), Dialect::Sqlite);

    assert_eq!(
        queries(&changelog, "1.0.3"),
        vec![
            "DROP INDEX IF EXISTS \"idx_users_name\"",
            "ALTER TABLE \"users\" DROP COLUMN \"name\"",
            "DROP INDEX IF EXISTS \"idx_users_name\"",
        ]
    );
}

#[test]
fn test_build_is_deterministic() {
    let definitions = Definitions::new()
        .table(users())
        .table(orders())
        .table(accounts())
        .enumeration(status_enum());
    for dialect in Dialect::ALL {
        let first = build(&definitions, dialect);
        let second = build(&definitions, dialect);
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}

#[test]
fn test_parallel_builds_match_sequential() {
    let definitions = Definitions::new()
        .table(users())
        .table(orders())
        .table(accounts())
        .enumeration(status_enum());
    let expected: Vec<_> = Dialect::ALL
        .into_iter()
        .map(|dialect| build(&definitions, dialect))
        .collect();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = Dialect::ALL
            .into_iter()
            .map(|dialect| {
                let definitions = &definitions;
                scope.spawn(move || build(definitions, dialect))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results, expected);
}

// =============================================================================
// Constraints
// =============================================================================

#[test]
fn test_foreign_key_and_index_on_table_created_in_same_version() {
    let definitions = Definitions::new().table(users()).table(orders());
    let changelog = build(&definitions, Dialect::Postgres);

    assert_eq!(
        descriptions(&changelog, "1.0.1"),
        vec![
            "retype-column-users-name",
            "retype-column-users-name",
            "add-column-users-display_name",
            "create-table-orders",
            "add-foreign-key-fk_orders_user",
            "add-index-idx_orders_user",
        ]
    );
    let second = queries(&changelog, "1.0.1");
    assert_eq!(
        second[4],
        "ALTER TABLE \"orders\" ADD CONSTRAINT \"fk_orders_user\" FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\")"
    );
    assert_eq!(
        second[5],
        "CREATE INDEX \"idx_orders_user\" ON \"orders\" (\"user_id\")"
    );
}

#[test]
fn test_foreign_key_to_later_table_is_rejected() {
    let products = TableDefinition::new("app.Product").change(
        VersionChange::new("1.0.1")
            .named("products")
            .add("id", ColumnSpec::new(ColumnType::Serial)),
    );
    let lines = TableDefinition::new("app.Line").change(
        VersionChange::new("1.0.0")
            .named("lines")
            .add("product_id", ColumnSpec::new(ColumnType::Integer))
            .foreign_key("fk_lines_product", "product_id", "app.Product", "id"),
    );
    let err = build_err(&Definitions::new().table(products).table(lines), Dialect::Postgres);
    assert!(matches!(err, SchemaError::UnknownReference { ref name, .. } if name == "fk_lines_product"));
}

#[test]
fn test_primary_key_rules() {
    let nullable = TableDefinition::new("t").change(
        VersionChange::new("1.0.0")
            .named("t")
            .add("code", ColumnSpec::new(ColumnType::Varchar(8)).nullable())
            .primary_key("pk_t", &["code"]),
    );
    let err = build_err(&Definitions::new().table(nullable), Dialect::Postgres);
    assert!(matches!(err, SchemaError::NullablePrimaryKey { ref column, .. } if column == "code"));

    let twice = TableDefinition::new("t")
        .change(
            VersionChange::new("1.0.0")
                .named("t")
                .add("code", ColumnSpec::new(ColumnType::Varchar(8)))
                .primary_key("pk_t", &["code"]),
        )
        .change(VersionChange::new("1.0.1").primary_key("pk_t2", &["code"]));
    let err = build_err(&Definitions::new().table(twice), Dialect::Postgres);
    assert_eq!(err.to_string(), "table 't' already has primary key");

    let composite = TableDefinition::new("t").change(
        VersionChange::new("1.0.0")
            .named("t")
            .add("a", ColumnSpec::new(ColumnType::Integer))
            .add("b", ColumnSpec::new(ColumnType::Integer))
            .primary_key("pk_t", &["a", "b"]),
    );
    let changelog = build(&Definitions::new().table(composite), Dialect::Sqlite);
    assert_eq!(
        queries(&changelog, "1.0.0")[1],
        "CREATE UNIQUE INDEX \"pk_t\" ON \"t\" (\"a\", \"b\")"
    );
}

// =============================================================================
// Indices
// =============================================================================

#[test]
fn test_index_names_are_global() {
    let a = TableDefinition::new("a").change(
        VersionChange::new("1.0.0")
            .named("a")
            .add("x", ColumnSpec::new(ColumnType::Integer))
            .index("idx_x", &["x"]),
    );
    let b = TableDefinition::new("b").change(
        VersionChange::new("1.0.0")
            .named("b")
            .add("x", ColumnSpec::new(ColumnType::Integer))
            .index("idx_x", &["x"]),
    );
    let err = build_err(&Definitions::new().table(a).table(b), Dialect::MySql);
    assert_eq!(
        err,
        SchemaError::DuplicateName {
            name: "idx_x".into()
        }
    );
}

#[test]
fn test_index_column_set_must_be_new() {
    let table = TableDefinition::new("a").change(
        VersionChange::new("1.0.0")
            .named("a")
            .add("x", ColumnSpec::new(ColumnType::Integer))
            .index("idx_x", &["x"])
            .unique_index("uq_x", &["x"]),
    );
    let err = build_err(&Definitions::new().table(table), Dialect::MySql);
    assert!(matches!(err, SchemaError::DuplicateIndexColumns { ref existing, .. } if existing == "idx_x"));
}

#[test]
fn test_removing_unknown_index_fails() {
    let table = TableDefinition::new("a")
        .change(
            VersionChange::new("1.0.0")
                .named("a")
                .add("x", ColumnSpec::new(ColumnType::Integer)),
        )
        .change(VersionChange::new("1.0.1").drop_index(IndexKind::Index, "idx_x"));
    let err = build_err(&Definitions::new().table(table), Dialect::Sqlite);
    assert!(matches!(err, SchemaError::UnknownIndex { ref name, .. } if name == "idx_x"));
}

#[test]
fn test_mysql_drop_index_names_table() {
    let table = TableDefinition::new("a")
        .change(
            VersionChange::new("1.0.0")
                .named("a")
                .add("x", ColumnSpec::new(ColumnType::Integer))
                .index("idx_x", &["x"]),
        )
        .change(VersionChange::new("1.0.1").drop_index(IndexKind::Index, "idx_x"));
    let changelog = build(&Definitions::new().table(table), Dialect::MySql);
    assert_eq!(
        queries(&changelog, "1.0.1"),
        vec!["DROP INDEX `idx_x` ON `a`"]
    );
}

// =============================================================================
// Enums
// =============================================================================

#[test]
fn test_postgres_enum_values_only_grow() {
    let definitions = Definitions::new()
        .table(accounts())
        .enumeration(status_enum());
    let changelog = build(&definitions, Dialect::Postgres);

    assert_eq!(changelog.versions, vec!["1.0.0", "1.0.2"]);
    let first = queries(&changelog, "1.0.0");
    assert_eq!(
        first[0],
        "CREATE TYPE \"status\" AS ENUM ('active', 'inactive')"
    );
    assert!(first[1].contains("\"status\" \"status\" NOT NULL"));
    assert_eq!(
        queries(&changelog, "1.0.2"),
        vec!["ALTER TYPE \"status\" ADD VALUE 'banned'"]
    );
}

#[test]
fn test_mysql_enum_growth_redefines_columns() {
    let definitions = Definitions::new()
        .table(accounts())
        .enumeration(status_enum());
    let changelog = build(&definitions, Dialect::MySql);

    assert!(queries(&changelog, "1.0.0")[0]
        .contains("`status` ENUM('active', 'inactive') NOT NULL"));
    assert_eq!(
        queries(&changelog, "1.0.2"),
        vec!["ALTER TABLE `accounts` MODIFY COLUMN `status` ENUM('active', 'inactive', 'banned') NOT NULL"]
    );
    assert_eq!(
        descriptions(&changelog, "1.0.2"),
        vec!["add-enum-values-status"]
    );
}

#[test]
fn test_sqlite_enums_are_text() {
    let definitions = Definitions::new()
        .table(accounts())
        .enumeration(status_enum());
    let changelog = build(&definitions, Dialect::Sqlite);
    assert!(queries(&changelog, "1.0.0")[0].contains("\"status\" TEXT NOT NULL"));
    assert!(queries(&changelog, "1.0.2").is_empty());
}

// =============================================================================
// JSON definitions
// =============================================================================

#[test]
fn test_definitions_from_json() {
    let json = r#"{
        "tables": [
            {
                "id": "app.Tag",
                "changes": [
                    {
                        "version": "1.0.0",
                        "name": "tags",
                        "properties": [
                            { "op": "add", "name": "id", "column": { "type": "serial" } },
                            { "op": "add", "name": "label", "column": { "type": { "varchar": 32 } } }
                        ],
                        "indices": [
                            { "op": "add", "kind": "unique_index", "name": "uq_tags_label", "columns": ["label"] }
                        ]
                    }
                ]
            }
        ]
    }"#;
    let definitions = Definitions::from_json(json).unwrap();
    let changelog = build(&definitions, Dialect::Postgres);
    assert_eq!(
        queries(&changelog, "1.0.0"),
        vec![
            "CREATE TABLE \"tags\" (\n    \"id\" SERIAL,\n    \"label\" VARCHAR(32) NOT NULL\n)",
            "CREATE UNIQUE INDEX \"uq_tags_label\" ON \"tags\" (\"label\")",
        ]
    );
}
