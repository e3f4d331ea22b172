//! SQLite dialect.
//!
//! SQLite lacks ALTER COLUMN, named constraints on existing tables and
//! user-defined enum types. Primary keys are emulated with unique indexes,
//! foreign keys and enums render nothing, and retyping rebuilds the table:
//! create the new shape, copy the rows, drop the old table, rename, then
//! recreate its indices.

use super::{EnumLookup, IndexLayout, RenderedProperty, SchemaDialect, TableLayout};
use crate::error::{Result, SchemaError};
use crate::model::ColumnType;

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn map_type(
        &self,
        property: &str,
        column_type: &ColumnType,
        _enums: &dyn EnumLookup,
    ) -> Result<String> {
        // Type affinity only; enums are plain text here.
        Ok(match column_type {
            ColumnType::Serial
            | ColumnType::BigSerial
            | ColumnType::SmallInt
            | ColumnType::Integer
            | ColumnType::BigInt
            | ColumnType::Boolean => "INTEGER",
            ColumnType::Real | ColumnType::Double => "REAL",
            ColumnType::Decimal(_, _) => "NUMERIC",
            ColumnType::Char(_)
            | ColumnType::Varchar(_)
            | ColumnType::Text
            | ColumnType::Uuid
            | ColumnType::Date
            | ColumnType::Time
            | ColumnType::DateTime
            | ColumnType::Timestamp
            | ColumnType::Json
            | ColumnType::Enum(_) => "TEXT",
            ColumnType::Blob => "BLOB",
            ColumnType::Array(_) => {
                return Err(SchemaError::UnsupportedType {
                    property: property.to_string(),
                    dialect: self.name(),
                })
            }
        }
        .to_string())
    }

    fn autoincrement_keyword(&self) -> &'static str {
        " PRIMARY KEY AUTOINCREMENT"
    }

    fn serial_carries_primary_key(&self) -> bool {
        true
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn retype_column(
        &self,
        table: &TableLayout<'_>,
        before: &RenderedProperty,
        after: &RenderedProperty,
        _enums: &dyn EnumLookup,
    ) -> Result<Vec<String>> {
        if before.definition == after.definition {
            return Ok(Vec::new());
        }

        // No ALTER COLUMN: build the new shape aside, copy the rows, swap.
        let staging = format!("{}_rebuild", table.name);
        let columns = table
            .columns
            .iter()
            .map(|c| self.quote_identifier(&c.property.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = self.create_table(&staging, table.columns);
        sql.push(format!(
            "INSERT INTO {} ({columns}) SELECT {columns} FROM {}",
            self.quote_identifier(&staging),
            self.quote_identifier(table.name)
        ));
        sql.push(format!("DROP TABLE {}", self.quote_identifier(table.name)));
        sql.extend(self.rename_table(&staging, table.name));

        // Dropping the old table took its indices with it.
        let live = |index: &IndexLayout<'_>| {
            index
                .columns
                .iter()
                .all(|c| table.columns.iter().any(|p| p.property.name == *c))
        };
        if let Some(pk) = table.primary_key.filter(live) {
            sql.extend(self.create_primary_key(table.name, pk.name, pk.columns, table.columns));
        }
        for index in table.indices.iter().filter(|i| live(i)) {
            sql.extend(if index.unique {
                self.create_unique_index(table.name, index.name, index.columns)
            } else {
                self.create_index(table.name, index.name, index.columns)
            });
        }
        Ok(sql)
    }

    fn remove_column(&self, table: &TableLayout<'_>, column: &str) -> Vec<String> {
        // DROP COLUMN is refused while an index still covers the column.
        let mut sql: Vec<String> = table
            .primary_key
            .iter()
            .filter(|pk| pk.covers(column))
            .flat_map(|pk| self.remove_primary_key(table.name, pk.name, pk.columns, table.columns))
            .chain(
                table
                    .indices
                    .iter()
                    .filter(|i| i.covers(column))
                    .flat_map(|i| self.remove_index(table.name, i.name)),
            )
            .collect();
        sql.push(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table.name),
            self.quote_identifier(column)
        ));
        sql
    }

    fn remove_index(&self, _table: &str, name: &str) -> Vec<String> {
        vec![format!("DROP INDEX IF EXISTS {}", self.quote_identifier(name))]
    }

    fn create_primary_key(
        &self,
        table: &str,
        name: &str,
        columns: &[String],
        properties: &[RenderedProperty],
    ) -> Vec<String> {
        if super::is_serial_key(columns, properties) {
            return Vec::new();
        }
        self.create_unique_index(table, name, columns)
    }

    fn remove_primary_key(
        &self,
        _table: &str,
        name: &str,
        columns: &[String],
        properties: &[RenderedProperty],
    ) -> Vec<String> {
        if super::is_serial_key(columns, properties) {
            return Vec::new();
        }
        vec![format!("DROP INDEX IF EXISTS {}", self.quote_identifier(name))]
    }

    fn create_foreign_key(
        &self,
        _table: &str,
        _name: &str,
        _column: &str,
        _referenced_table: &str,
        _referenced_column: &str,
    ) -> Vec<String> {
        Vec::new()
    }

    fn remove_foreign_key(&self, _table: &str, _name: &str) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::NoEnums;
    use crate::model::{ColumnSpec, Property};

    fn rendered(property: Property) -> RenderedProperty {
        let definition = SqliteDialect::new()
            .column_definition(&property, &NoEnums)
            .unwrap();
        RenderedProperty {
            property,
            definition,
        }
    }

    #[test]
    fn test_serial_column() {
        let id = rendered(Property::new("id", ColumnSpec::new(ColumnType::Serial)));
        assert_eq!(id.definition, "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT");
    }

    #[test]
    fn test_boolean_default_is_numeric() {
        let flag = rendered(Property::new(
            "active",
            ColumnSpec::new(ColumnType::Boolean).default_value("true"),
        ));
        assert_eq!(flag.definition, "\"active\" INTEGER NOT NULL DEFAULT 1");
    }

    fn key<'a>(name: &'a str, columns: &'a [String], unique: bool) -> IndexLayout<'a> {
        IndexLayout {
            name,
            columns,
            unique,
        }
    }

    #[test]
    fn test_retype_rebuilds_table() {
        let dialect = SqliteDialect::new();
        let before = rendered(Property::new("n", ColumnSpec::new(ColumnType::Integer)));
        let after = rendered(Property::new(
            "n",
            ColumnSpec::new(ColumnType::Text).default_value("it's"),
        ));
        let columns = vec![
            rendered(Property::new("id", ColumnSpec::new(ColumnType::Serial))),
            after.clone(),
        ];
        let n = vec![String::from("n")];
        let mut table = TableLayout::new("t", &columns);
        table.indices.push(key("idx_t_n", &n, false));

        let sql = dialect
            .retype_column(&table, &before, &after, &NoEnums)
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"t_rebuild\" (\n    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
                 \"n\" TEXT NOT NULL DEFAULT 'it''s'\n)",
                "INSERT INTO \"t_rebuild\" (\"id\", \"n\") SELECT \"id\", \"n\" FROM \"t\"",
                "DROP TABLE \"t\"",
                "ALTER TABLE \"t_rebuild\" RENAME TO \"t\"",
                "CREATE INDEX \"idx_t_n\" ON \"t\" (\"n\")",
            ]
        );
    }

    #[test]
    fn test_retype_with_same_rendering_is_empty() {
        let dialect = SqliteDialect::new();
        let before = rendered(Property::new("name", ColumnSpec::new(ColumnType::Varchar(12))));
        let after = rendered(Property::new("name", ColumnSpec::new(ColumnType::Varchar(24))));
        let columns = vec![after.clone()];
        let sql = dialect
            .retype_column(&TableLayout::new("users", &columns), &before, &after, &NoEnums)
            .unwrap();
        assert!(sql.is_empty());
    }

    #[test]
    fn test_remove_column_drops_covering_indices_first() {
        let dialect = SqliteDialect::new();
        let columns = vec![
            rendered(Property::new("a", ColumnSpec::new(ColumnType::Integer))),
            rendered(Property::new("b", ColumnSpec::new(ColumnType::Integer))),
        ];
        let a = vec![String::from("a")];
        let ab = vec![String::from("a"), String::from("b")];
        let b = vec![String::from("b")];
        let mut table = TableLayout::new("t", &columns);
        table.primary_key = Some(key("pk_t", &ab, true));
        table.indices.push(key("idx_a", &a, false));
        table.indices.push(key("idx_b", &b, true));

        assert_eq!(
            dialect.remove_column(&table, "a"),
            vec![
                "DROP INDEX IF EXISTS \"pk_t\"",
                "DROP INDEX IF EXISTS \"idx_a\"",
                "ALTER TABLE \"t\" DROP COLUMN \"a\"",
            ]
        );
    }

    #[test]
    fn test_primary_key_emulation() {
        let dialect = SqliteDialect::new();
        let properties = vec![
            rendered(Property::new("id", ColumnSpec::new(ColumnType::Serial))),
            rendered(Property::new("a", ColumnSpec::new(ColumnType::Integer))),
            rendered(Property::new("b", ColumnSpec::new(ColumnType::Integer))),
        ];
        assert!(dialect
            .create_primary_key("t", "pk_t", &["id".into()], &properties)
            .is_empty());
        assert_eq!(
            dialect.create_primary_key("t", "pk_t", &["a".into(), "b".into()], &properties),
            vec!["CREATE UNIQUE INDEX \"pk_t\" ON \"t\" (\"a\", \"b\")"]
        );
        assert_eq!(
            dialect.remove_primary_key("t", "pk_t", &["a".into(), "b".into()], &properties),
            vec!["DROP INDEX IF EXISTS \"pk_t\""]
        );
    }

    #[test]
    fn test_foreign_keys_and_enums_are_skipped() {
        let dialect = SqliteDialect::new();
        assert!(dialect
            .create_foreign_key("orders", "fk", "user_id", "users", "id")
            .is_empty());
        assert!(dialect.remove_foreign_key("orders", "fk").is_empty());
        let ty = ColumnType::Enum("app.Status".into());
        assert_eq!(dialect.map_type("s", &ty, &NoEnums).unwrap(), "TEXT");
    }
}
