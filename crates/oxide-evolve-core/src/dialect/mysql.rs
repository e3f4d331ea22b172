//! MySQL dialect.

use super::{quote_literal, EnumColumn, EnumLookup, NoEnums, RenderedProperty, SchemaDialect, TableLayout};
use crate::error::{Result, SchemaError};
use crate::model::{ColumnType, EnumState, FunctionVersion};

/// MySQL 8 dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn supports_upsert(&self) -> bool {
        false
    }

    fn returning_clause(&self, _column: &str) -> Option<String> {
        None
    }

    fn map_type(
        &self,
        property: &str,
        column_type: &ColumnType,
        enums: &dyn EnumLookup,
    ) -> Result<String> {
        Ok(match column_type {
            ColumnType::Serial | ColumnType::Integer => "INT".to_string(),
            ColumnType::BigSerial | ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Real => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Char(n) => format!("CHAR({n})"),
            ColumnType::Varchar(n) => format!("VARCHAR({n})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Enum(reference) => {
                let values: Vec<String> = enums
                    .lookup(reference)?
                    .values
                    .iter()
                    .map(|v| quote_literal(v))
                    .collect();
                format!("ENUM({})", values.join(", "))
            }
            ColumnType::Array(_) => {
                return Err(SchemaError::UnsupportedType {
                    property: property.to_string(),
                    dialect: self.name(),
                })
            }
        })
    }

    fn autoincrement_keyword(&self) -> &'static str {
        " NOT NULL AUTO_INCREMENT PRIMARY KEY"
    }

    fn serial_carries_primary_key(&self) -> bool {
        true
    }

    fn temporal_default(&self, column_type: &ColumnType, canonical: &str) -> String {
        let format = match column_type {
            ColumnType::Date => "%Y-%m-%d",
            ColumnType::Time => "%H:%i:%s",
            _ => "%Y-%m-%d %H:%i:%s",
        };
        format!(
            "(STR_TO_DATE({}, {}))",
            quote_literal(canonical),
            quote_literal(format)
        )
    }

    fn rename_table(&self, from: &str, to: &str) -> Vec<String> {
        vec![format!(
            "RENAME TABLE {} TO {}",
            self.quote_identifier(from),
            self.quote_identifier(to)
        )]
    }

    fn retype_column(
        &self,
        table: &TableLayout<'_>,
        _before: &RenderedProperty,
        after: &RenderedProperty,
        _enums: &dyn EnumLookup,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.quote_identifier(table.name),
            after.definition
        )])
    }

    fn add_enum_values(
        &self,
        state: &EnumState,
        _added: &[String],
        users: &[EnumColumn],
    ) -> Result<Vec<String>> {
        // Inline enums: every column using the type is redefined.
        users
            .iter()
            .map(|user| {
                Ok(format!(
                    "ALTER TABLE {} MODIFY COLUMN {}",
                    self.quote_identifier(&user.table),
                    self.column_definition(&user.property, state)?
                ))
            })
            .collect()
    }

    fn remove_primary_key(
        &self,
        table: &str,
        _name: &str,
        columns: &[String],
        properties: &[RenderedProperty],
    ) -> Vec<String> {
        if super::is_serial_key(columns, properties) {
            return Vec::new();
        }
        vec![format!(
            "ALTER TABLE {} DROP PRIMARY KEY",
            self.quote_identifier(table)
        )]
    }

    fn remove_foreign_key(&self, table: &str, name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(table),
            self.quote_identifier(name)
        )]
    }

    fn remove_index(&self, table: &str, name: &str) -> Vec<String> {
        vec![format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(name),
            self.quote_identifier(table)
        )]
    }

    fn create_function(&self, function: &str, version: &FunctionVersion) -> Result<Vec<String>> {
        let mut params = Vec::with_capacity(version.parameters.len());
        for (i, ty) in version.parameters.iter().enumerate() {
            let name = format!("p{}", i + 1);
            params.push(format!(
                "{name} {}",
                self.map_type(&format!("{function}.{name}"), ty, &NoEnums)?
            ));
        }
        let returns = self.map_type(function, &version.returns, &NoEnums)?;
        Ok(vec![
            format!(
                "DROP FUNCTION IF EXISTS {}",
                self.quote_identifier(function)
            ),
            format!(
                "CREATE FUNCTION {}({}) RETURNS {returns} DETERMINISTIC\nRETURN {}",
                self.quote_identifier(function),
                params.join(", "),
                version.body
            ),
        ])
    }
}
