//! PostgreSQL dialect.

use super::{quote_literal, EnumColumn, EnumLookup, NoEnums, RenderedProperty, SchemaDialect, TableLayout};
use crate::error::{Result, SchemaError};
use crate::model::{ColumnType, EnumState, FunctionVersion};

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn map_type(
        &self,
        property: &str,
        column_type: &ColumnType,
        enums: &dyn EnumLookup,
    ) -> Result<String> {
        Ok(match column_type {
            ColumnType::Serial => "SERIAL".to_string(),
            ColumnType::BigSerial => "BIGSERIAL".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Real => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Char(n) => format!("CHAR({n})"),
            ColumnType::Varchar(n) => format!("VARCHAR({n})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Blob => "BYTEA".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Enum(reference) => self.quote_identifier(&enums.lookup(reference)?.name),
            ColumnType::Array(element) => {
                if element.is_serial() || matches!(**element, ColumnType::Array(_)) {
                    return Err(SchemaError::UnsupportedType {
                        property: property.to_string(),
                        dialect: self.name(),
                    });
                }
                format!("{}[]", self.map_type(property, element, enums)?)
            }
        })
    }

    fn retype_column(
        &self,
        table: &TableLayout<'_>,
        before: &RenderedProperty,
        after: &RenderedProperty,
        enums: &dyn EnumLookup,
    ) -> Result<Vec<String>> {
        let property = &after.property;
        if property.is_serial() {
            return Err(SchemaError::UnsupportedType {
                property: property.name.clone(),
                dialect: self.name(),
            });
        }
        let alter = format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.quote_identifier(table.name),
            self.quote_identifier(&property.name)
        );
        let ty = self.map_type(&property.name, &property.spec.column_type, enums)?;
        let mut sql = vec![format!("{alter} TYPE {ty}")];
        if property.is_nullable() {
            sql.push(format!("{alter} DROP NOT NULL"));
        } else {
            sql.push(format!("{alter} SET NOT NULL"));
        }
        if before.property.spec.default != property.spec.default {
            match property.spec.default {
                Some(ref raw) => sql.push(format!(
                    "{alter} SET DEFAULT {}",
                    self.format_default(&property.name, &property.spec.column_type, raw)?
                )),
                None => sql.push(format!("{alter} DROP DEFAULT")),
            }
        }
        Ok(sql)
    }

    fn create_enum(&self, state: &EnumState) -> Vec<String> {
        let values: Vec<String> = state.values.iter().map(|v| quote_literal(v)).collect();
        vec![format!(
            "CREATE TYPE {} AS ENUM ({})",
            self.quote_identifier(&state.name),
            values.join(", ")
        )]
    }

    fn add_enum_values(
        &self,
        state: &EnumState,
        added: &[String],
        _users: &[EnumColumn],
    ) -> Result<Vec<String>> {
        Ok(added
            .iter()
            .map(|value| {
                format!(
                    "ALTER TYPE {} ADD VALUE {}",
                    self.quote_identifier(&state.name),
                    quote_literal(value)
                )
            })
            .collect())
    }

    fn create_function(&self, function: &str, version: &FunctionVersion) -> Result<Vec<String>> {
        let mut params = Vec::with_capacity(version.parameters.len());
        for (i, ty) in version.parameters.iter().enumerate() {
            params.push(self.map_type(&format!("{function}.p{}", i + 1), ty, &NoEnums)?);
        }
        let returns = self.map_type(function, &version.returns, &NoEnums)?;
        Ok(vec![format!(
            "CREATE OR REPLACE FUNCTION {}({}) RETURNS {returns} AS $$\n{}\n$$ LANGUAGE SQL",
            self.quote_identifier(function),
            params.join(", "),
            version.body
        )])
    }
}
