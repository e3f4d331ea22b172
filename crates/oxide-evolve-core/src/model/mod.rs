//! Definition model.
//!
//! Immutable description of tables, enums and functions, each as an ordered
//! timeline of versioned changes. A front-end produces these values (or a
//! JSON document deserialized into [`Definitions`]); everything else in the
//! crate consumes them.

mod enums;
mod function;
mod table;
mod types;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use enums::{EnumDefinition, EnumState, EnumVersionChange};
pub use function::{FunctionDefinition, FunctionVersion};
pub use table::{
    ConstraintChange, ConstraintKind, IndexChange, IndexKind, PropertyChange, TableDefinition,
    VersionChange,
};
pub use types::{ColumnSpec, ColumnType, Property};

/// Resolves "referenced entity" indirections to concrete definitions.
pub trait TypeResolver {
    /// Returns the table definition with the given id.
    fn resolve_table(&self, id: &str) -> Option<&TableDefinition>;

    /// Returns the enum definition designated by `reference`.
    fn resolve_enum(&self, reference: &str) -> Option<&EnumDefinition>;
}

/// The whole definition model handed to the changelog builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definitions {
    /// Table definitions.
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
    /// Enum definitions.
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,
    /// Function definitions.
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

impl Definitions {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table definition.
    #[must_use]
    pub fn table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    /// Adds an enum definition.
    #[must_use]
    pub fn enumeration(mut self, definition: EnumDefinition) -> Self {
        self.enums.push(definition);
        self
    }

    /// Adds a function definition.
    #[must_use]
    pub fn function(mut self, function: FunctionDefinition) -> Self {
        self.functions.push(function);
        self
    }

    /// Parses a JSON definitions document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns every version label used by any table, enum or function,
    /// sorted by plain string order.
    #[must_use]
    pub fn versions(&self) -> Vec<String> {
        let mut versions = BTreeSet::new();
        for table in &self.tables {
            versions.extend(table.changes.iter().map(|c| c.version.clone()));
        }
        for definition in &self.enums {
            versions.extend(definition.changes.iter().map(|c| c.version.clone()));
        }
        for function in &self.functions {
            versions.extend(function.versions.iter().map(|v| v.version.clone()));
        }
        versions.into_iter().collect()
    }
}

impl TypeResolver for Definitions {
    fn resolve_table(&self, id: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.id == id)
    }

    fn resolve_enum(&self, reference: &str) -> Option<&EnumDefinition> {
        self.enums.iter().find(|e| e.is_referenced_by(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_lexically_sorted_and_distinct() {
        let defs = Definitions::new()
            .table(
                TableDefinition::new("a")
                    .change(VersionChange::new("1.0.2").named("a"))
                    .change(VersionChange::new("1.0.10")),
            )
            .enumeration(EnumDefinition::new("e", "E").add_values("1.0.2", &["x"]))
            .function(FunctionDefinition::new("f").version(FunctionVersion::new(
                "1.0.0",
                vec![],
                ColumnType::Integer,
                "SELECT 1",
            )));

        assert_eq!(defs.versions(), vec!["1.0.0", "1.0.10", "1.0.2"]);
    }

    #[test]
    fn test_resolver() {
        let defs = Definitions::new()
            .table(TableDefinition::new("app.User"))
            .enumeration(EnumDefinition::new("status", "app.Status"));

        assert!(defs.resolve_table("app.User").is_some());
        assert!(defs.resolve_table("app.Missing").is_none());
        assert_eq!(defs.resolve_enum("app.Status").unwrap().name, "status");
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "tables": [{
                "id": "app.User",
                "changes": [{
                    "version": "1.0.0",
                    "name": "users",
                    "properties": [
                        {"op": "add", "name": "id", "column": {"type": "serial"}}
                    ],
                    "constraints": [
                        {"op": "add_primary_key", "name": "pk_users", "columns": ["id"]}
                    ]
                }]
            }]
        }"#;
        let defs = Definitions::from_json(json).unwrap();
        assert_eq!(defs.tables[0].base_name(), Some("users"));
        assert_eq!(defs.tables[0].changes[0].constraints.len(), 1);
        assert!(defs.enums.is_empty());
    }
}
