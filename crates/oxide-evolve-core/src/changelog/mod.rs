//! Changelog computation.
//!
//! [`ChangelogBuilder`] walks every definition timeline version by version
//! and produces a [`Changelog`]: the literal SQL statements that take a
//! database from one version to the next, for one dialect.

mod builder;
mod enums;
mod state;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

pub use builder::ChangelogBuilder;
pub use enums::{EnumTracker, EnumsAt};

use crate::model::Property;

/// One SQL statement with a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Description such as `add-column-users-display_name`.
    pub description: String,
    /// Literal query text.
    pub query: String,
}

impl Statement {
    /// Creates a statement.
    #[must_use]
    pub fn new(description: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            query: query.into(),
        }
    }
}

/// Hands out statement descriptions, unique within one build.
#[derive(Debug, Default)]
pub(crate) struct Descriptions(HashSet<String>);

impl Descriptions {
    /// Wraps every query of one operation under the same description.
    ///
    /// A description already claimed by an earlier operation gets a `-2`,
    /// `-3`, ... suffix. An operation without queries claims nothing.
    pub(crate) fn statements(&mut self, description: &str, queries: Vec<String>) -> Vec<Statement> {
        if queries.is_empty() {
            return Vec::new();
        }
        let description = self.claim(description);
        queries
            .into_iter()
            .map(|query| Statement::new(description.clone(), query))
            .collect()
    }

    fn claim(&mut self, description: &str) -> String {
        if self.0.insert(description.to_string()) {
            return description.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{description}-{n}");
            if self.0.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// The statements of one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedStatements {
    /// Version label.
    pub version: String,
    /// Statements, in execution order.
    pub statements: Vec<Statement>,
}

/// Final name and properties of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name after the last version.
    pub name: String,
    /// Properties after the last version, in column order.
    pub properties: Vec<Property>,
}

/// Result of a changelog build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    /// Every version label, in timeline order.
    pub versions: Vec<String>,
    /// Final table shapes by definition id.
    pub tables: BTreeMap<String, TableSnapshot>,
    /// Enum statements per version.
    pub enum_changes: Vec<VersionedStatements>,
    /// Function statements per version.
    pub function_changes: Vec<VersionedStatements>,
    /// Table statements per version.
    pub table_changes: Vec<VersionedStatements>,
}

impl Changelog {
    /// Returns the final name of a table.
    #[must_use]
    pub fn table_name(&self, id: &str) -> Option<&str> {
        self.tables.get(id).map(|t| t.name.as_str())
    }

    /// Returns the final properties of a table.
    #[must_use]
    pub fn properties(&self, id: &str) -> Option<&[Property]> {
        self.tables.get(id).map(|t| t.properties.as_slice())
    }

    /// Merges the three change lists by version.
    ///
    /// Every version of the timeline is present, even without statements,
    /// so that a migrator can advance its marker through it. Within a
    /// version, enum statements come first, then function statements, then
    /// table statements.
    #[must_use]
    pub fn all_changes(&self) -> Vec<VersionedStatements> {
        self.versions
            .iter()
            .map(|version| {
                let statements = [
                    &self.enum_changes,
                    &self.function_changes,
                    &self.table_changes,
                ]
                .into_iter()
                .filter_map(|list| list.iter().find(|c| &c.version == version))
                .flat_map(|c| c.statements.iter().cloned())
                .collect();
                VersionedStatements {
                    version: version.clone(),
                    statements,
                }
            })
            .collect()
    }

    /// Returns the total number of statements.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        [&self.enum_changes, &self.function_changes, &self.table_changes]
            .into_iter()
            .flatten()
            .map(|c| c.statements.len())
            .sum()
    }

    /// Serializes the changelog as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error on failure.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versioned(version: &str, descriptions: &[&str]) -> VersionedStatements {
        VersionedStatements {
            version: version.into(),
            statements: descriptions
                .iter()
                .map(|d| Statement::new(*d, "SELECT 1"))
                .collect(),
        }
    }

    #[test]
    fn test_all_changes_orders_kinds_within_version() {
        let changelog = Changelog {
            versions: vec!["1.0.0".into(), "1.0.1".into(), "1.0.2".into()],
            tables: BTreeMap::new(),
            enum_changes: vec![versioned("1.0.1", &["create-enum-status"])],
            function_changes: vec![versioned("1.0.1", &["create-function-f"])],
            table_changes: vec![
                versioned("1.0.0", &["create-table-users"]),
                versioned("1.0.1", &["add-column-users-status"]),
            ],
        };

        let all = changelog.all_changes();
        assert_eq!(all.len(), 3);
        let second: Vec<&str> = all[1]
            .statements
            .iter()
            .map(|s| s.description.as_str())
            .collect();
        assert_eq!(
            second,
            vec![
                "create-enum-status",
                "create-function-f",
                "add-column-users-status"
            ]
        );
        assert!(all[2].statements.is_empty());
        assert_eq!(changelog.statement_count(), 4);
    }

    #[test]
    fn test_one_operation_shares_its_description() {
        let mut descriptions = Descriptions::default();
        let first = descriptions.statements(
            "retype-column-users-name",
            vec!["ALTER 1".into(), "ALTER 2".into()],
        );
        assert!(first
            .iter()
            .all(|s| s.description == "retype-column-users-name"));

        assert!(descriptions
            .statements("retype-column-users-name", Vec::new())
            .is_empty());
        let second = descriptions.statements("retype-column-users-name", vec!["ALTER 3".into()]);
        assert_eq!(second[0].description, "retype-column-users-name-2");
    }

    #[test]
    fn test_json_export() {
        let changelog = Changelog {
            versions: vec!["1.0.0".into()],
            table_changes: vec![versioned("1.0.0", &["create-table-users"])],
            ..Changelog::default()
        };
        let json = changelog.to_json().unwrap();
        let parsed: Changelog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, changelog);
    }
}
