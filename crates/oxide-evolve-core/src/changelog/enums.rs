//! Enum state tracking across the version timeline.

use std::collections::HashMap;

use crate::dialect::{EnumColumn, EnumLookup, SchemaDialect};
use crate::error::{Result, SchemaError};
use crate::model::{EnumDefinition, EnumState};

use super::{Descriptions, Statement};

#[derive(Debug, Clone)]
struct TrackedEnum {
    definition: EnumDefinition,
    /// One entry per timeline version; `None` until the first values.
    snapshots: Vec<Option<EnumState>>,
}

/// Per-version value snapshots of every enum referenced by a property.
///
/// Enums are registered lazily, the first time a property uses them, but
/// their snapshots always cover the whole timeline.
#[derive(Debug, Clone)]
pub struct EnumTracker {
    versions: Vec<String>,
    enums: Vec<TrackedEnum>,
}

impl EnumTracker {
    /// Creates a tracker over the sorted version timeline.
    #[must_use]
    pub fn new(versions: &[String]) -> Self {
        Self {
            versions: versions.to_vec(),
            enums: Vec::new(),
        }
    }

    /// Registers an enum. Defining it again is a no-op.
    pub fn define(&mut self, definition: &EnumDefinition) {
        if self.enums.iter().any(|e| e.definition.name == definition.name) {
            return;
        }
        let mut current = EnumState::empty(definition);
        let snapshots = self
            .versions
            .iter()
            .map(|version| {
                if let Some(change) = definition.change_at(version) {
                    current = current.extended(&change.values);
                }
                (!current.values.is_empty()).then(|| current.clone())
            })
            .collect();
        tracing::debug!(name = %definition.name, "tracking enum");
        self.enums.push(TrackedEnum {
            definition: definition.clone(),
            snapshots,
        });
    }

    /// Returns whether the enum designated by `reference` is registered.
    #[must_use]
    pub fn is_defined(&self, reference: &str) -> bool {
        self.find(reference).is_some()
    }

    /// Returns the state valid at `version`, if the enum is registered and
    /// has values by then.
    #[must_use]
    pub fn get(&self, reference: &str, version: &str) -> Option<&EnumState> {
        let position = self.versions.binary_search_by(|v| v.as_str().cmp(version)).ok()?;
        self.find(reference)?.snapshots[position].as_ref()
    }

    /// Returns a lookup pinned to `version`.
    #[must_use]
    pub fn at<'a>(&'a self, version: &'a str) -> EnumsAt<'a> {
        EnumsAt {
            tracker: self,
            version,
        }
    }

    fn find(&self, reference: &str) -> Option<&TrackedEnum> {
        self.enums
            .iter()
            .find(|e| e.definition.is_referenced_by(reference))
    }

    /// Renders the enum statements of every version, in timeline order.
    ///
    /// `users` maps a version to the enum-typed columns that existed before
    /// the version's table changes.
    pub(crate) fn changelog(
        &self,
        dialect: &dyn SchemaDialect,
        users: &HashMap<String, Vec<EnumColumn>>,
        descriptions: &mut Descriptions,
    ) -> Result<Vec<(String, Vec<Statement>)>> {
        let mut changes = Vec::new();
        for (position, version) in self.versions.iter().enumerate() {
            let mut statements = Vec::new();
            for tracked in &self.enums {
                let Some(state) = tracked.snapshots[position].as_ref() else {
                    continue;
                };
                let previous = position
                    .checked_sub(1)
                    .and_then(|p| tracked.snapshots[p].as_ref());
                match previous {
                    None => {
                        let description = format!("create-enum-{}", state.name);
                        statements.extend(descriptions.statements(&description, dialect.create_enum(state)));
                    }
                    Some(previous) if previous.values.len() < state.values.len() => {
                        let added = &state.values[previous.values.len()..];
                        let columns: Vec<EnumColumn> = users
                            .get(version)
                            .map(|all| {
                                all.iter()
                                    .filter(|c| {
                                        c.property
                                            .spec
                                            .column_type
                                            .enum_reference()
                                            .is_some_and(|r| tracked.definition.is_referenced_by(r))
                                    })
                                    .cloned()
                                    .collect()
                            })
                            .unwrap_or_default();
                        let description = format!("add-enum-values-{}", state.name);
                        statements.extend(descriptions.statements(
                            &description,
                            dialect.add_enum_values(state, added, &columns)?,
                        ));
                    }
                    Some(_) => {}
                }
            }
            if !statements.is_empty() {
                changes.push((version.clone(), statements));
            }
        }
        Ok(changes)
    }
}

/// [`EnumTracker`] view answering lookups at one version.
#[derive(Debug, Clone, Copy)]
pub struct EnumsAt<'a> {
    tracker: &'a EnumTracker,
    version: &'a str,
}

impl EnumLookup for EnumsAt<'_> {
    fn lookup(&self, reference: &str) -> Result<&EnumState> {
        if !self.tracker.is_defined(reference) {
            return Err(SchemaError::UnknownEnum {
                reference: reference.to_string(),
            });
        }
        self.tracker
            .get(reference, self.version)
            .ok_or_else(|| SchemaError::EnumNotDefined {
                reference: reference.to_string(),
                version: self.version.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::model::{ColumnSpec, ColumnType, Property};

    fn versions() -> Vec<String> {
        ["1.0.0", "1.0.1", "1.0.2", "1.0.3"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn status() -> EnumDefinition {
        EnumDefinition::new("status", "app.Status")
            .add_values("1.0.1", &["new", "done"])
            .add_values("1.0.3", &["void"])
    }

    #[test]
    fn test_snapshots_are_monotonic() {
        let mut tracker = EnumTracker::new(&versions());
        tracker.define(&status());

        assert!(tracker.get("app.Status", "1.0.0").is_none());
        assert_eq!(
            tracker.get("app.Status", "1.0.1").unwrap().values,
            vec!["new", "done"]
        );
        assert_eq!(
            tracker.get("status", "1.0.2").unwrap().values,
            vec!["new", "done"]
        );
        assert_eq!(
            tracker.get("app.Status", "1.0.3").unwrap().values,
            vec!["new", "done", "void"]
        );
    }

    #[test]
    fn test_define_is_idempotent() {
        let mut tracker = EnumTracker::new(&versions());
        tracker.define(&status());
        tracker.define(&status());
        let changes = tracker
            .changelog(
                Dialect::Postgres.renderer(),
                &HashMap::new(),
                &mut Descriptions::default(),
            )
            .unwrap();
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_lookup_errors() {
        let mut tracker = EnumTracker::new(&versions());
        tracker.define(&status());
        assert!(matches!(
            tracker.at("1.0.0").lookup("app.Status"),
            Err(SchemaError::EnumNotDefined { .. })
        ));
        assert!(matches!(
            tracker.at("1.0.1").lookup("app.Other"),
            Err(SchemaError::UnknownEnum { .. })
        ));
    }

    #[test]
    fn test_postgres_changelog() {
        let mut tracker = EnumTracker::new(&versions());
        tracker.define(&status());
        let changes = tracker
            .changelog(
                Dialect::Postgres.renderer(),
                &HashMap::new(),
                &mut Descriptions::default(),
            )
            .unwrap();

        assert_eq!(changes[0].0, "1.0.1");
        assert_eq!(changes[0].1[0].description, "create-enum-status");
        assert_eq!(
            changes[0].1[0].query,
            "CREATE TYPE \"status\" AS ENUM ('new', 'done')"
        );
        assert_eq!(changes[1].0, "1.0.3");
        assert_eq!(changes[1].1[0].description, "add-enum-values-status");
        assert_eq!(
            changes[1].1[0].query,
            "ALTER TYPE \"status\" ADD VALUE 'void'"
        );
    }

    #[test]
    fn test_mysql_changelog_uses_columns_of_the_version() {
        let mut tracker = EnumTracker::new(&versions());
        tracker.define(&status());
        let column = EnumColumn {
            table: "orders".into(),
            property: Property::new(
                "status",
                ColumnSpec::new(ColumnType::Enum("app.Status".into())),
            ),
        };
        let users = HashMap::from([("1.0.3".to_string(), vec![column])]);
        let changes = tracker
            .changelog(Dialect::MySql.renderer(), &users, &mut Descriptions::default())
            .unwrap();

        // MySQL has no named enum type, so only the value addition shows up.
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].1[0].query,
            "ALTER TABLE `orders` MODIFY COLUMN `status` ENUM('new', 'done', 'void') NOT NULL"
        );
    }

    #[test]
    fn test_postgres_values_of_one_version_share_a_description() {
        let mut tracker = EnumTracker::new(&versions());
        tracker.define(
            &EnumDefinition::new("status", "app.Status")
                .add_values("1.0.1", &["new"])
                .add_values("1.0.2", &["late", "lost"]),
        );
        let changes = tracker
            .changelog(
                Dialect::Postgres.renderer(),
                &HashMap::new(),
                &mut Descriptions::default(),
            )
            .unwrap();

        let added = &changes[1].1;
        assert_eq!(added.len(), 2);
        assert!(added
            .iter()
            .all(|s| s.description == "add-enum-values-status"));
        assert_eq!(added[1].query, "ALTER TYPE \"status\" ADD VALUE 'lost'");
    }
}
