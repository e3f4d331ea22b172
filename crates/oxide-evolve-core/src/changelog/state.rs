//! Mutable per-table state while walking the version timeline.

use std::collections::{HashMap, VecDeque};

use crate::dialect::{IndexLayout, RenderedProperty, TableLayout};
use crate::error::{Result, SchemaError};
use crate::model::{ConstraintKind, TableDefinition, VersionChange};

use super::TableSnapshot;

/// A live constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintState {
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    /// Referenced table id and column, for foreign keys.
    pub references: Option<(String, String)>,
}

/// A live index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexState {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Current shape of one table plus the version changes not yet applied.
#[derive(Debug, Clone)]
pub struct TableState {
    pub id: String,
    pub name: String,
    pub properties: Vec<RenderedProperty>,
    pub constraints: Vec<ConstraintState>,
    pub indices: Vec<IndexState>,
    pub created: bool,
    pending: VecDeque<VersionChange>,
}

impl TableState {
    pub fn new(definition: &TableDefinition) -> Result<Self> {
        let first = definition
            .changes
            .first()
            .ok_or_else(|| SchemaError::MissingVersions {
                table: definition.id.clone(),
            })?;
        let name = first
            .name
            .clone()
            .ok_or_else(|| SchemaError::MissingBaseName {
                table: definition.id.clone(),
            })?;
        for pair in definition.changes.windows(2) {
            if pair[1].version <= pair[0].version {
                return Err(SchemaError::UnorderedTimeline {
                    table: definition.id.clone(),
                    version: pair[1].version.clone(),
                });
            }
        }

        Ok(Self {
            id: definition.id.clone(),
            name,
            properties: Vec::new(),
            constraints: Vec::new(),
            indices: Vec::new(),
            created: false,
            pending: definition.changes.iter().cloned().collect(),
        })
    }

    /// Pops the queue head if it belongs to `version`.
    pub fn take_change(&mut self, version: &str) -> Option<VersionChange> {
        if self.pending.front().map(|c| c.version.as_str()) == Some(version) {
            self.pending.pop_front()
        } else {
            None
        }
    }

    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.property.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&RenderedProperty> {
        self.properties.iter().find(|p| p.property.name == name)
    }

    pub fn primary_key(&self) -> Option<&ConstraintState> {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
    }

    /// Renames a column inside this table's own constraints and indices.
    pub fn rename_in_keys(&mut self, from: &str, to: &str) {
        let columns = self
            .constraints
            .iter_mut()
            .flat_map(|c| c.columns.iter_mut())
            .chain(self.indices.iter_mut().flat_map(|i| i.columns.iter_mut()));
        for column in columns {
            if *column == from {
                *column = to.to_string();
            }
        }
    }

    /// The table's keys and indices over `columns`.
    pub fn layout<'a>(&'a self, columns: &'a [RenderedProperty]) -> TableLayout<'a> {
        TableLayout {
            name: &self.name,
            columns,
            primary_key: self.primary_key().map(|pk| IndexLayout {
                name: &pk.name,
                columns: &pk.columns,
                unique: true,
            }),
            indices: self
                .indices
                .iter()
                .map(|index| IndexLayout {
                    name: &index.name,
                    columns: &index.columns,
                    unique: index.unique,
                })
                .collect(),
        }
    }

    pub fn serial_count(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| p.property.is_serial())
            .count()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            name: self.name.clone(),
            properties: self.properties.iter().map(|p| p.property.clone()).collect(),
        }
    }
}

/// Table states indexed by position, with an id lookup.
#[derive(Debug, Default)]
pub struct TableArena {
    tables: Vec<TableState>,
    index: HashMap<String, usize>,
}

impl TableArena {
    /// Builds the arena; a repeated id keeps the first definition.
    pub fn new(definitions: &[TableDefinition]) -> Result<Self> {
        let mut arena = Self::default();
        for definition in definitions {
            if arena.index.contains_key(&definition.id) {
                tracing::debug!(table = %definition.id, "ignoring duplicate table definition");
                continue;
            }
            let state = TableState::new(definition)?;
            arena.index.insert(definition.id.clone(), arena.tables.len());
            arena.tables.push(state);
        }
        Ok(arena)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, position: usize) -> &TableState {
        &self.tables[position]
    }

    pub fn get_mut(&mut self, position: usize) -> &mut TableState {
        &mut self.tables[position]
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableState> {
        self.tables.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TableState> {
        self.tables.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSpec, ColumnType};

    fn users() -> TableDefinition {
        TableDefinition::new("app.User")
            .change(
                VersionChange::new("1.0.0")
                    .named("users")
                    .add("id", ColumnSpec::new(ColumnType::Serial)),
            )
            .change(VersionChange::new("1.0.1").remove("id"))
    }

    #[test]
    fn test_missing_versions() {
        let err = TableState::new(&TableDefinition::new("app.Empty")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "table definition 'app.Empty' without any scheme version"
        );
    }

    #[test]
    fn test_missing_base_name() {
        let def = TableDefinition::new("app.T").change(VersionChange::new("1.0.0"));
        assert!(matches!(
            TableState::new(&def),
            Err(SchemaError::MissingBaseName { .. })
        ));
    }

    #[test]
    fn test_unordered_timeline() {
        let def = TableDefinition::new("app.T")
            .change(VersionChange::new("1.0.1").named("t"))
            .change(VersionChange::new("1.0.0"));
        assert!(matches!(
            TableState::new(&def),
            Err(SchemaError::UnorderedTimeline { version, .. }) if version == "1.0.0"
        ));
    }

    #[test]
    fn test_take_change_only_at_head_version() {
        let mut state = TableState::new(&users()).unwrap();
        assert!(state.take_change("1.0.1").is_none());
        assert!(state.take_change("1.0.0").is_some());
        assert!(state.take_change("1.0.0").is_none());
        assert!(state.take_change("1.0.1").is_some());
    }

    #[test]
    fn test_arena_first_definition_wins() {
        let other = TableDefinition::new("app.User")
            .change(VersionChange::new("2.0.0").named("people"));
        let arena = TableArena::new(&[users(), other]).unwrap();
        assert_eq!(arena.len(), 1);
        let position = arena.position("app.User").unwrap();
        assert_eq!(arena.get(position).name, "users");
    }
}
