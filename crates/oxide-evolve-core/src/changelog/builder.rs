//! The changelog builder.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use super::enums::EnumTracker;
use super::state::{ConstraintState, IndexState, TableArena};
use super::{Changelog, Descriptions, Statement, VersionedStatements};
use crate::dialect::{Dialect, EnumColumn, EnumLookup, RenderedProperty, SchemaDialect};
use crate::error::{Result, SchemaError};
use crate::model::{
    ColumnType, ConstraintChange, ConstraintKind, Definitions, IndexChange, IndexKind, Property,
    PropertyChange, TypeResolver, VersionChange,
};

/// Computes a [`Changelog`] from a definition model for one dialect.
///
/// A build holds no shared state, so independent builds may run on
/// different threads at the same time.
///
/// # Example
///
/// ```rust
/// use oxide_evolve_core::changelog::ChangelogBuilder;
/// use oxide_evolve_core::dialect::Dialect;
/// use oxide_evolve_core::model::{ColumnSpec, ColumnType, Definitions, TableDefinition, VersionChange};
///
/// let definitions = Definitions::new().table(
///     TableDefinition::new("app.User").change(
///         VersionChange::new("1.0.0")
///             .named("users")
///             .add("id", ColumnSpec::new(ColumnType::Serial)),
///     ),
/// );
///
/// let changelog = ChangelogBuilder::new(&definitions, Dialect::Postgres).build().unwrap();
/// assert_eq!(changelog.table_changes[0].statements[0].description, "create-table-users");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ChangelogBuilder<'a> {
    definitions: &'a Definitions,
    dialect: Dialect,
}

impl<'a> ChangelogBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub const fn new(definitions: &'a Definitions, dialect: Dialect) -> Self {
        Self {
            definitions,
            dialect,
        }
    }

    /// Walks every version and returns the changelog.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] met; no partial changelog is
    /// produced.
    pub fn build(&self) -> Result<Changelog> {
        let versions = self.definitions.versions();
        let mut run = BuildRun::new(self.definitions, self.dialect, &versions)?;

        let mut enum_users = HashMap::new();
        let mut table_changes = HashMap::new();
        for version in &versions {
            enum_users.insert(version.clone(), run.enum_users());
            let active = run.take_changes(version);
            debug!(version = %version, tables = active.len(), "applying version");

            let mut statements = Vec::new();
            for (position, change) in &active {
                statements.extend(run.apply_properties(*position, change, version)?);
            }
            for (position, change) in &active {
                for constraint in &change.constraints {
                    statements.extend(run.apply_constraint(*position, constraint)?);
                }
            }
            for (position, change) in &active {
                for index in &change.indices {
                    statements.extend(run.apply_index(*position, index)?);
                }
            }
            debug!(version = %version, statements = statements.len(), "table changes computed");
            table_changes.insert(version.clone(), statements);
        }

        for table in run.arena.iter() {
            if table.serial_count() > 1 {
                return Err(SchemaError::MultipleSerial {
                    table: table.name.clone(),
                });
            }
        }

        let mut enum_changes: HashMap<String, Vec<Statement>> = run
            .enums
            .changelog(run.renderer, &enum_users, &mut run.descriptions)?
            .into_iter()
            .collect();
        let mut function_changes = self.function_changes(run.renderer, &mut run.descriptions)?;

        let mut changelog = Changelog {
            versions: versions.clone(),
            tables: run
                .arena
                .iter()
                .map(|t| (t.id.clone(), t.snapshot()))
                .collect(),
            ..Changelog::default()
        };
        for version in &versions {
            let buckets = [
                (&mut enum_changes, &mut changelog.enum_changes),
                (&mut function_changes, &mut changelog.function_changes),
                (&mut table_changes, &mut changelog.table_changes),
            ];
            for (source, target) in buckets {
                let Some(statements) = source.remove(version) else {
                    continue;
                };
                if statements.is_empty() {
                    continue;
                }
                target.push(VersionedStatements {
                    version: version.clone(),
                    statements,
                });
            }
        }

        info!(
            dialect = %self.dialect,
            versions = versions.len(),
            statements = changelog.statement_count(),
            "changelog built"
        );
        Ok(changelog)
    }

    fn function_changes(
        &self,
        renderer: &dyn SchemaDialect,
        descriptions: &mut Descriptions,
    ) -> Result<HashMap<String, Vec<Statement>>> {
        let mut changes: HashMap<String, Vec<Statement>> = HashMap::new();
        for function in &self.definitions.functions {
            let description = format!("create-function-{}", function.name);
            for version in &function.versions {
                let sql = renderer.create_function(&function.name, version)?;
                changes
                    .entry(version.version.clone())
                    .or_default()
                    .extend(descriptions.statements(&description, sql));
            }
        }
        Ok(changes)
    }
}

/// Mutable state of one build.
struct BuildRun<'a> {
    definitions: &'a Definitions,
    renderer: &'static dyn SchemaDialect,
    arena: TableArena,
    enums: EnumTracker,
    /// Constraint and index names, unique across all tables.
    names: HashSet<String>,
    descriptions: Descriptions,
}

impl<'a> BuildRun<'a> {
    fn new(definitions: &'a Definitions, dialect: Dialect, versions: &[String]) -> Result<Self> {
        Ok(Self {
            definitions,
            renderer: dialect.renderer(),
            arena: TableArena::new(&definitions.tables)?,
            enums: EnumTracker::new(versions),
            names: HashSet::new(),
            descriptions: Descriptions::default(),
        })
    }

    /// Enum-typed columns of every materialized table.
    fn enum_users(&self) -> Vec<EnumColumn> {
        self.arena
            .iter()
            .filter(|t| t.created)
            .flat_map(|t| {
                t.properties
                    .iter()
                    .filter(|p| p.property.spec.column_type.enum_reference().is_some())
                    .map(move |p| EnumColumn {
                        table: t.name.clone(),
                        property: p.property.clone(),
                    })
            })
            .collect()
    }

    fn take_changes(&mut self, version: &str) -> Vec<(usize, VersionChange)> {
        (0..self.arena.len())
            .filter_map(|position| {
                self.arena
                    .get_mut(position)
                    .take_change(version)
                    .map(|change| (position, change))
            })
            .collect()
    }

    fn claim(&mut self, name: &str) -> Result<()> {
        if self.names.insert(name.to_string()) {
            Ok(())
        } else {
            Err(SchemaError::DuplicateName {
                name: name.to_string(),
            })
        }
    }

    /// Registers the enum a column type refers to and checks it has values
    /// at `version`.
    fn prepare_enum(&mut self, column_type: &ColumnType, version: &str) -> Result<()> {
        let mut ty = column_type;
        while let ColumnType::Array(inner) = ty {
            ty = inner.as_ref();
        }
        let Some(reference) = ty.enum_reference() else {
            return Ok(());
        };
        let definitions = self.definitions;
        let definition =
            definitions
                .resolve_enum(reference)
                .ok_or_else(|| SchemaError::UnknownEnum {
                    reference: reference.to_string(),
                })?;
        self.enums.define(definition);
        self.enums.at(version).lookup(reference).map(|_| ())
    }

    fn render(&self, property: Property, version: &str) -> Result<RenderedProperty> {
        let definition = self
            .renderer
            .column_definition(&property, &self.enums.at(version))?;
        Ok(RenderedProperty {
            property,
            definition,
        })
    }

    fn apply_properties(
        &mut self,
        position: usize,
        change: &VersionChange,
        version: &str,
    ) -> Result<Vec<Statement>> {
        if !self.arena.get(position).created {
            return self.create_table(position, change, version);
        }

        let mut statements = Vec::new();
        if let Some(ref name) = change.name {
            let table = self.arena.get_mut(position);
            if *name != table.name {
                let from = std::mem::replace(&mut table.name, name.clone());
                debug!(from = %from, to = %name, "renaming table");
                statements.extend(self.descriptions.statements(
                    &format!("rename-table-{from}"),
                    self.renderer.rename_table(&from, name),
                ));
            }
        }
        for property_change in &change.properties {
            statements.extend(self.apply_property(position, property_change, version)?);
        }
        Ok(statements)
    }

    fn create_table(
        &mut self,
        position: usize,
        change: &VersionChange,
        version: &str,
    ) -> Result<Vec<Statement>> {
        let table_name = self.arena.get(position).name.clone();
        if change.properties.is_empty() {
            return Err(SchemaError::EmptyTable { table: table_name });
        }

        let mut properties: Vec<RenderedProperty> = Vec::with_capacity(change.properties.len());
        for property_change in &change.properties {
            let PropertyChange::Add { name, column } = property_change else {
                return Err(SchemaError::NonAddOnCreation {
                    table: table_name,
                    property: property_change.name().to_string(),
                });
            };
            if properties.iter().any(|p| p.property.name == *name) {
                return Err(SchemaError::DuplicateProperty {
                    table: table_name,
                    property: name.clone(),
                });
            }
            self.prepare_enum(&column.column_type, version)?;
            properties.push(self.render(Property::new(name.clone(), column.clone()), version)?);
        }

        debug!(table = %table_name, columns = properties.len(), "creating table");
        let sql = self.renderer.create_table(&table_name, &properties);
        let table = self.arena.get_mut(position);
        table.properties = properties;
        table.created = true;
        Ok(self.descriptions.statements(&format!("create-table-{table_name}"), sql))
    }

    fn apply_property(
        &mut self,
        position: usize,
        change: &PropertyChange,
        version: &str,
    ) -> Result<Vec<Statement>> {
        let table_name = self.arena.get(position).name.clone();
        let unknown = |property: &str| SchemaError::UnknownProperty {
            table: table_name.clone(),
            property: property.to_string(),
        };

        match change {
            PropertyChange::Add { name, column } => {
                if self.arena.get(position).property(name).is_some() {
                    return Err(SchemaError::DuplicateProperty {
                        table: table_name,
                        property: name.clone(),
                    });
                }
                self.prepare_enum(&column.column_type, version)?;
                let rendered = self.render(Property::new(name.clone(), column.clone()), version)?;
                let sql = self.renderer.create_column(&table_name, &rendered);
                self.arena.get_mut(position).properties.push(rendered);
                Ok(self.descriptions.statements(&format!("add-column-{table_name}-{name}"), sql))
            }
            PropertyChange::Rename { name, to } => {
                let table = self.arena.get(position);
                let index = table.property_index(name).ok_or_else(|| unknown(name))?;
                if table.property(to).is_some() {
                    return Err(SchemaError::DuplicateProperty {
                        table: table_name,
                        property: to.clone(),
                    });
                }
                let table_id = table.id.clone();
                let mut property = table.properties[index].property.clone();
                property.name = to.clone();
                let rendered = self.render(property, version)?;

                let table = self.arena.get_mut(position);
                table.properties[index] = rendered;
                table.rename_in_keys(name, to);
                for other in self.arena.iter_mut() {
                    for constraint in &mut other.constraints {
                        if let Some((referenced_table, referenced_column)) = &mut constraint.references {
                            if *referenced_table == table_id && *referenced_column == *name {
                                *referenced_column = to.clone();
                            }
                        }
                    }
                }
                Ok(self.descriptions.statements(
                    &format!("rename-column-{table_name}-{name}"),
                    self.renderer.rename_column(&table_name, name, to),
                ))
            }
            PropertyChange::Retype { name, column } => {
                let table = self.arena.get(position);
                let index = table.property_index(name).ok_or_else(|| unknown(name))?;
                let before = table.properties[index].clone();
                if before.property.spec.column_type.enum_reference().is_some()
                    || column.column_type.enum_reference().is_some()
                {
                    return Err(SchemaError::EnumRetype {
                        table: table_name,
                        property: name.clone(),
                    });
                }
                self.prepare_enum(&column.column_type, version)?;
                let after = self.render(Property::new(name.clone(), column.clone()), version)?;

                let table = self.arena.get(position);
                let mut columns = table.properties.clone();
                columns[index] = after.clone();
                let sql = self.renderer.retype_column(
                    &table.layout(&columns),
                    &before,
                    &after,
                    &self.enums.at(version),
                )?;
                self.arena.get_mut(position).properties = columns;
                Ok(self.descriptions.statements(&format!("retype-column-{table_name}-{name}"), sql))
            }
            PropertyChange::Remove { name } => {
                let table = self.arena.get(position);
                let index = table.property_index(name).ok_or_else(|| unknown(name))?;
                let sql = self
                    .renderer
                    .remove_column(&table.layout(&table.properties), name);
                self.arena.get_mut(position).properties.remove(index);
                Ok(self.descriptions.statements(&format!("remove-column-{table_name}-{name}"), sql))
            }
        }
    }

    fn apply_constraint(&mut self, position: usize, change: &ConstraintChange) -> Result<Vec<Statement>> {
        match change {
            ConstraintChange::AddPrimaryKey { name, columns } => {
                self.add_primary_key(position, name, columns)
            }
            ConstraintChange::AddForeignKey {
                name,
                column,
                references,
                referenced_column,
            } => self.add_foreign_key(position, name, column, references, referenced_column),
            ConstraintChange::Remove {
                kind: ConstraintKind::PrimaryKey,
                name,
            } => self.remove_primary_key(position, name),
            ConstraintChange::Remove {
                kind: ConstraintKind::ForeignKey,
                name,
            } => self.remove_foreign_key(position, name),
        }
    }

    fn add_primary_key(
        &mut self,
        position: usize,
        name: &str,
        columns: &[String],
    ) -> Result<Vec<Statement>> {
        let table = self.arena.get(position);
        let table_name = table.name.clone();
        if columns.is_empty() {
            return Err(SchemaError::EmptyConstraint {
                table: table_name,
                name: name.to_owned(),
            });
        }
        if table.primary_key().is_some() {
            return Err(SchemaError::DuplicatePrimaryKey { table: table_name });
        }
        for column in columns {
            let property = table.property(column).ok_or_else(|| SchemaError::UnknownProperty {
                table: table_name.clone(),
                property: column.clone(),
            })?;
            if property.property.is_nullable() {
                return Err(SchemaError::NullablePrimaryKey {
                    table: table_name,
                    name: name.to_owned(),
                    column: column.clone(),
                });
            }
        }
        let sql = self
            .renderer
            .create_primary_key(&table_name, name, columns, &table.properties);
        self.claim(name)?;
        self.arena.get_mut(position).constraints.push(ConstraintState {
            name: name.to_owned(),
            kind: ConstraintKind::PrimaryKey,
            columns: columns.to_vec(),
            references: None,
        });
        Ok(self.descriptions.statements(&format!("add-primary-key-{name}"), sql))
    }

    fn add_foreign_key(
        &mut self,
        position: usize,
        name: &str,
        column: &str,
        references: &str,
        referenced_column: &str,
    ) -> Result<Vec<Statement>> {
        let table = self.arena.get(position);
        let table_name = table.name.clone();
        let property = table.property(column).ok_or_else(|| SchemaError::UnknownProperty {
            table: table_name.clone(),
            property: column.to_owned(),
        })?;
        if property.property.is_serial() {
            return Err(SchemaError::SerialForeignKey {
                table: table_name,
                name: name.to_owned(),
                column: column.to_owned(),
            });
        }
        let target = self
            .arena
            .position(references)
            .map(|p| self.arena.get(p))
            .filter(|t| t.created && t.property(referenced_column).is_some())
            .ok_or_else(|| SchemaError::UnknownReference {
                table: table_name.clone(),
                name: name.to_owned(),
                referenced_table: references.to_owned(),
                column: referenced_column.to_owned(),
            })?;
        let sql = self
            .renderer
            .create_foreign_key(&table_name, name, column, &target.name, referenced_column);
        self.claim(name)?;
        self.arena.get_mut(position).constraints.push(ConstraintState {
            name: name.to_owned(),
            kind: ConstraintKind::ForeignKey,
            columns: vec![column.to_owned()],
            references: Some((references.to_owned(), referenced_column.to_owned())),
        });
        Ok(self.descriptions.statements(&format!("add-foreign-key-{name}"), sql))
    }

    fn remove_primary_key(&mut self, position: usize, name: &str) -> Result<Vec<Statement>> {
        let table = self.arena.get(position);
        let columns = table
            .primary_key()
            .filter(|pk| pk.name == name)
            .map(|pk| pk.columns.clone())
            .ok_or_else(|| SchemaError::MissingPrimaryKey {
                table: table.name.clone(),
                name: name.to_owned(),
            })?;
        let sql = self
            .renderer
            .remove_primary_key(&table.name, name, &columns, &table.properties);
        self.names.remove(name);
        self.arena
            .get_mut(position)
            .constraints
            .retain(|c| c.name != name);
        Ok(self.descriptions.statements(&format!("remove-primary-key-{name}"), sql))
    }

    fn remove_foreign_key(&mut self, position: usize, name: &str) -> Result<Vec<Statement>> {
        let table = self.arena.get(position);
        let exists = table
            .constraints
            .iter()
            .any(|c| c.kind == ConstraintKind::ForeignKey && c.name == name);
        if !exists {
            return Err(SchemaError::UnknownConstraint {
                table: table.name.clone(),
                name: name.to_owned(),
            });
        }
        let sql = self.renderer.remove_foreign_key(&table.name, name);
        self.names.remove(name);
        self.arena
            .get_mut(position)
            .constraints
            .retain(|c| c.name != name);
        Ok(self.descriptions.statements(&format!("remove-foreign-key-{name}"), sql))
    }

    fn apply_index(&mut self, position: usize, change: &IndexChange) -> Result<Vec<Statement>> {
        let table = self.arena.get(position);
        let table_name = table.name.clone();

        match change {
            IndexChange::Add {
                kind,
                name,
                columns,
            } => {
                if columns.is_empty() {
                    return Err(SchemaError::EmptyIndex {
                        table: table_name,
                        name: name.clone(),
                    });
                }
                if let Some(missing) = columns.iter().find(|c| table.property(c).is_none()) {
                    return Err(SchemaError::UnknownProperty {
                        table: table_name,
                        property: missing.clone(),
                    });
                }
                if let Some(existing) = table.indices.iter().find(|i| i.columns == *columns) {
                    return Err(SchemaError::DuplicateIndexColumns {
                        table: table_name,
                        name: name.clone(),
                        existing: existing.name.clone(),
                    });
                }
                let unique = *kind == IndexKind::UniqueIndex;
                let sql = if unique {
                    self.renderer.create_unique_index(&table_name, name, columns)
                } else {
                    self.renderer.create_index(&table_name, name, columns)
                };
                self.claim(name)?;
                self.arena.get_mut(position).indices.push(IndexState {
                    name: name.clone(),
                    unique,
                    columns: columns.clone(),
                });
                Ok(self.descriptions.statements(&format!("add-index-{name}"), sql))
            }
            IndexChange::Remove { name, .. } => {
                if !table.indices.iter().any(|i| i.name == *name) {
                    return Err(SchemaError::UnknownIndex {
                        table: table_name,
                        name: name.clone(),
                    });
                }
                let sql = self.renderer.remove_index(&table_name, name);
                self.names.remove(name);
                self.arena.get_mut(position).indices.retain(|i| i.name != *name);
                Ok(self.descriptions.statements(&format!("remove-index-{name}"), sql))
            }
        }
    }
}
