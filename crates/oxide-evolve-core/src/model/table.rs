//! Table definitions: ordered, versioned change timelines.

use serde::{Deserialize, Serialize};

use super::types::ColumnSpec;

/// A table described as an ordered timeline of version changes.
///
/// # Example
///
/// ```rust
/// use oxide_evolve_core::model::{ColumnSpec, ColumnType, TableDefinition, VersionChange};
///
/// let users = TableDefinition::new("app.User")
///     .change(
///         VersionChange::new("1.0.0")
///             .named("users")
///             .add("id", ColumnSpec::new(ColumnType::Serial))
///             .add("name", ColumnSpec::new(ColumnType::Varchar(12)))
///             .primary_key("pk_users", &["id"]),
///     )
///     .change(
///         VersionChange::new("1.0.1")
///             .add("display_name", ColumnSpec::new(ColumnType::Text).nullable()),
///     );
///
/// assert_eq!(users.base_name(), Some("users"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Stable source identity.
    pub id: String,
    /// Version changes in timeline order.
    #[serde(default)]
    pub changes: Vec<VersionChange>,
}

impl TableDefinition {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            changes: Vec::new(),
        }
    }

    /// Appends a version change.
    #[must_use]
    pub fn change(mut self, change: VersionChange) -> Self {
        self.changes.push(change);
        self
    }

    /// Returns the name given by the first version change.
    #[must_use]
    pub fn base_name(&self) -> Option<&str> {
        self.changes.first().and_then(|c| c.name.as_deref())
    }
}

/// All changes of one table at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChange {
    /// Version label.
    pub version: String,
    /// Table name. Required on the first change; a different name later
    /// renames the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Property changes, applied in order.
    #[serde(default)]
    pub properties: Vec<PropertyChange>,
    /// Constraint changes.
    #[serde(default)]
    pub constraints: Vec<ConstraintChange>,
    /// Index changes.
    #[serde(default)]
    pub indices: Vec<IndexChange>,
}

impl VersionChange {
    /// Creates an empty change for a version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            name: None,
            properties: Vec::new(),
            constraints: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Sets the table name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn add(mut self, name: impl Into<String>, column: ColumnSpec) -> Self {
        self.properties.push(PropertyChange::Add {
            name: name.into(),
            column,
        });
        self
    }

    /// Renames a property.
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>, to: impl Into<String>) -> Self {
        self.properties.push(PropertyChange::Rename {
            name: name.into(),
            to: to.into(),
        });
        self
    }

    /// Changes the type of a property.
    #[must_use]
    pub fn retype(mut self, name: impl Into<String>, column: ColumnSpec) -> Self {
        self.properties.push(PropertyChange::Retype {
            name: name.into(),
            column,
        });
        self
    }

    /// Removes a property.
    #[must_use]
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.properties.push(PropertyChange::Remove { name: name.into() });
        self
    }

    /// Adds a primary key.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.constraints.push(ConstraintChange::AddPrimaryKey {
            name: name.into(),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
        });
        self
    }

    /// Adds a foreign key from `column` to `referenced_column` of the table
    /// with id `references`.
    #[must_use]
    pub fn foreign_key(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        references: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        self.constraints.push(ConstraintChange::AddForeignKey {
            name: name.into(),
            column: column.into(),
            references: references.into(),
            referenced_column: referenced_column.into(),
        });
        self
    }

    /// Removes a constraint.
    #[must_use]
    pub fn drop_constraint(mut self, kind: ConstraintKind, name: impl Into<String>) -> Self {
        self.constraints.push(ConstraintChange::Remove {
            kind,
            name: name.into(),
        });
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.add_index(IndexKind::Index, name, columns)
    }

    /// Adds a unique index.
    #[must_use]
    pub fn unique_index(self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.add_index(IndexKind::UniqueIndex, name, columns)
    }

    fn add_index(mut self, kind: IndexKind, name: impl Into<String>, columns: &[&str]) -> Self {
        self.indices.push(IndexChange::Add {
            kind,
            name: name.into(),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
        });
        self
    }

    /// Removes an index.
    #[must_use]
    pub fn drop_index(mut self, kind: IndexKind, name: impl Into<String>) -> Self {
        self.indices.push(IndexChange::Remove {
            kind,
            name: name.into(),
        });
        self
    }
}

/// A change to one property (column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PropertyChange {
    /// Add a new property.
    Add {
        /// Property name.
        name: String,
        /// Type, nullability, default.
        column: ColumnSpec,
    },
    /// Rename a property.
    Rename {
        /// Current name.
        name: String,
        /// New name.
        to: String,
    },
    /// Change type, nullability or default of a property.
    Retype {
        /// Property name.
        name: String,
        /// New type, nullability, default.
        column: ColumnSpec,
    },
    /// Remove a property.
    Remove {
        /// Property name.
        name: String,
    },
}

impl PropertyChange {
    /// Returns the name of the property the change applies to.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Add { name, .. }
            | Self::Rename { name, .. }
            | Self::Retype { name, .. }
            | Self::Remove { name } => name,
        }
    }
}

/// Kind of a table constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Primary key.
    PrimaryKey,
    /// Foreign key.
    ForeignKey,
}

/// A change to a table constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConstraintChange {
    /// Add a primary key over the listed columns.
    AddPrimaryKey {
        /// Constraint name.
        name: String,
        /// Key columns, in order.
        columns: Vec<String>,
    },
    /// Add a single-column foreign key.
    AddForeignKey {
        /// Constraint name.
        name: String,
        /// Local column.
        column: String,
        /// Id of the referenced table definition.
        references: String,
        /// Referenced column name.
        referenced_column: String,
    },
    /// Remove a constraint.
    Remove {
        /// Constraint kind.
        kind: ConstraintKind,
        /// Constraint name.
        name: String,
    },
}

/// Kind of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Plain index.
    #[default]
    Index,
    /// Unique index.
    UniqueIndex,
}

/// A change to a table index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IndexChange {
    /// Add an index.
    Add {
        /// Index kind.
        #[serde(default)]
        kind: IndexKind,
        /// Index name.
        name: String,
        /// Indexed columns, in order.
        columns: Vec<String>,
    },
    /// Remove an index.
    Remove {
        /// Index kind.
        #[serde(default)]
        kind: IndexKind,
        /// Index name.
        name: String,
    },
}
