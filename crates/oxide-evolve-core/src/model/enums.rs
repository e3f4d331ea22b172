//! Enum definitions and accumulated enum state.

use serde::{Deserialize, Serialize};

/// An enum described as an ordered timeline of value additions.
///
/// Values only ever accumulate; there is no removal or reordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDefinition {
    /// Logical SQL name of the enum type.
    pub name: String,
    /// External identity properties use to refer to this enum.
    pub reference: String,
    /// Value additions in timeline order.
    #[serde(default)]
    pub changes: Vec<EnumVersionChange>,
}

impl EnumDefinition {
    /// Creates an enum definition without values.
    #[must_use]
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            changes: Vec::new(),
        }
    }

    /// Appends a value addition at `version`.
    #[must_use]
    pub fn add_values(mut self, version: impl Into<String>, values: &[&str]) -> Self {
        self.changes.push(EnumVersionChange {
            version: version.into(),
            values: values.iter().map(|v| String::from(*v)).collect(),
        });
        self
    }

    /// Returns whether `reference` designates this enum, by reference or by name.
    #[must_use]
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        self.reference == reference || self.name == reference
    }

    /// Returns the change recorded for `version`, if any.
    #[must_use]
    pub fn change_at(&self, version: &str) -> Option<&EnumVersionChange> {
        self.changes.iter().find(|c| c.version == version)
    }
}

/// Values added to an enum at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumVersionChange {
    /// Version label.
    pub version: String,
    /// New values, in order.
    pub values: Vec<String>,
}

/// Values of an enum valid at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumState {
    /// Logical SQL name.
    pub name: String,
    /// External identity.
    pub reference: String,
    /// Accumulated values, in insertion order.
    pub values: Vec<String>,
}

impl EnumState {
    /// Creates an empty state for a definition.
    #[must_use]
    pub fn empty(definition: &EnumDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            reference: definition.reference.clone(),
            values: Vec::new(),
        }
    }

    /// Returns a copy extended with `values`, skipping ones already present.
    #[must_use]
    pub fn extended(&self, values: &[String]) -> Self {
        let mut next = self.clone();
        for value in values {
            if !next.values.contains(value) {
                next.values.push(value.clone());
            }
        }
        next
    }
}
