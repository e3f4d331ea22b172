//! SQL function definitions.

use serde::{Deserialize, Serialize};

use super::types::ColumnType;

/// A SQL function recreated at each of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// Versions in timeline order.
    #[serde(default)]
    pub versions: Vec<FunctionVersion>,
}

impl FunctionDefinition {
    /// Creates a function definition without versions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
        }
    }

    /// Appends a version.
    #[must_use]
    pub fn version(mut self, version: FunctionVersion) -> Self {
        self.versions.push(version);
        self
    }
}

/// One version of a function. Bodies are never diffed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionVersion {
    /// Version label.
    pub version: String,
    /// Parameter types, in order.
    #[serde(default)]
    pub parameters: Vec<ColumnType>,
    /// Return type.
    pub returns: ColumnType,
    /// SQL body text.
    pub body: String,
}

impl FunctionVersion {
    /// Creates a function version.
    #[must_use]
    pub fn new(
        version: impl Into<String>,
        parameters: Vec<ColumnType>,
        returns: ColumnType,
        body: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            parameters,
            returns,
            body: body.into(),
        }
    }
}
