//! Loading definition documents.

use std::path::Path;

use oxide_evolve_core::{Changelog, ChangelogBuilder, Definitions, Dialect};
use tracing::debug;

use crate::error::{MigrateError, Result};

/// Reads a JSON definitions document.
///
/// # Errors
///
/// Returns [`MigrateError::Io`] when the file cannot be read and
/// [`MigrateError::Definitions`] when it is not a valid document.
pub fn load_definitions(path: &Path) -> Result<Definitions> {
    let json = std::fs::read_to_string(path)?;
    let definitions = Definitions::from_json(&json).map_err(|source| MigrateError::Definitions {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        tables = definitions.tables.len(),
        enums = definitions.enums.len(),
        functions = definitions.functions.len(),
        "definitions loaded"
    );
    Ok(definitions)
}

/// Reads a definitions document and builds its changelog for `dialect`.
///
/// # Errors
///
/// Fails like [`load_definitions`], or with [`MigrateError::Schema`] when
/// the definitions are inconsistent.
pub fn load_changelog(path: &Path, dialect: Dialect) -> Result<Changelog> {
    let definitions = load_definitions(path)?;
    Ok(ChangelogBuilder::new(&definitions, dialect).build()?)
}
