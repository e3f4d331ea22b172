//! Error types for applying changelogs.

use std::path::PathBuf;

use oxide_evolve_core::SchemaError;

/// Errors that can occur while loading definitions or migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error outside of changelog statements.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A changelog statement failed; the transaction was rolled back.
    #[error("Statement '{description}' of version {version} failed: {source}")]
    Statement {
        /// Version the statement belongs to.
        version: String,
        /// Statement description.
        description: String,
        /// Underlying database error.
        #[source]
        source: sqlx::Error,
    },

    /// The definitions could not be turned into a changelog.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO error (reading definition files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a definitions file.
    #[error("Failed to parse definitions '{path}': {source}")]
    Definitions {
        /// Path to the definitions file.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The metadata table name is not a plain identifier.
    #[error("Invalid metadata table name: {0}")]
    InvalidMetadataTable(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
