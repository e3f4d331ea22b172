//! Apply versioned schema changelogs to a database.
//!
//! `oxide-evolve` is the runtime half of `oxide-evolve-core`: it loads a
//! definitions document, builds its changelog and applies the versions a
//! database has not seen yet.
//!
//! - **Migrator** - Applies pending versions in one transaction
//! - **Marker** - Stores the last applied version in a metadata table
//! - **Source** - Loads JSON definition documents
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use oxide_evolve::prelude::*;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! # async fn run() -> oxide_evolve::Result<()> {
//! let changelog = load_changelog(Path::new("definitions.json"), Dialect::Sqlite)?;
//! let pool = SqlitePoolOptions::new().connect("sqlite:app.db").await?;
//!
//! let applied = Migrator::new(pool).run_migrations(&changelog).await?;
//! println!("applied {applied:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the SQL of every version for PostgreSQL
//! oxide-evolve --definitions schema.json changelog --dialect postgres
//!
//! # Apply pending versions to a SQLite database
//! oxide-evolve --database sqlite:app.db --definitions schema.json migrate
//!
//! # Show the stored version and what is pending
//! oxide-evolve --database sqlite:app.db --definitions schema.json status
//! ```

pub mod error;
pub mod marker;
pub mod migrator;
pub mod source;

pub use error::{MigrateError, Result};
pub use marker::{MetadataStore, DEFAULT_METADATA_TABLE};
pub use migrator::{pending_changes, Migrator};
pub use source::{load_changelog, load_definitions};

/// Commonly used items.
pub mod prelude {
    pub use crate::error::{MigrateError, Result};
    pub use crate::migrator::Migrator;
    pub use crate::source::{load_changelog, load_definitions};
    pub use oxide_evolve_core::{Changelog, ChangelogBuilder, Definitions, Dialect};
}
