//! # oxide-evolve-core
//!
//! Versioned schema evolution and typed SQL statement building.
//!
//! This crate provides:
//! - A definition model describing tables, enums and functions as ordered
//!   timelines of versioned changes
//! - A changelog builder that validates those timelines and renders the
//!   SQL that moves a database from one version to the next
//! - Dialect renderers for MySQL, PostgreSQL and SQLite
//! - An expression compiler and typestate statement builders producing
//!   parameterized SQL
//!
//! ## Computing a changelog
//!
//! ```rust
//! use oxide_evolve_core::dialect::Dialect;
//! use oxide_evolve_core::model::{ColumnSpec, ColumnType, Definitions, TableDefinition, VersionChange};
//! use oxide_evolve_core::ChangelogBuilder;
//!
//! let users = TableDefinition::new("app.User")
//!     .change(
//!         VersionChange::new("1.0.0")
//!             .named("users")
//!             .add("id", ColumnSpec::new(ColumnType::Serial))
//!             .add("name", ColumnSpec::new(ColumnType::Varchar(16))),
//!     )
//!     .change(
//!         VersionChange::new("1.0.1")
//!             .add("email", ColumnSpec::new(ColumnType::Text).nullable()),
//!     );
//!
//! let definitions = Definitions::new().table(users);
//! let changelog = ChangelogBuilder::new(&definitions, Dialect::Postgres)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(changelog.versions, ["1.0.0", "1.0.1"]);
//! assert_eq!(
//!     changelog.table_changes[1].statements[0].query,
//!     "ALTER TABLE \"users\" ADD COLUMN \"email\" TEXT"
//! );
//! ```

pub mod changelog;
pub mod dialect;
pub mod error;
pub mod model;
pub mod query;

pub use changelog::{Changelog, ChangelogBuilder, Statement, VersionedStatements};
pub use dialect::{Dialect, SchemaDialect};
pub use error::{QueryError, SchemaError};
pub use model::Definitions;
