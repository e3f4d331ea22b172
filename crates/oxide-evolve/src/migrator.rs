//! Changelog application.
//!
//! A [`Migrator`] applies every version of a [`Changelog`] newer than the
//! stored marker inside one transaction, then advances the marker.

use oxide_evolve_core::changelog::VersionedStatements;
use oxide_evolve_core::Changelog;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{MigrateError, Result};
use crate::marker::MetadataStore;

/// Returns the versions of `all` that come strictly after `marker`.
///
/// Without a marker the whole timeline is pending. A marker that is not
/// part of the timeline also yields the whole timeline.
#[must_use]
pub fn pending_changes(
    all: Vec<VersionedStatements>,
    marker: Option<&str>,
) -> Vec<VersionedStatements> {
    let Some(marker) = marker else {
        return all;
    };
    match all.iter().position(|c| c.version == marker) {
        Some(position) => all.into_iter().skip(position + 1).collect(),
        None => {
            warn!(marker = %marker, "stored version not found in changelog, applying every version");
            all
        }
    }
}

/// Applies changelogs to a SQLite database.
pub struct Migrator {
    pool: SqlitePool,
    store: MetadataStore,
}

impl Migrator {
    /// Creates a migrator using the default metadata table.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            store: MetadataStore::default(),
        }
    }

    /// Uses `table` to store the version marker.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::InvalidMetadataTable`] for names that are not
    /// plain identifiers.
    pub fn metadata_table(mut self, table: &str) -> Result<Self> {
        self.store = MetadataStore::new(table)?;
        Ok(self)
    }

    /// Returns the metadata store.
    #[must_use]
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Returns the last applied version.
    pub async fn current_version(&self) -> Result<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        self.store.ensure_table(&mut conn).await?;
        self.store.version(&mut conn).await
    }

    /// Returns the versions `run_migrations` would apply, without applying
    /// anything.
    pub async fn pending_versions(&self, changelog: &Changelog) -> Result<Vec<String>> {
        let marker = self.current_version().await?;
        Ok(pending_changes(changelog.all_changes(), marker.as_deref())
            .into_iter()
            .map(|c| c.version)
            .collect())
    }

    /// Applies every pending version and returns their labels.
    ///
    /// All statements and the marker update run in one transaction; on any
    /// failure nothing is applied and the marker keeps its value.
    pub async fn run_migrations(&self, changelog: &Changelog) -> Result<Vec<String>> {
        let mut tx = self.pool.begin().await?;
        self.store.ensure_table(&mut tx).await?;
        let marker = self.store.version(&mut tx).await?;

        let pending = pending_changes(changelog.all_changes(), marker.as_deref());
        let Some(last) = pending.last().map(|c| c.version.clone()) else {
            tx.commit().await?;
            info!(version = ?marker, "database is up to date");
            return Ok(Vec::new());
        };

        info!(
            from = ?marker,
            to = %last,
            versions = pending.len(),
            "applying changelog"
        );
        for change in &pending {
            debug!(version = %change.version, statements = change.statements.len(), "applying version");
            for statement in &change.statements {
                debug!(description = %statement.description, sql = %statement.query, "executing statement");
                if let Err(source) = sqlx::query(&statement.query).execute(&mut *tx).await {
                    warn!(
                        version = %change.version,
                        description = %statement.description,
                        error = %source,
                        "statement failed, rolling back"
                    );
                    tx.rollback().await?;
                    return Err(MigrateError::Statement {
                        version: change.version.clone(),
                        description: statement.description.clone(),
                        source,
                    });
                }
            }
        }

        self.store.set_version(&mut tx, &last).await?;
        tx.commit().await?;
        info!(version = %last, "changelog applied");
        Ok(pending.into_iter().map(|c| c.version).collect())
    }
}
