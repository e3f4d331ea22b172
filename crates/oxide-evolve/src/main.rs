//! oxide-evolve CLI
//!
//! Command-line tool for computing and applying schema changelogs.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_evolve::prelude::*;
use oxide_evolve::DEFAULT_METADATA_TABLE;

/// Versioned schema evolution.
#[derive(Parser)]
#[command(name = "oxide-evolve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// JSON definitions document.
    #[arg(long, env = "OXIDE_EVOLVE_DEFINITIONS", default_value = "definitions.json")]
    definitions: PathBuf,

    /// Table holding the version marker.
    #[arg(long, default_value = DEFAULT_METADATA_TABLE)]
    metadata_table: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the changelog without touching any database.
    Changelog {
        /// Target dialect: mysql, postgres or sqlite.
        #[arg(long, default_value = "sqlite")]
        dialect: Dialect,

        /// Print the changelog as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Apply pending versions.
    Migrate,

    /// Show the stored version and pending versions.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Changelog { dialect, json } => {
            let changelog = load_changelog(&cli.definitions, dialect)?;
            if json {
                println!("{}", changelog.to_json()?);
            } else {
                for change in changelog.all_changes() {
                    println!("-- version {}", change.version);
                    for statement in &change.statements {
                        println!("-- {}", statement.description);
                        println!("{};", statement.query);
                    }
                    println!();
                }
            }
        }

        Commands::Migrate => {
            let changelog = load_changelog(&cli.definitions, Dialect::Sqlite)?;
            let migrator = connect(&cli.database, &cli.metadata_table).await?;
            let applied = migrator.run_migrations(&changelog).await?;
            if applied.is_empty() {
                info!("No pending versions.");
            } else {
                for version in &applied {
                    println!(" [X] {version}");
                }
            }
        }

        Commands::Status => {
            let changelog = load_changelog(&cli.definitions, Dialect::Sqlite)?;
            let migrator = connect(&cli.database, &cli.metadata_table).await?;
            let current = migrator.current_version().await?;
            let pending = migrator.pending_versions(&changelog).await?;

            println!(
                "Current version: {}",
                current.as_deref().unwrap_or("(none)")
            );
            println!("{:-<60}", "");
            for version in &changelog.versions {
                let mark = if pending.contains(version) { ' ' } else { 'X' };
                println!(" [{mark}] {version}");
            }
        }
    }

    Ok(())
}

async fn connect(database: &str, metadata_table: &str) -> anyhow::Result<Migrator> {
    let options = SqliteConnectOptions::from_str(database)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(Migrator::new(pool).metadata_table(metadata_table)?)
}
