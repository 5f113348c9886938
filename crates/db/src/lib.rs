//! Database layer for Rolodex.
//!
//! This crate provides:
//! - Connection pool bootstrap from [`DatabaseConfig`]
//! - The `schema_migrations` ledger entity
//! - The migration catalog and the runner that applies it

pub mod entities;
pub mod migration;

pub use migration::{
    Catalog, Command, MigrationDefinition, MigrationError, MigrationRunner, RunnerOptions,
    StatusReport,
};

use std::time::Duration;

use rolodex_shared::{DatabaseConfig, MigrationConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Establishes a connection pool and verifies it is live.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(config.sqlx_logging);

    let db = Database::connect(options).await?;
    db.ping().await?;
    info!(backend = ?db.get_database_backend(), "Connected to database");
    Ok(db)
}

/// Applies every pending Rolodex migration.
///
/// This is the application bootstrap entry point; it returns the ids applied
/// by this call.
///
/// # Errors
///
/// Returns the first migration failure, see [`MigrationRunner::migrate_up`].
pub async fn run_migrations(
    db: &DatabaseConnection,
    config: &MigrationConfig,
) -> Result<Vec<String>, MigrationError> {
    let catalog = migration::catalog();
    MigrationRunner::new(db, &catalog)
        .with_options(RunnerOptions::from(config))
        .migrate_up()
        .await
}
