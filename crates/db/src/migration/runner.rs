//! Executes migrations against a caller-supplied connection.
//!
//! Every operation runs strictly sequentially: one transaction per migration,
//! the schema change and its ledger bookkeeping committing or rolling back
//! together. A failure stops the run; migrations committed before it stay
//! applied and the next `migrate_up` resumes at the failed id.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rolodex_shared::MigrationConfig;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr,
    TransactionTrait,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::catalog::Catalog;
use super::definition::{Direction, MigrationDefinition};
use super::error::MigrationError;
use super::ledger;
use super::status::StatusReport;

/// Key of the PostgreSQL advisory lock serializing runners across replicas.
pub const MIGRATION_LOCK_KEY: i64 = 0x0052_4f4c_4f44_4558;

/// Runner behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Take `pg_advisory_xact_lock` inside every migration transaction.
    /// Ignored on backends other than PostgreSQL.
    pub advisory_lock: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            advisory_lock: true,
        }
    }
}

impl From<&MigrationConfig> for RunnerOptions {
    fn from(config: &MigrationConfig) -> Self {
        Self {
            advisory_lock: config.advisory_lock,
        }
    }
}

/// Operations a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Apply every pending migration.
    Up,
    /// Roll back the most recently applied migration.
    Down,
    /// Report applied and pending migrations.
    Status,
}

impl FromStr for Command {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "status" => Ok(Self::Status),
            other => Err(MigrationError::UnknownCommand(other.to_owned())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Status => f.write_str("status"),
        }
    }
}

/// Result of [`MigrationRunner::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ids applied by `up`, in order.
    Applied(Vec<String>),
    /// Id rolled back by `down`, `None` when nothing was applied.
    RolledBack(Option<String>),
    /// Report produced by `status`.
    Status(StatusReport),
}

/// Reconciles a [`Catalog`] with the `schema_migrations` ledger.
///
/// The connection is borrowed, never owned; it may be shared with the rest of
/// the application. Operations on one runner are serialized.
pub struct MigrationRunner<'a> {
    db: &'a DatabaseConnection,
    catalog: &'a Catalog,
    options: RunnerOptions,
    cancellation: Option<CancellationToken>,
    gate: Mutex<()>,
}

impl<'a> MigrationRunner<'a> {
    /// Creates a runner over `catalog` bound to `db`.
    #[must_use]
    pub fn new(db: &'a DatabaseConnection, catalog: &'a Catalog) -> Self {
        Self {
            db,
            catalog,
            options: RunnerOptions::default(),
            cancellation: None,
            gate: Mutex::new(()),
        }
    }

    /// Replaces the runner options.
    #[must_use]
    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Stops `migrate_up` at the next migration boundary once `token` fires.
    ///
    /// A migration already in flight always finishes with commit or rollback.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Runs `command`.
    pub async fn execute(&self, command: Command) -> Result<Outcome, MigrationError> {
        match command {
            Command::Up => self.migrate_up().await.map(Outcome::Applied),
            Command::Down => self.migrate_down().await.map(Outcome::RolledBack),
            Command::Status => self.status().await.map(Outcome::Status),
        }
    }

    /// Applies every pending migration in ascending id order.
    ///
    /// Returns the ids applied by this call; an empty list means nothing was
    /// pending.
    pub async fn migrate_up(&self) -> Result<Vec<String>, MigrationError> {
        let _guard = self.gate.lock().await;
        self.ensure_connected().await?;
        ledger::ensure_table(self.db)
            .await
            .map_err(MigrationError::LedgerInit)?;

        let applied: HashSet<String> = ledger::applied(self.db)
            .await
            .map_err(MigrationError::Ledger)?
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        let pending: Vec<&MigrationDefinition> = self
            .catalog
            .all()
            .iter()
            .filter(|definition| !applied.contains(definition.id()))
            .collect();

        if pending.is_empty() {
            info!("No pending migrations");
            return Ok(Vec::new());
        }
        info!(count = pending.len(), "Applying pending migrations");

        let mut done = Vec::with_capacity(pending.len());
        for definition in pending {
            if self.is_cancelled() {
                warn!(applied = done.len(), "Migration run cancelled");
                return Err(MigrationError::Cancelled {
                    applied: done.len(),
                });
            }

            let id = definition.id();
            match self.apply(definition).await {
                Ok(true) => {
                    info!(migration_id = id, "Applied migration");
                    done.push(id.to_owned());
                }
                Ok(false) => {
                    info!(migration_id = id, "Migration applied by another runner, skipping");
                }
                Err(source) => {
                    error!(migration_id = id, error = %source, "Migration failed");
                    return Err(MigrationError::Execution {
                        id: id.to_owned(),
                        direction: Direction::Up,
                        source,
                    });
                }
            }
        }

        info!(applied = done.len(), "Database migrations completed successfully");
        Ok(done)
    }

    /// Rolls back exactly the most recently applied migration.
    ///
    /// Returns its id, or `None` when the ledger is empty. An absent ledger
    /// table counts as empty and is not created.
    pub async fn migrate_down(&self) -> Result<Option<String>, MigrationError> {
        let _guard = self.gate.lock().await;
        self.ensure_connected().await?;

        if !ledger::table_exists(self.db)
            .await
            .map_err(MigrationError::Ledger)?
        {
            info!("Nothing to roll back");
            return Ok(None);
        }

        let Some(last) = ledger::last_applied(self.db)
            .await
            .map_err(MigrationError::Ledger)?
        else {
            info!("Nothing to roll back");
            return Ok(None);
        };

        let definition = self
            .catalog
            .get(&last.id)
            .ok_or_else(|| MigrationError::UnknownMigration(last.id.clone()))?;

        match self.revert(definition).await {
            Ok(true) => {
                info!(migration_id = %last.id, "Rolled back migration");
                Ok(Some(last.id))
            }
            Ok(false) => {
                info!(migration_id = %last.id, "Migration rolled back by another runner");
                Ok(None)
            }
            Err(source) => {
                error!(migration_id = %last.id, error = %source, "Rollback failed");
                Err(MigrationError::Execution {
                    id: last.id,
                    direction: Direction::Down,
                    source,
                })
            }
        }
    }

    /// Reports every catalog migration as applied or pending.
    ///
    /// Pure read; an absent ledger table reports everything pending.
    pub async fn status(&self) -> Result<StatusReport, MigrationError> {
        let _guard = self.gate.lock().await;
        self.ensure_connected().await?;

        let entries = if ledger::table_exists(self.db)
            .await
            .map_err(MigrationError::Ledger)?
        {
            ledger::applied(self.db)
                .await
                .map_err(MigrationError::Ledger)?
        } else {
            Vec::new()
        };

        Ok(StatusReport::reconcile(self.catalog, entries))
    }

    async fn ensure_connected(&self) -> Result<(), MigrationError> {
        self.db.ping().await.map_err(MigrationError::Connection)
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Returns `Ok(false)` when the ledger already holds the id.
    async fn apply(&self, definition: &MigrationDefinition) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;
        self.lock(&txn).await?;

        if ledger::is_applied(&txn, definition.id()).await? {
            txn.rollback().await?;
            return Ok(false);
        }

        let outcome = async {
            definition.procedure(Direction::Up).execute(&txn).await?;
            ledger::record(&txn, definition.id()).await
        }
        .await;

        finish(txn, outcome, definition.id()).await.map(|()| true)
    }

    /// Returns `Ok(false)` when the ledger no longer holds the id.
    async fn revert(&self, definition: &MigrationDefinition) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;
        self.lock(&txn).await?;

        if !ledger::is_applied(&txn, definition.id()).await? {
            txn.rollback().await?;
            return Ok(false);
        }

        let outcome = async {
            definition.procedure(Direction::Down).execute(&txn).await?;
            ledger::remove(&txn, definition.id()).await
        }
        .await;

        finish(txn, outcome, definition.id()).await.map(|()| true)
    }

    async fn lock(&self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        if self.options.advisory_lock && txn.get_database_backend() == DatabaseBackend::Postgres {
            txn.execute_unprepared(&format!(
                "SELECT pg_advisory_xact_lock({MIGRATION_LOCK_KEY})"
            ))
            .await?;
        }
        Ok(())
    }
}

/// Commits on success, rolls back on failure and returns the original error.
async fn finish(
    txn: DatabaseTransaction,
    outcome: Result<(), DbErr>,
    id: &str,
) -> Result<(), DbErr> {
    match outcome {
        Ok(()) => txn.commit().await,
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(migration_id = id, error = %rollback_err, "Rollback after failure failed");
            }
            Err(err)
        }
    }
}
