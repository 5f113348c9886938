//! Migration runner error types.

use sea_orm::DbErr;
use thiserror::Error;

use super::definition::Direction;

/// Errors that can occur while reconciling the catalog with the ledger.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("Database connection failed: {0}")]
    Connection(#[source] DbErr),

    /// The ledger table could not be created or verified.
    #[error("Failed to initialize migration ledger: {0}")]
    LedgerInit(#[source] DbErr),

    /// Reading the ledger failed.
    #[error("Failed to read migration ledger: {0}")]
    Ledger(#[source] DbErr),

    /// A migration procedure or its ledger bookkeeping failed and its
    /// transaction was rolled back.
    #[error("Migration {id} failed ({direction}): {source}")]
    Execution {
        /// Id of the failing migration.
        id: String,
        /// Direction it was run in.
        direction: Direction,
        /// Underlying database error.
        #[source]
        source: DbErr,
    },

    /// The requested command is not one of `up`, `down`, `status`.
    #[error("Unknown command: {0}. Use: up, down, or status")]
    UnknownCommand(String),

    /// The ledger records a migration the catalog does not define.
    #[error("Migration {0} is recorded in the ledger but has no definition")]
    UnknownMigration(String),

    /// The run was cancelled between two migrations.
    #[error("Migration run cancelled after applying {applied} migration(s)")]
    Cancelled {
        /// Migrations committed before the cancellation was observed.
        applied: usize,
    },
}

impl MigrationError {
    /// Returns the id of the migration this error concerns, if any.
    #[must_use]
    pub fn migration_id(&self) -> Option<&str> {
        match self {
            Self::Execution { id, .. } | Self::UnknownMigration(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_display_names_migration() {
        let err = MigrationError::Execution {
            id: "002_create_contacts_table".into(),
            direction: Direction::Up,
            source: DbErr::Custom("boom".into()),
        };
        let message = err.to_string();
        assert!(message.starts_with("Migration 002_create_contacts_table failed (up): "));
        assert!(message.contains("boom"));
        assert_eq!(err.migration_id(), Some("002_create_contacts_table"));
    }

    #[test]
    fn test_unknown_command_display() {
        assert_eq!(
            MigrationError::UnknownCommand("sideways".into()).to_string(),
            "Unknown command: sideways. Use: up, down, or status"
        );
    }

    #[test]
    fn test_migration_id_absent_for_connection_errors() {
        let err = MigrationError::Connection(DbErr::Custom("refused".into()));
        assert!(err.migration_id().is_none());
    }
}
