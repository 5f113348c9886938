//! Database migrations.
//!
//! The [`Catalog`] holds the migration history as code; the
//! [`MigrationRunner`] reconciles it with the `schema_migrations` ledger.
//!
//! # Atomicity
//!
//! Each migration runs in its own transaction together with its ledger
//! update. PostgreSQL and SQLite roll DDL back with the transaction; engines
//! that auto-commit DDL (MySQL) only get best-effort atomicity.

mod catalog;
mod definition;
mod error;
pub mod ledger;
mod runner;
mod status;

mod m001_create_users_table;
mod m002_create_contacts_table;

pub use catalog::Catalog;
pub use definition::{Direction, MigrationDefinition, Procedure, Sql};
pub use error::MigrationError;
pub use runner::{Command, MIGRATION_LOCK_KEY, MigrationRunner, Outcome, RunnerOptions};
pub use status::{MigrationStatus, StatusReport};

/// The Rolodex migration history.
pub fn catalog() -> Catalog {
    Catalog::new()
        .register(m001_create_users_table::definition())
        .register(m002_create_contacts_table::definition())
}
