//! Migration definitions and the procedures they run.

use std::fmt;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseTransaction, DbErr};
use serde::Serialize;

/// A schema change executed inside a migration transaction.
#[async_trait]
pub trait Procedure: Send + Sync {
    /// Runs the procedure against the migration's transaction.
    async fn execute(&self, txn: &DatabaseTransaction) -> Result<(), DbErr>;
}

/// Raw SQL executed verbatim.
///
/// The text may hold several statements when the backend accepts them in a
/// single simple query (PostgreSQL does).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sql(pub &'static str);

#[async_trait]
impl Procedure for Sql {
    async fn execute(&self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        txn.execute_unprepared(self.0).await?;
        Ok(())
    }
}

/// Direction a migration is run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the schema change.
    Up,
    /// Revert the schema change.
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// One entry of the migration history: an id plus its forward and reverse
/// procedures.
pub struct MigrationDefinition {
    id: String,
    up: Box<dyn Procedure>,
    down: Box<dyn Procedure>,
}

impl MigrationDefinition {
    /// Creates a definition.
    ///
    /// Ids order the history lexically, so they carry a zero-padded prefix
    /// (`001_create_users_table`).
    pub fn new(
        id: impl Into<String>,
        up: impl Procedure + 'static,
        down: impl Procedure + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            up: Box::new(up),
            down: Box::new(down),
        }
    }

    /// Returns the migration id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the procedure for `direction`.
    #[must_use]
    pub fn procedure(&self, direction: Direction) -> &dyn Procedure {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }
}

impl fmt::Debug for MigrationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationDefinition")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
