//! Read-only reconciliation of the catalog against the ledger.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::catalog::Catalog;
use crate::entities::schema_migrations;

/// State of a single migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Migration id.
    pub id: String,
    /// Whether the ledger records the migration.
    pub applied: bool,
    /// When the migration was applied.
    pub applied_at: Option<NaiveDateTime>,
}

/// Status of every catalog migration, in history order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// One entry per catalog migration.
    pub migrations: Vec<MigrationStatus>,
    /// Ledger entries with no catalog definition.
    pub orphaned: Vec<MigrationStatus>,
}

impl StatusReport {
    /// Builds the report from the catalog and the ledger rows.
    #[must_use]
    pub fn reconcile(catalog: &Catalog, ledger: Vec<schema_migrations::Model>) -> Self {
        let mut applied: HashMap<String, Option<NaiveDateTime>> = ledger
            .into_iter()
            .map(|entry| (entry.id, entry.applied_at))
            .collect();

        let migrations = catalog
            .ids()
            .map(|id| match applied.remove(id) {
                Some(applied_at) => MigrationStatus {
                    id: id.to_owned(),
                    applied: true,
                    applied_at,
                },
                None => MigrationStatus {
                    id: id.to_owned(),
                    applied: false,
                    applied_at: None,
                },
            })
            .collect();

        let mut orphaned: Vec<MigrationStatus> = applied
            .into_iter()
            .map(|(id, applied_at)| MigrationStatus {
                id,
                applied: true,
                applied_at,
            })
            .collect();
        orphaned.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            migrations,
            orphaned,
        }
    }

    /// Looks up the status of `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MigrationStatus> {
        self.migrations.iter().find(|status| status.id == id)
    }

    /// Migrations not yet applied, in history order.
    pub fn pending(&self) -> impl Iterator<Item = &MigrationStatus> {
        self.migrations.iter().filter(|status| !status.applied)
    }

    /// Number of applied catalog migrations.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.migrations.iter().filter(|status| status.applied).count()
    }

    /// Number of pending catalog migrations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Migration status:")?;
        for status in &self.migrations {
            match (status.applied, status.applied_at) {
                (true, Some(at)) => writeln!(f, "  [applied] {}  ({at})", status.id)?,
                (true, None) => writeln!(f, "  [applied] {}", status.id)?,
                (false, _) => writeln!(f, "  [pending] {}", status.id)?,
            }
        }
        for status in &self.orphaned {
            writeln!(f, "  [unknown] {}", status.id)?;
        }
        write!(
            f,
            "{} migration(s): {} applied, {} pending",
            self.migrations.len(),
            self.applied_count(),
            self.pending_count()
        )
    }
}
