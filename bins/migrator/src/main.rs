//! Database migration runner for Rolodex.
//!
//! Usage:
//!   migrator --command up      - Run all pending migrations
//!   migrator --command down    - Rollback last migration
//!   migrator --command status  - Show migration status
//!
//! The first Ctrl-C stops the run after the in-flight migration commits or
//! rolls back; a second Ctrl-C exits immediately.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rolodex_db::{
    Command, MigrationError, MigrationRunner, RunnerOptions,
    migration::{self, Outcome},
};
use rolodex_shared::{AppConfig, telemetry};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Applies, reverts and reports Rolodex schema migrations.
#[derive(Parser, Debug)]
#[command(name = "migrator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Migration command: up, down, status
    #[arg(short, long, default_value = "up")]
    command: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Database URL, overriding ROLODEX__DATABASE__URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON document
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Reject unknown commands before touching configuration or the database
    let command: Command = cli.command.parse()?;

    let config = AppConfig::load_with_database_url(cli.database_url)
        .context("Failed to load configuration")?;
    telemetry::init(&config.log).context("Failed to initialize tracing")?;

    let db = rolodex_db::connect(&config.database)
        .await
        .map_err(MigrationError::Connection)?;

    let cancellation = CancellationToken::new();
    spawn_interrupt_handler(cancellation.clone());

    let catalog = migration::catalog();
    let runner = MigrationRunner::new(&db, &catalog)
        .with_options(RunnerOptions::from(&config.migrations))
        .with_cancellation(cancellation);

    info!(%command, "Running migration command");
    let outcome = runner
        .execute(command)
        .await
        .with_context(|| format!("Migration {command} failed"))?;

    print_outcome(&outcome, cli.format)?;

    db.close().await.context("Failed to close database")?;
    Ok(())
}

/// Exit status of a process killed by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// What to do on the `count`th Ctrl-C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Stop at the next migration boundary.
    Cancel,
    /// Exit the process now.
    Exit,
}

fn interrupt_action(count: usize) -> InterruptAction {
    if count <= 1 {
        InterruptAction::Cancel
    } else {
        InterruptAction::Exit
    }
}

/// Cancels the run at the next migration boundary on Ctrl-C and exits on
/// the second one.
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        let mut count = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            count += 1;
            match interrupt_action(count) {
                InterruptAction::Cancel => {
                    warn!("Interrupt received, stopping after the current migration");
                    token.cancel();
                }
                InterruptAction::Exit => {
                    warn!("Second interrupt received, exiting without waiting");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    });
}

fn print_outcome(outcome: &Outcome, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", render_text(outcome)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(outcome))?),
    }
    Ok(())
}

fn render_text(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Applied(ids) if ids.is_empty() => "No pending migrations".to_string(),
        Outcome::Applied(ids) => {
            let mut text = format!("Applied {} migration(s):", ids.len());
            for id in ids {
                text.push_str("\n  ");
                text.push_str(id);
            }
            text
        }
        Outcome::RolledBack(Some(id)) => format!("Rolled back {id}"),
        Outcome::RolledBack(None) => "Nothing to roll back".to_string(),
        Outcome::Status(report) => report.to_string(),
    }
}

fn render_json(outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::Applied(ids) => serde_json::json!({ "applied": ids }),
        Outcome::RolledBack(id) => serde_json::json!({ "rolled_back": id }),
        Outcome::Status(report) => serde_json::json!(report),
    }
}
