//! Shared configuration and telemetry setup for Rolodex.
//!
//! This crate provides:
//! - Layered configuration loading (files + `ROLODEX__*` environment)
//! - Tracing subscriber construction for binaries

pub mod config;
pub mod telemetry;

pub use config::{AppConfig, DatabaseConfig, LogConfig, MigrationConfig};
