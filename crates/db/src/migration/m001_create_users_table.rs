//! Users table.
//!
//! Email is unique; lookups by name, phone and signup date are indexed.

use super::definition::{MigrationDefinition, Sql};

/// Migration id.
pub const ID: &str = "001_create_users_table";

/// Builds the migration definition.
pub fn definition() -> MigrationDefinition {
    MigrationDefinition::new(ID, Sql(UP_SQL), Sql(DOWN_SQL))
}

const UP_SQL: &str = r"
CREATE TABLE users (
    id BIGSERIAL PRIMARY KEY,
    full_name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(20) NOT NULL,
    password VARCHAR(255) NOT NULL,
    avatar_url VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_users_email UNIQUE (email)
);

CREATE INDEX idx_users_full_name ON users(full_name);
CREATE INDEX idx_users_phone ON users(phone);
CREATE INDEX idx_users_created_at ON users(created_at);
";

const DOWN_SQL: &str = "DROP TABLE IF EXISTS users CASCADE;";
