//! Contacts table.
//!
//! Each contact belongs to a user and disappears with it.

use super::definition::{MigrationDefinition, Sql};

/// Migration id.
pub const ID: &str = "002_create_contacts_table";

/// Builds the migration definition.
pub fn definition() -> MigrationDefinition {
    MigrationDefinition::new(ID, Sql(UP_SQL), Sql(DOWN_SQL))
}

const UP_SQL: &str = r"
CREATE TABLE contacts (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    full_name VARCHAR(255) NOT NULL,
    phone VARCHAR(20) NOT NULL,
    email VARCHAR(255),
    favorite BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_contacts_user_id ON contacts(user_id);
CREATE INDEX idx_contacts_full_name ON contacts(full_name);
CREATE INDEX idx_contacts_phone ON contacts(phone);
CREATE INDEX idx_contacts_email ON contacts(email);
-- Partial index over favorites only
CREATE INDEX idx_contacts_favorite ON contacts(user_id, favorite) WHERE favorite;
CREATE INDEX idx_contacts_created_at ON contacts(created_at);
";

const DOWN_SQL: &str = "DROP TABLE IF EXISTS contacts;";
