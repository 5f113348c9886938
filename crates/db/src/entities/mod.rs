//! `SeaORM` entities owned by the database layer.

pub mod schema_migrations;
