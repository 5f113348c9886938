//! Persistence of applied migration ids in `schema_migrations`.

use sea_orm::{
    ActiveValue::{NotSet, Set},
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Order, QueryOrder,
    sea_query::NullOrdering,
};
use sea_orm_migration::SchemaManager;
use tracing::debug;

use crate::entities::schema_migrations::{self, Column, Entity};

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "schema_migrations";

const CREATE_LEDGER_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    id          TEXT PRIMARY KEY,
    applied_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// Whether the ledger table exists. Never creates it.
pub async fn table_exists(db: &DatabaseConnection) -> Result<bool, DbErr> {
    SchemaManager::new(db).has_table(LEDGER_TABLE).await
}

/// Creates the ledger table if it is absent.
///
/// A concurrent creator can make `IF NOT EXISTS` fail on some engines; the
/// error is ignored when the table turns out to exist afterwards.
pub async fn ensure_table(db: &DatabaseConnection) -> Result<(), DbErr> {
    match db.execute_unprepared(CREATE_LEDGER_SQL).await {
        Ok(_) => Ok(()),
        Err(err) => {
            if table_exists(db).await? {
                debug!(error = %err, "Ledger table created concurrently");
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

/// All ledger entries, ascending by id.
pub async fn applied<C: ConnectionTrait>(conn: &C) -> Result<Vec<schema_migrations::Model>, DbErr> {
    Entity::find().order_by_asc(Column::Id).all(conn).await
}

/// The most recently applied entry; ties on `applied_at` go to the greater id.
///
/// Rows with a NULL `applied_at` sort after every timestamped row on all
/// backends.
pub async fn last_applied<C: ConnectionTrait>(
    conn: &C,
) -> Result<Option<schema_migrations::Model>, DbErr> {
    Entity::find()
        .order_by_with_nulls(Column::AppliedAt, Order::Desc, NullOrdering::Last)
        .order_by_desc(Column::Id)
        .one(conn)
        .await
}

/// Whether `id` has a ledger entry.
pub async fn is_applied<C: ConnectionTrait>(conn: &C, id: &str) -> Result<bool, DbErr> {
    Ok(Entity::find_by_id(id.to_owned()).one(conn).await?.is_some())
}

/// Records `id` as applied; `applied_at` takes the database default.
pub async fn record<C: ConnectionTrait>(conn: &C, id: &str) -> Result<(), DbErr> {
    let entry = schema_migrations::ActiveModel {
        id: Set(id.to_owned()),
        applied_at: NotSet,
    };
    Entity::insert(entry).exec_without_returning(conn).await?;
    Ok(())
}

/// Deletes the ledger entry for `id`.
pub async fn remove<C: ConnectionTrait>(conn: &C, id: &str) -> Result<(), DbErr> {
    let result = Entity::delete_by_id(id.to_owned()).exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!(
            "ledger entry for migration {id}"
        )));
    }
    Ok(())
}
