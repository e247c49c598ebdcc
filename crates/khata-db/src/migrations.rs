//! Embedded schema migrations.
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary
//! and applied in file-name order when a [`Database`](crate::Database)
//! opens. Applied files are tracked by checksum in `_sqlx_migrations`, so
//! a shipped migration must never be edited; add `NNN_description.sql`
//! instead.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying ledger schema");
    MIGRATOR.run(pool).await?;
    info!("Ledger schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await?;
    Ok((MIGRATOR.migrations.len(), applied as usize))
}
