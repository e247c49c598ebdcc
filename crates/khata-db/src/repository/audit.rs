//! Audit log storage.

use sqlx::types::Json;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use khata_core::AuditEntry;

pub struct AuditRepository;

impl AuditRepository {
    pub async fn insert(conn: &mut SqliteConnection, entry: &AuditEntry) -> DbResult<()> {
        debug!(shop_id = %entry.shop_id, action = %entry.action, "Writing audit entry");

        sqlx::query(
            r#"
            INSERT INTO audit_log (id, shop_id, actor_id, action, detail, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.shop_id)
        .bind(&entry.actor_id)
        .bind(&entry.action)
        .bind(Json(&entry.detail))
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// A shop's audit entries, oldest first.
    pub async fn list_for_shop(
        conn: &mut SqliteConnection,
        shop_id: &str,
    ) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log WHERE shop_id = ? ORDER BY created_at, rowid",
        )
        .bind(shop_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }
}
