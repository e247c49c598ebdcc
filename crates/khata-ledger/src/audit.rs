//! Audit sink for bulk and destructive ledger operations.
//!
//! Recording is infallible from the caller's point of view: the financial
//! change has already committed, so a failed audit write is logged and
//! swallowed.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use khata_core::AuditEntry;
use khata_db::{AuditRepository, Database, DbResult};

/// Where audit entries go.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}

/// Builds an entry stamped with a fresh id and the current time.
pub fn audit_entry(
    shop_id: &str,
    actor_id: &str,
    action: &str,
    detail: serde_json::Value,
) -> AuditEntry {
    AuditEntry {
        id: Uuid::new_v4().to_string(),
        shop_id: shop_id.to_string(),
        actor_id: actor_id.to_string(),
        action: action.to_string(),
        detail,
        created_at: Utc::now(),
    }
}

/// Writes entries to the `audit_log` table.
pub struct DbAuditSink {
    db: Database,
}

impl DbAuditSink {
    pub fn new(db: Database) -> Self {
        DbAuditSink { db }
    }
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn record(&self, entry: AuditEntry) {
        let result: DbResult<()> = async {
            let mut conn = self.db.acquire().await?;
            AuditRepository::insert(&mut conn, &entry).await
        }
        .await;

        match result {
            Ok(()) => debug!(shop_id = %entry.shop_id, action = %entry.action, "Audit entry written"),
            Err(e) => error!(
                shop_id = %entry.shop_id,
                action = %entry.action,
                actor_id = %entry.actor_id,
                error = %e,
                "Failed to write audit entry"
            ),
        }
    }
}
