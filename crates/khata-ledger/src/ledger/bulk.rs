//! All-or-nothing batch edits and deletions.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use khata_core::validation::{validate_id, validate_id_batch, validate_tags};
use khata_core::{BulkResult, BulkTransactionUpdate, CoreError, TransactionUpdate};
use khata_db::{CreditRepository, SaleRepository};

use super::editor::apply_edit;
use super::LedgerService;
use crate::audit::audit_entry;
use crate::error::{LedgerError, LedgerResult};

const BULK_EDIT_REASON: &str = "Bulk update";

/// Drops repeated ids, keeping first-seen order.
fn dedupe(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.insert(id.as_str()) {
            unique.push(id.clone());
        }
    }
    unique
}

impl LedgerService {
    /// Applies the same kind/tags change to every listed sale.
    ///
    /// Every sale is attempted so the error lists all failures, but one
    /// failure rolls the whole batch back. One audit entry is written on
    /// success.
    pub async fn bulk_update(
        &self,
        shop_id: &str,
        request: BulkTransactionUpdate,
    ) -> LedgerResult<BulkResult> {
        debug!(shop_id, count = request.sale_ids.len(), "Bulk updating transactions");
        validate_id("shop_id", shop_id)?;
        validate_id("editor_id", &request.editor_id)?;
        validate_id_batch(&request.sale_ids)?;
        if let Some(tags) = &request.tags {
            validate_tags(tags)?;
        }

        let ids = dedupe(&request.sale_ids);
        let update = TransactionUpdate {
            amount_paise: None,
            kind: request.kind,
            notes: None,
            tags: request.tags.clone(),
            edit_reason: BULK_EDIT_REASON.to_string(),
            editor_id: request.editor_id.clone(),
        };
        let now = Utc::now();

        let mut tx = self.db.begin().await?;
        let mut sales: HashMap<String, _> = SaleRepository::get_many(&mut tx, shop_id, &ids)
            .await?
            .into_iter()
            .map(|sale| (sale.id.clone(), sale))
            .collect();

        let mut failures = Vec::new();
        for id in &ids {
            let Some(sale) = sales.remove(id) else {
                failures.push(format!("sale {id}: not found"));
                continue;
            };
            match apply_edit(&mut tx, sale, &update, now).await {
                Ok(_) => {}
                Err(LedgerError::Core(err)) => failures.push(format!("sale {id}: {err}")),
                Err(err) => return Err(err),
            }
        }

        if !failures.is_empty() {
            tx.rollback().await?;
            warn!(shop_id, failed = failures.len(), "Bulk update rolled back");
            return Err(CoreError::BulkFailed { failures }.into());
        }
        tx.commit().await?;

        self.audit
            .record(audit_entry(
                shop_id,
                &request.editor_id,
                "transactions.bulk_update",
                json!({
                    "sale_ids": &ids,
                    "kind": request.kind,
                    "tags": request.tags,
                }),
            ))
            .await;

        let count = ids.len() as u64;
        info!(shop_id, count, "Bulk update applied");
        Ok(BulkResult { count })
    }

    /// Hard-deletes sales together with their credit entries.
    ///
    /// Either every listed id belongs to the shop and all are deleted, or
    /// nothing is deleted and the count is 0. Settled (PAID) entries go too.
    pub async fn delete_transactions(
        &self,
        shop_id: &str,
        sale_ids: &[String],
        actor_id: &str,
    ) -> LedgerResult<BulkResult> {
        debug!(shop_id, count = sale_ids.len(), actor_id, "Deleting transactions");
        validate_id("shop_id", shop_id)?;
        validate_id("actor_id", actor_id)?;
        validate_id_batch(sale_ids)?;

        let ids = dedupe(sale_ids);

        let mut tx = self.db.begin().await?;
        let sales = SaleRepository::get_many(&mut tx, shop_id, &ids).await?;
        if sales.len() != ids.len() {
            warn!(
                shop_id,
                requested = ids.len(),
                found = sales.len(),
                "Some sales are missing or belong to another shop, nothing deleted"
            );
            tx.rollback().await?;
            return Ok(BulkResult { count: 0 });
        }

        let entries = CreditRepository::get_by_sales(&mut tx, &ids).await?;
        let paid = entries.iter().filter(|e| e.is_paid()).count();
        if paid > 0 {
            warn!(shop_id, paid, "Deleting sales with settled credit entries");
        }

        CreditRepository::delete_by_sales(&mut tx, &ids).await?;
        let count = SaleRepository::delete_many(&mut tx, shop_id, &ids).await?;
        tx.commit().await?;

        self.audit
            .record(audit_entry(
                shop_id,
                actor_id,
                "transactions.delete",
                json!({
                    "sale_ids": &ids,
                    "credit_entries_removed": entries.len(),
                }),
            ))
            .await;

        info!(shop_id, count, "Transactions deleted");
        Ok(BulkResult { count })
    }

    /// Deletes one sale. A sale that is missing (or in another shop) is
    /// NotFound.
    pub async fn delete_transaction(
        &self,
        shop_id: &str,
        sale_id: &str,
        actor_id: &str,
    ) -> LedgerResult<()> {
        let result = self
            .delete_transactions(shop_id, &[sale_id.to_string()], actor_id)
            .await?;
        if result.count == 0 {
            return Err(CoreError::not_found("Sale", sale_id).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_seen_order() {
        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedupe(&ids), vec!["b".to_string(), "a".to_string()]);
    }
}
