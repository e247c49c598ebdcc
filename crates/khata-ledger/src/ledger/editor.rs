//! Single-transaction edits.
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │ Edit                         │ Credit entry                             │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │ CREDIT → CASH/UPI            │ deleted (Conflict if PAID)               │
//! │ CASH/UPI → CREDIT            │ created OPEN (customer required)         │
//! │ CREDIT → CREDIT, new amount  │ resized in place (Conflict if PAID)      │
//! │ anything else                │ untouched                                │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```
//! Edits are not checked against the customer's credit limit.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use khata_core::ledger::{plan_credit_edit, CreditAction};
use khata_core::validation::{validate_id, validate_transaction_update};
use khata_core::{CoreError, CreditEntry, CreditStatus, Money, Sale, TransactionUpdate};
use khata_db::{CreditRepository, SaleRepository};

use super::LedgerService;
use crate::error::LedgerResult;

impl LedgerService {
    /// Changes a sale's amount, kind, notes or tags and brings its credit
    /// entry in line, atomically.
    pub async fn update_transaction(
        &self,
        sale_id: &str,
        shop_id: &str,
        update: TransactionUpdate,
    ) -> LedgerResult<Sale> {
        debug!(sale_id, shop_id, editor_id = %update.editor_id, "Updating transaction");
        validate_id("sale_id", sale_id)?;
        validate_id("shop_id", shop_id)?;
        validate_transaction_update(&update)?;

        let mut tx = self.db.begin().await?;
        let sale = SaleRepository::get(&mut tx, shop_id, sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;

        let updated = apply_edit(&mut tx, sale, &update, Utc::now()).await?;
        tx.commit().await?;

        info!(
            sale_id,
            kind = %updated.kind,
            amount = %updated.amount(),
            "Transaction updated"
        );
        Ok(updated)
    }
}

/// Applies one edit inside the caller's transaction. The sale must have
/// been loaded through the same connection.
pub(crate) async fn apply_edit(
    conn: &mut SqliteConnection,
    mut sale: Sale,
    update: &TransactionUpdate,
    now: DateTime<Utc>,
) -> LedgerResult<Sale> {
    let entry = CreditRepository::get_by_sale(conn, &sale.id).await?;
    let new_kind = update.kind.unwrap_or(sale.kind);
    let new_amount = update
        .amount_paise
        .map(Money::from_paise)
        .unwrap_or_else(|| sale.amount());

    match plan_credit_edit(&sale, entry.as_ref(), new_kind, new_amount)? {
        CreditAction::None => {}
        CreditAction::Delete { entry_id } => {
            CreditRepository::delete(conn, &entry_id).await?;
        }
        CreditAction::Create {
            customer_id,
            amount,
        } => {
            let entry = CreditEntry {
                id: Uuid::new_v4().to_string(),
                shop_id: sale.shop_id.clone(),
                customer_id,
                sale_id: sale.id.clone(),
                amount_paise: amount.paise(),
                status: CreditStatus::Open,
                created_at: now,
                closed_at: None,
            };
            CreditRepository::insert(conn, &entry).await?;
        }
        CreditAction::UpdateAmount { entry_id, amount } => {
            if !CreditRepository::update_amount(conn, &entry_id, amount.paise()).await? {
                return Err(CoreError::conflict(format!(
                    "credit entry {entry_id} was settled before the edit"
                ))
                .into());
            }
        }
    }

    sale.kind = new_kind;
    sale.amount_paise = new_amount.paise();
    if let Some(notes) = &update.notes {
        sale.notes = Some(notes.clone());
    }
    if let Some(tags) = &update.tags {
        sale.tags = tags.clone();
    }
    sale.edited_by = Some(update.editor_id.clone());
    sale.edited_at = Some(now);
    sale.edit_reason = Some(update.edit_reason.clone());

    SaleRepository::update(conn, &sale).await?;
    Ok(sale)
}
