//! # Ledger Service
//!
//! Balance lookups, sale and payment recording, single and bulk edits,
//! deletions and the read-side queries, all scoped to an explicit shop.
//!
//! ## Operation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         LedgerService                                   │
//! │                                                                         │
//! │  recorder.rs   record_sale, record_payment                             │
//! │  editor.rs     update_transaction                                       │
//! │  bulk.rs       bulk_update, delete_transactions, delete_transaction    │
//! │  query.rs      get_balance, get_all_sales, get_sales_summary,          │
//! │                get_outstanding_balances, get_open_credit_entries       │
//! │                                                                         │
//! │  Every mutation:                                                       │
//! │    db.begin() ─► validate against live rows ─► write ─► commit         │
//! │                                      │                    │             │
//! │                                      └─ error: rollback   └─► audit /  │
//! │                                         (tx dropped)          analytics │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Side effects (audit, analytics) run only after the commit and never
//! change the outcome of the operation.

mod bulk;
mod editor;
mod query;
pub(crate) mod recorder;

use std::sync::Arc;

use sqlx::SqliteConnection;

use khata_core::{CoreError, Customer, Money, Shop};
use khata_db::{CustomerRepository, Database, SaleRepository, ShopRepository};

use crate::analytics::AnalyticsRecorder;
use crate::audit::AuditSink;
use crate::error::LedgerResult;

/// Entry point for ledger operations.
#[derive(Clone)]
pub struct LedgerService {
    db: Database,
    audit: Arc<dyn AuditSink>,
    analytics: AnalyticsRecorder,
}

impl LedgerService {
    pub fn new(db: Database, audit: Arc<dyn AuditSink>, analytics: AnalyticsRecorder) -> Self {
        LedgerService {
            db,
            audit,
            analytics,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn analytics(&self) -> &AnalyticsRecorder {
        &self.analytics
    }
}

// =============================================================================
// Shared Lookups
// =============================================================================

pub(crate) async fn require_shop(conn: &mut SqliteConnection, shop_id: &str) -> LedgerResult<Shop> {
    Ok(ShopRepository::get(conn, shop_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Shop", shop_id))?)
}

pub(crate) async fn require_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> LedgerResult<Customer> {
    Ok(CustomerRepository::get(conn, customer_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Customer", customer_id))?)
}

/// Live balance from the sale log.
pub(crate) async fn balance_in(
    conn: &mut SqliteConnection,
    shop_id: &str,
    customer_id: &str,
) -> LedgerResult<Money> {
    Ok(SaleRepository::totals(conn, shop_id, customer_id)
        .await?
        .balance())
}
