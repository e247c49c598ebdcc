//! # khata-ledger: Ledger & Order Settlement Services
//!
//! The operations an API layer calls: record sales and payments, read
//! balances, edit and delete transactions, and run orders from cart to
//! collection.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           KhataServices                                 │
//! │                                                                         │
//! │  ┌──────────────────────┐            ┌──────────────────────────────┐  │
//! │  │    OrderService      │──collect──►│        LedgerService          │  │
//! │  │                      │            │                              │  │
//! │  │ create_order         │            │ record_sale / record_payment │  │
//! │  │ update_order_status  │            │ update_transaction           │  │
//! │  │ verify_order_price   │            │ bulk_update / delete_*       │  │
//! │  │ update_order_items   │            │ get_balance / get_all_sales  │  │
//! │  └──────────┬───────────┘            └──────┬─────────────┬─────────┘  │
//! │             │ OfferRedeemer                 │ AuditSink   │            │
//! │             ▼                               ▼             ▼            │
//! │  ┌─────────────────────────────────────────────┐  ┌────────────────┐  │
//! │  │   khata-db (SQLite, one tx per operation)   │◄─│ Analytics      │  │
//! │  └─────────────────────────────────────────────┘  │ worker (mpsc)  │  │
//! │                                                   └────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`ledger`] - `LedgerService`: balance, recording, edits, bulk, queries
//! - [`orders`] - `OrderService`: cart → order → collected sale
//! - [`offers`] - Offer redemption seam
//! - [`audit`] - Audit sink seam
//! - [`analytics`] - Fire-and-forget daily counters
//! - [`config`] - `LedgerConfig` (TOML + env)
//! - [`error`] - `LedgerError` and its API mapping

pub mod analytics;
pub mod audit;
pub mod config;
pub mod error;
pub mod ledger;
pub mod offers;
pub mod orders;

use std::sync::Arc;

use tracing::info;

use khata_db::Database;

pub use analytics::AnalyticsRecorder;
pub use audit::{AuditSink, DbAuditSink};
pub use config::LedgerConfig;
pub use error::{ErrorCode, ErrorResponse, LedgerError, LedgerResult};
pub use ledger::LedgerService;
pub use offers::{OfferRedeemer, SqliteOfferRedeemer};
pub use orders::OrderService;

/// Everything wired together from one [`LedgerConfig`].
#[derive(Clone)]
pub struct KhataServices {
    pub db: Database,
    pub ledger: LedgerService,
    pub orders: OrderService,
    pub analytics: AnalyticsRecorder,
}

impl KhataServices {
    /// Opens the database (running migrations), starts the analytics
    /// worker and builds the services with the SQLite-backed seams.
    pub async fn start(config: &LedgerConfig) -> LedgerResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Self::with_database(db, config))
    }

    /// Builds the services on an existing database.
    pub fn with_database(db: Database, config: &LedgerConfig) -> Self {
        let analytics = AnalyticsRecorder::start(db.clone(), config.analytics.clone());
        let audit: Arc<dyn AuditSink> = Arc::new(DbAuditSink::new(db.clone()));
        let ledger = LedgerService::new(db.clone(), audit, analytics.clone());
        let orders = OrderService::new(
            ledger.clone(),
            Arc::new(SqliteOfferRedeemer),
            config.orders.clone(),
        );

        info!(
            delivery_charge = %config.orders.delivery_charge(),
            pickup_eta_minutes = config.orders.pickup_eta_minutes,
            "Khata services ready"
        );

        KhataServices {
            db,
            ledger,
            orders,
            analytics,
        }
    }

    /// Drains pending analytics and closes the pool.
    pub async fn shutdown(&self) -> LedgerResult<()> {
        self.analytics.shutdown().await?;
        self.db.close().await;
        Ok(())
    }
}
