//! # khata-db: Database Layer for Khata
//!
//! SQLite storage for the ledger, the open-credit index, the catalog,
//! offers, orders, the audit log and daily analytics.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata Data Flow                                  │
//! │                                                                         │
//! │  LedgerService::record_sale / OrderService::create_order               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     khata-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │ begin()  ─────┼───►│ CreditRepo    │    │ 001_initial_ │  │   │
//! │  │   │ acquire()     │    │ OrderRepo ... │    │   schema.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) - khata.db                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use khata_db::{Database, DbConfig, SaleRepository};
//!
//! let db = Database::new(DbConfig::new("khata.db")).await?;
//! let mut conn = db.acquire().await?;
//! let totals = SaleRepository::totals(&mut conn, &shop_id, &customer_id).await?;
//! println!("balance: {}", totals.balance());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    AnalyticsRepository, AuditRepository, CreditRepository, CustomerRepository, OfferRepository,
    OrderRepository, ProductRepository, SaleRepository, ShopRepository,
};
