//! # Repository Module
//!
//! Database repository implementations for Khata.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Connection-Passing Repositories                      │
//! │                                                                         │
//! │  khata-ledger service                                                  │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  SaleRepository::insert(&mut tx, &sale).await?;                │
//! │       │  CreditRepository::insert(&mut tx, &entry).await?;             │
//! │       │  tx.commit().await?;                                           │
//! │       ▼                                                                 │
//! │  Repositories own the SQL, never the transaction boundary.             │
//! │  Every method takes `&mut SqliteConnection`, which both a pooled       │
//! │  connection and an open transaction deref to.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ShopRepository`], [`CustomerRepository`] - identities
//! - [`ProductRepository`] - catalog and guarded stock updates
//! - [`SaleRepository`] - the ledger log, balance aggregation, listings
//! - [`CreditRepository`] - the open-credit index
//! - [`OfferRepository`] - discount codes and guarded usage counting
//! - [`OrderRepository`] - orders and their lines
//! - [`AuditRepository`] - audit log
//! - [`AnalyticsRepository`] - per-shop daily counters

use sqlx::{QueryBuilder, Sqlite};

pub mod analytics;
pub mod audit;
pub mod credit;
pub mod customer;
pub mod offer;
pub mod order;
pub mod product;
pub mod sale;
pub mod shop;

pub use analytics::AnalyticsRepository;
pub use audit::AuditRepository;
pub use credit::CreditRepository;
pub use customer::CustomerRepository;
pub use offer::OfferRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
pub use shop::ShopRepository;

/// Appends `(?, ?, ...)` with one bind per id.
pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[String]) {
    qb.push("(");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
}
