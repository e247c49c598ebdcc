//! # khata-core: Pure Business Logic for Khata
//!
//! The ledger rules for shop credit ("udhaar") bookkeeping and order
//! settlement, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            API collaborator (HTTP, auth, exports)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    khata-ledger (services)                      │   │
//! │  │    LedgerService, OrderService, analytics queue, audit sink    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │   order   │  │   │
//! │  │   │   Sale    │  │   Money   │  │  balance  │  │  pricing  │  │   │
//! │  │   │  Credit   │  │  (paise)  │  │  limits   │  │  offers   │  │   │
//! │  │   │  Order    │  │           │  │  edits    │  │  statuses │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    khata-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, CreditEntry, Order, requests, queries)
//! - [`money`] - Money type with integer paise arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules applied before any mutation
//! - [`ledger`] - Balance fold, credit limit, payment allocation, edit planning
//! - [`order`] - Line pricing, offers, delivery, totals, status machine
//!
//! ## Example Usage
//!
//! ```rust
//! use khata_core::ledger::check_credit_limit;
//! use khata_core::{CoreError, Money};
//!
//! // Customer owes ₹800 against a ₹1000 limit
//! let balance: Money = "800".parse().unwrap();
//! let limit = Some(Money::from_rupees(1000));
//!
//! let err = check_credit_limit(balance, limit, Money::from_rupees(300)).unwrap_err();
//! assert!(matches!(err, CoreError::CreditLimitExceeded { .. }));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, OfferRejection, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest single amount accepted (₹1 crore).
pub const MAX_AMOUNT_PAISE: i64 = 1_000_000_000;

/// Maximum lines allowed in a single order
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single order line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of free-text sale notes.
pub const MAX_NOTES_LEN: usize = 500;

/// Maximum ids in one bulk update or delete.
pub const MAX_BULK_IDS: usize = 500;

/// Default and maximum page size for sales listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;
