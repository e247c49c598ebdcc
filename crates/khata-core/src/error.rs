//! # Error Types
//!
//! Domain-specific error types for khata-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  khata-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger and order rule violations               │
//! │  ├── ValidationError  - Input validation failures (field-level)        │
//! │  └── OfferRejection   - Why a discount code could not be redeemed      │
//! │                                                                         │
//! │  khata-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  khata-ledger errors                                                   │
//! │  └── LedgerError      - What the API collaborator sees                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                   │
//! │                          DbError ───┴→ LedgerError → API (404/400/500)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant except [`CoreError::NotFound`] is a client error (400
/// equivalent). None of them is raised after a mutating statement has run.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Shop, customer, sale, order, product or offer does not exist
    /// (or is not visible to the requesting shop).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A CREDIT sale would push the customer past their credit limit.
    ///
    /// ## User Workflow
    /// ```text
    /// Customer limit ₹1000, owes ₹800
    ///      │
    ///      ▼
    /// recordSale(₹300, CREDIT)
    ///      │
    ///      ▼
    /// CreditLimitExceeded { current: ₹800, limit: ₹1000,
    ///                       projected: ₹1100, overage: ₹100 }
    ///      │
    ///      ▼
    /// UI: "₹100 over limit. Record anyway?" → retry with bypass
    /// ```
    #[error(
        "Credit limit exceeded: balance {current_balance}, limit {limit}, \
         projected {projected} (over by {overage})"
    )]
    CreditLimitExceeded {
        current_balance: Money,
        limit: Money,
        projected: Money,
        overage: Money,
    },

    /// The operation contradicts the current state of a record
    /// (settled credit entry, unverified order, illegal edit path).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Order status change not allowed by the state machine.
    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Insufficient stock to fulfil an order line.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Discount code exists but cannot be applied to this cart.
    #[error("Offer {code} cannot be applied: {reason}")]
    OfferInvalid { code: String, reason: OfferRejection },

    /// One or more items of an all-or-nothing batch failed.
    #[error("{} of the requested changes failed: {}", failures.len(), failures.join("; "))]
    BulkFailed { failures: Vec<String> },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }
}

// =============================================================================
// Offer Rejection
// =============================================================================

/// Reasons an offer code is refused at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OfferRejection {
    #[error("offer is no longer active")]
    Inactive,

    #[error("offer is not valid yet")]
    NotStarted,

    #[error("offer has expired")]
    Expired,

    #[error("offer usage limit reached")]
    UsageLimitReached,

    #[error("minimum order value is {minimum}")]
    BelowMinimum { minimum: Money },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any statement touches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid amount string).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// The name of the offending field, for field-level error display.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_limit_message() {
        let err = CoreError::CreditLimitExceeded {
            current_balance: Money::from_rupees(800),
            limit: Money::from_rupees(1000),
            projected: Money::from_rupees(1100),
            overage: Money::from_rupees(100),
        };
        assert_eq!(
            err.to_string(),
            "Credit limit exceeded: balance ₹800.00, limit ₹1000.00, projected ₹1100.00 (over by ₹100.00)"
        );
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product: "Atta 5kg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Atta 5kg: available 3, requested 5"
        );
    }

    #[test]
    fn test_bulk_failed_message() {
        let err = CoreError::BulkFailed {
            failures: vec!["sale a: boom".to_string(), "sale b: bang".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "2 of the requested changes failed: sale a: boom; sale b: bang"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_id".to_string(),
        };
        assert_eq!(validation_err.field(), "customer_id");
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
