//! # Ledger Error Type
//!
//! The one error type every service operation returns, and its mapping to
//! what the API collaborator answers.
//!
//! ## Error Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Source                              code                   status     │
//! │  ───────────────────────────────     ─────────────────────  ──────     │
//! │  CoreError::NotFound                 NOT_FOUND              404        │
//! │  DbError::NotFound                   NOT_FOUND              404        │
//! │  CoreError::Validation               VALIDATION_ERROR       400        │
//! │  CoreError::CreditLimitExceeded      CREDIT_LIMIT_EXCEEDED  400        │
//! │  CoreError::Conflict                 CONFLICT               400        │
//! │  CoreError::InvalidStatusTransition  CONFLICT               400        │
//! │  CoreError::InsufficientStock        INSUFFICIENT_STOCK     400        │
//! │  CoreError::OfferInvalid             OFFER_INVALID          400        │
//! │  CoreError::BulkFailed               BULK_FAILED            400        │
//! │  DbError (anything else)             INTERNAL_ERROR         500        │
//! │  Config                              INTERNAL_ERROR         500        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Storage details are logged by [`LedgerError::to_response`] and replaced
//! with a generic message.

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use khata_core::{CoreError, ValidationError};
use khata_db::DbError;

/// Errors returned by khata-ledger services.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A domain rule rejected the request. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration could not be loaded or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Database(DbError::from(err))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LedgerError {
    fn from(err: toml::ser::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    CreditLimitExceeded,
    Conflict,
    InsufficientStock,
    OfferInvalid,
    BulkFailed,
    InternalError,
}

/// What the API collaborator sends back.
///
/// ```json
/// {
///   "code": "CREDIT_LIMIT_EXCEEDED",
///   "message": "Credit limit exceeded: ...",
///   "details": { "currentBalance": "800.00", "limit": "1000.00",
///                "projected": "1100.00", "overage": "100.00" }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LedgerError {
    /// HTTP-equivalent status.
    pub fn status_code(&self) -> u16 {
        match self {
            LedgerError::Core(CoreError::NotFound { .. })
            | LedgerError::Database(DbError::NotFound { .. }) => 404,
            LedgerError::Core(_) => 400,
            LedgerError::Database(_) | LedgerError::Config(_) => 500,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Core(err) => match err {
                CoreError::NotFound { .. } => ErrorCode::NotFound,
                CoreError::Validation(_) => ErrorCode::ValidationError,
                CoreError::CreditLimitExceeded { .. } => ErrorCode::CreditLimitExceeded,
                CoreError::Conflict(_) | CoreError::InvalidStatusTransition { .. } => {
                    ErrorCode::Conflict
                }
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::OfferInvalid { .. } => ErrorCode::OfferInvalid,
                CoreError::BulkFailed { .. } => ErrorCode::BulkFailed,
            },
            LedgerError::Database(DbError::NotFound { .. }) => ErrorCode::NotFound,
            LedgerError::Database(_) | LedgerError::Config(_) => ErrorCode::InternalError,
        }
    }

    /// True if the caller sent a bad request (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Builds the response body. Internal details are logged here and
    /// never returned.
    pub fn to_response(&self) -> ErrorResponse {
        if !self.is_client_error() {
            error!(error = %self, "Internal error");
            return ErrorResponse {
                code: ErrorCode::InternalError,
                message: "Internal error".to_string(),
                details: None,
            };
        }

        let details = match self {
            LedgerError::Core(CoreError::Validation(err)) => Some(json!({ "field": err.field() })),
            LedgerError::Core(CoreError::CreditLimitExceeded {
                current_balance,
                limit,
                projected,
                overage,
            }) => Some(json!({
                "currentBalance": current_balance.to_decimal_string(),
                "limit": limit.to_decimal_string(),
                "projected": projected.to_decimal_string(),
                "overage": overage.to_decimal_string(),
            })),
            LedgerError::Core(CoreError::InsufficientStock {
                product,
                available,
                requested,
            }) => Some(json!({
                "product": product,
                "available": available,
                "requested": requested,
            })),
            LedgerError::Core(CoreError::BulkFailed { failures }) => {
                Some(json!({ "failures": failures }))
            }
            _ => None,
        };

        ErrorResponse {
            code: self.code(),
            message: self.to_string(),
            details,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use khata_core::Money;

    #[test]
    fn test_status_codes() {
        let not_found: LedgerError = CoreError::not_found("Sale", "s1").into();
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.code(), ErrorCode::NotFound);

        let conflict: LedgerError = CoreError::InvalidStatusTransition {
            from: "READY".to_string(),
            to: "PENDING".to_string(),
        }
        .into();
        assert_eq!(conflict.status_code(), 400);
        assert_eq!(conflict.code(), ErrorCode::Conflict);

        let db: LedgerError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(db.status_code(), 500);
        assert!(!db.is_client_error());
    }

    #[test]
    fn test_credit_limit_response_details() {
        let err: LedgerError = CoreError::CreditLimitExceeded {
            current_balance: Money::from_rupees(800),
            limit: Money::from_rupees(1000),
            projected: Money::from_rupees(1100),
            overage: Money::from_rupees(100),
        }
        .into();

        let response = err.to_response();
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["code"], "CREDIT_LIMIT_EXCEEDED");
        assert_eq!(body["details"]["overage"], "100.00");
        assert_eq!(body["details"]["currentBalance"], "800.00");
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err: LedgerError = DbError::QueryFailed("no such table: sales".to_string()).into();
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::InternalError);
        assert!(!response.message.contains("sales"));
    }

    #[test]
    fn test_validation_carries_field() {
        let err: LedgerError = ValidationError::Required {
            field: "edit_reason".to_string(),
        }
        .into();
        let body = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(body["details"]["field"], "edit_reason");
    }
}
