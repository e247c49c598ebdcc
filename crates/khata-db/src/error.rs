//! # Storage Errors
//!
//! `DbError` classifies what SQLite reported so the service layer can tell
//! a missing row or a violated constraint from a broken database. Only
//! [`DbError::NotFound`] reaches the caller as-is; everything else becomes
//! an internal error in `khata-ledger`, with the detail logged there.
//!
//! ```text
//! sqlx::Error                         DbError
//! ───────────────────────────────     ─────────────────────────────
//! RowNotFound                    ──►  NotFound
//! "UNIQUE constraint failed: t.c"──►  UniqueViolation { field: "t.c" }
//! "FOREIGN KEY constraint failed"──►  ForeignKeyViolation
//! "CHECK constraint failed: …"   ──►  CheckViolation
//! ColumnDecode / bad JSON        ──►  Decode
//! PoolTimedOut                   ──►  PoolExhausted
//! PoolClosed                     ──►  ConnectionFailed
//! anything else                  ──►  QueryFailed / Internal
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A second credit entry for one sale, or a repeated offer code in a shop.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A sale, entry or order pointing at a shop, customer or product that
    /// does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Schema-level guard tripped (non-positive amount, negative stock).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value no longer decodes (tags JSON, unknown enum text).
    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Classifies a database-reported failure by SQLite's message text.
    fn from_sqlite_message(message: &str) -> Self {
        if let Some(field) = message.strip_prefix("UNIQUE constraint failed: ") {
            return DbError::duplicate(field, "?");
        }
        if message.starts_with("FOREIGN KEY constraint failed") {
            return DbError::ForeignKeyViolation {
                message: message.to_string(),
            };
        }
        if message.starts_with("CHECK constraint failed") {
            return DbError::CheckViolation {
                message: message.to_string(),
            };
        }
        DbError::QueryFailed(message.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::Decode(format!("column {index}: {source}"))
            }
            sqlx::Error::Decode(source) => DbError::Decode(source.to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Decode(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_messages_are_classified() {
        assert!(matches!(
            DbError::from_sqlite_message("UNIQUE constraint failed: credit_entries.sale_id"),
            DbError::UniqueViolation { ref field, .. } if field == "credit_entries.sale_id"
        ));
        assert!(matches!(
            DbError::from_sqlite_message("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            DbError::from_sqlite_message("CHECK constraint failed: stock >= 0"),
            DbError::CheckViolation { .. }
        ));
        assert!(matches!(
            DbError::from_sqlite_message("database is locked"),
            DbError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
    }
}
