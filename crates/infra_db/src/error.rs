//! Database error types
//!
//! Maps low-level SQLx failures onto variants the repositories can reason
//! about, and from there onto the invoicing domain's error taxonomy.

use thiserror::Error;

use domain_invoicing::InvoicingError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization failure under concurrent transactions (SQLSTATE 40001)
    #[error("Transaction serialization failure: {0}")]
    SerializationFailure(String),

    /// Stored document could not be decoded
    #[error("Document decode error: {0}")]
    DecodeFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if retrying the transaction may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DatabaseError::SerializationFailure(_) | DatabaseError::PoolExhausted
        )
    }

    /// Conversion for the number-allocation path
    ///
    /// There a unique violation means two transactions raced for the same
    /// `(series_id, number)` pair, so it surfaces as a retryable
    /// `ConcurrencyConflict` rather than a plain store failure.
    pub fn into_allocation_error(self) -> InvoicingError {
        match self {
            DatabaseError::DuplicateEntry(msg) => InvoicingError::ConcurrencyConflict(msg),
            other => other.into(),
        }
    }
}

/// Classifies SQLx errors by PostgreSQL error code
///
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        "40001" => {
                            DatabaseError::SerializationFailure(db_err.message().to_string())
                        }
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

/// Maps database failures onto the invoicing domain's taxonomy
///
/// Serialization failures surface as `ConcurrencyConflict` so callers know a
/// retry is reasonable. Unique violations do not: outside the issuance path
/// a duplicate key (say, re-inserting an owner) is not retryable, so the
/// blanket conversion treats it as a `Store` failure and the issuance path
/// opts in via [`DatabaseError::into_allocation_error`].
impl From<DatabaseError> for InvoicingError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::SerializationFailure(msg) => {
                InvoicingError::ConcurrencyConflict(msg)
            }
            DatabaseError::NotFound(msg) => InvoicingError::InvoiceNotFound(msg),
            other => InvoicingError::store(other.to_string()),
        }
    }
}
