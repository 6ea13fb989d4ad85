//! Invoicing domain errors
//!
//! The taxonomy mirrors what callers need to distinguish: missing entities,
//! lifecycle violations, input validation, and (rare) concurrency conflicts
//! surfaced by the store.

use thiserror::Error;

/// Errors that can occur in the invoicing domain
#[derive(Debug, Error)]
pub enum InvoicingError {
    /// Series does not exist or is not owned by the calling tenant
    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    /// Invoice does not exist or is not owned by the calling tenant
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Recipient does not exist in the calling tenant's owner directory
    #[error("Owner not found: {0}")]
    OwnerNotFound(String),

    /// Rectification target does not exist
    #[error("Original invoice not found: {0}")]
    OriginalNotFound(String),

    /// Rectification target has not been issued; drafts are edited directly
    #[error("Original invoice is not issued: {0}")]
    OriginalNotIssued(String),

    /// Operation attempted in the wrong lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Mutation attempted on an issued (frozen) invoice
    #[error("Invoice is locked: {0}")]
    InvoiceLocked(String),

    /// A draft requires at least one line item
    #[error("Invoice must have at least one line item")]
    EmptyLineItems,

    /// Input validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// The atomic number allocation failed; the caller should retry issuance
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Underlying store failure
    #[error("Store error: {0}")]
    Store(String),
}

impl InvoicingError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        InvoicingError::Validation(message.into())
    }

    /// Creates an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        InvoicingError::InvalidState(message.into())
    }

    /// Creates a store error
    pub fn store(message: impl Into<String>) -> Self {
        InvoicingError::Store(message.into())
    }

    /// Returns true if the error indicates a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            InvoicingError::SeriesNotFound(_)
                | InvoicingError::InvoiceNotFound(_)
                | InvoicingError::OwnerNotFound(_)
                | InvoicingError::OriginalNotFound(_)
        )
    }

    /// Returns true if the error indicates a lifecycle violation
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            InvoicingError::InvalidState(_)
                | InvoicingError::InvoiceLocked(_)
                | InvoicingError::OriginalNotIssued(_)
        )
    }

    /// Returns true if retrying the whole operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, InvoicingError::ConcurrencyConflict(_))
    }
}

impl From<core_kernel::MoneyError> for InvoicingError {
    fn from(err: core_kernel::MoneyError) -> Self {
        InvoicingError::Validation(err.to_string())
    }
}
