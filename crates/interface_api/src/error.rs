//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_invoicing::InvoicingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string())
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Maps domain errors onto HTTP semantics
///
/// Missing entities become 404, lifecycle violations and allocation races
/// 409, input problems 422, and store failures 500.
impl From<InvoicingError> for ApiError {
    fn from(err: InvoicingError) -> Self {
        match &err {
            InvoicingError::SeriesNotFound(_)
            | InvoicingError::InvoiceNotFound(_)
            | InvoicingError::OwnerNotFound(_)
            | InvoicingError::OriginalNotFound(_) => ApiError::NotFound(err.to_string()),
            InvoicingError::InvalidState(_)
            | InvoicingError::InvoiceLocked(_)
            | InvoicingError::OriginalNotIssued(_)
            | InvoicingError::ConcurrencyConflict(_) => ApiError::Conflict(err.to_string()),
            InvoicingError::Validation(_) | InvoicingError::EmptyLineItems => {
                ApiError::Validation(err.to_string())
            }
            InvoicingError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}
