//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{ErrorKind, ValidationError};
use crate::handlers::LedgerError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Malformed input caught at the HTTP boundary (query strings, bodies)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Ledger(LedgerError::Invalid(err))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest | ErrorKind::InvalidTransfer => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ledger_error_code(err: &LedgerError) -> &'static str {
    match err {
        LedgerError::Invalid(invalid) => match invalid {
            ValidationError::SameAccount { .. } => "same_account_transfer",
            ValidationError::InvalidAmount(_) => "invalid_amount",
            ValidationError::InvalidAccountId { .. } => "invalid_account_id",
            ValidationError::InvalidInitialBalance(_) => "invalid_initial_balance",
            ValidationError::UnsupportedCurrency(_) => "unsupported_currency",
        },
        LedgerError::AccountNotFound(_) => "account_not_found",
        LedgerError::AccountExists(_) => "account_exists",
        LedgerError::CurrencyMismatch { .. } => "currency_mismatch",
        LedgerError::InsufficientFunds { .. } => "insufficient_funds",
        LedgerError::BalanceOverflow { .. } => "balance_overflow",
        LedgerError::SerializationConflict => "serialization_conflict",
        LedgerError::Storage(_) => "storage_error",
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Ledger(LedgerError::AccountExists(_)) => StatusCode::CONFLICT,
            AppError::Ledger(err) => status_for(err.kind()),
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, details) = match &self {
            AppError::Ledger(err) => {
                let details = match err {
                    LedgerError::AccountNotFound(id) | LedgerError::AccountExists(id) => {
                        Some(id.clone())
                    }
                    LedgerError::SerializationConflict => {
                        Some("concurrent transfer won; the request may be retried".to_string())
                    }
                    LedgerError::Storage(e) => {
                        tracing::error!(error = ?e, "Storage error");
                        None
                    }
                    _ => None,
                };
                (ledger_error_code(err), details)
            }
            AppError::InvalidRequest(msg) => ("invalid_request", Some(msg.clone())),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("internal_error", None)
            }
        };

        // Storage failures keep their detail in the log only
        let error = match &self {
            AppError::Ledger(LedgerError::Storage(_)) => "storage error".to_string(),
            AppError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_follows_error_kind() {
        let cases = [
            (
                AppError::from(LedgerError::InsufficientFunds {
                    account_id: "alice".to_string(),
                    required: dec!(10),
                    available: dec!(1),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(ValidationError::SameAccount {
                    account_id: "alice".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(LedgerError::AccountNotFound("ghost".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(LedgerError::SerializationConflict),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(LedgerError::AccountExists("alice".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(LedgerError::from(StoreError::Unavailable("down".to_string()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::InvalidRequest("bad since".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{}", err);
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ledger_error_code(&LedgerError::AccountExists("a".to_string())),
            "account_exists"
        );
        assert_eq!(
            ledger_error_code(&LedgerError::SerializationConflict),
            "serialization_conflict"
        );
        assert_eq!(
            ledger_error_code(&LedgerError::Invalid(ValidationError::SameAccount {
                account_id: "a".to_string()
            })),
            "same_account_transfer"
        );
    }
}
