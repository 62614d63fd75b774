//! Domain Error Types
//!
//! Pure validation failures and the error classification shared by every
//! layer. Nothing here depends on storage or HTTP.

use thiserror::Error;

use super::{AmountError, CurrencyError};

/// Boundary classification of every failure the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request (account creation, filters)
    InvalidRequest,
    /// Transfer rejected by a business rule
    InvalidTransfer,
    /// Referenced account absent
    NotFound,
    /// Concurrent conflicting transaction; the only retryable kind
    Conflict,
    /// Storage unreachable or invariant violated
    Internal,
}

/// Failures raised by the validation gate before any storage access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("recipient is same account: {account_id}")]
    SameAccount { account_id: String },

    #[error("invalid transfer amount: {0}")]
    InvalidAmount(AmountError),

    #[error("invalid account id: {reason}")]
    InvalidAccountId { reason: &'static str },

    #[error("invalid initial balance: {0}")]
    InvalidInitialBalance(AmountError),

    #[error(transparent)]
    UnsupportedCurrency(#[from] CurrencyError),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SameAccount { .. } | Self::InvalidAmount(_) => ErrorKind::InvalidTransfer,
            Self::InvalidAccountId { .. }
            | Self::InvalidInitialBalance(_)
            | Self::UnsupportedCurrency(_) => ErrorKind::InvalidRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_transfer_rules_classify_as_invalid_transfer() {
        let same = ValidationError::SameAccount {
            account_id: "alice".to_string(),
        };
        assert_eq!(same.kind(), ErrorKind::InvalidTransfer);
        assert!(same.to_string().contains("same account"));

        let zero = ValidationError::InvalidAmount(AmountError::NotPositive(Decimal::ZERO));
        assert_eq!(zero.kind(), ErrorKind::InvalidTransfer);
        assert!(zero.to_string().contains("non-positive"));
    }

    #[test]
    fn test_account_rules_classify_as_invalid_request() {
        let currency = ValidationError::from(CurrencyError("XYZ".to_string()));
        assert_eq!(currency.kind(), ErrorKind::InvalidRequest);
        assert!(currency.to_string().contains("XYZ"));
    }
}
