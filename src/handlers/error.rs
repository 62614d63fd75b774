//! Ledger errors
//!
//! Every failure the transfer executor, account service and ledger
//! projection report to their callers.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{Currency, ErrorKind, ValidationError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Rejected by the validation gate; storage was never touched
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("currency mismatch: {from_account} holds {from_currency}, {to_account} holds {to_currency}")]
    CurrencyMismatch {
        from_account: String,
        from_currency: Currency,
        to_account: String,
        to_currency: Currency,
    },

    #[error("insufficient funds in {account_id}: required {required}, available {available}")]
    InsufficientFunds {
        account_id: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("balance of {account_id} would exceed the maximum")]
    BalanceOverflow { account_id: String },

    /// A concurrent transaction won; retrying the whole operation is safe
    #[error("serialization conflict with a concurrent transfer")]
    SerializationConflict,

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SerializationConflict => LedgerError::SerializationConflict,
            StoreError::DuplicateAccount(id) => LedgerError::AccountExists(id),
            other => LedgerError::Storage(other),
        }
    }
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(err) => err.kind(),
            Self::AccountExists(_) => ErrorKind::InvalidRequest,
            Self::CurrencyMismatch { .. }
            | Self::InsufficientFunds { .. }
            | Self::BalanceOverflow { .. } => ErrorKind::InvalidTransfer,
            Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::SerializationConflict => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Only serialization conflicts are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}
