//! Store Errors
//!
//! Error types for ledger storage operations.

/// Postgres SQLSTATE for `serialization_failure`
const SERIALIZATION_FAILURE: &str = "40001";

/// Postgres SQLSTATE for `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";

/// Postgres SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur in a ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A concurrent transaction touched the same rows; the whole unit of
    /// work was rolled back and may be retried
    #[error("serialization conflict with a concurrent transaction")]
    SerializationConflict,

    /// Account id already taken
    #[error("account already exists: {0}")]
    DuplicateAccount(String),

    /// A stored row breaks a ledger invariant
    #[error("ledger invariant violated: {0}")]
    Invariant(String),

    /// Store unreachable or failing
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_serialization_conflict(&self) -> bool {
        matches!(self, StoreError::SerializationConflict)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match sqlstate(&err).as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => StoreError::SerializationConflict,
            _ => StoreError::Database(err),
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}
