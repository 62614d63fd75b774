//! wallet_ledger Library
//!
//! Double-entry wallet ledger: accounts, atomic transfers under serializable
//! isolation, and per-account payment views over an HTTP API.
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod handlers;
pub mod projection;
pub mod store;

pub use api::build_router;
pub use config::{Config, LogFormat};
pub use domain::{Amount, AmountError, Balance, Currency, OperationContext, Transfer};
pub use error::{AppError, ErrorResponse};
pub use handlers::LedgerError;
pub use store::{InMemoryLedgerStore, LedgerStore, PgLedgerStore, StoreError};
