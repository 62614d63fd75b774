//! Domain module
//!
//! Core ledger types and the validation gate.

pub mod account;
pub mod amount;
pub mod context;
pub mod currency;
pub mod error;
pub mod transfer;
pub mod validation;

pub use account::{Account, AccountSnapshot, NewAccount};
pub use amount::{Amount, AmountError, Balance};
pub use context::OperationContext;
pub use currency::{Currency, CurrencyError, SUPPORTED_CURRENCIES};
pub use error::{ErrorKind, ValidationError};
pub use transfer::{Direction, NewTransfer, Payment, PaymentFilter, Transfer, TransferFilter};
pub use validation::{validate_new_account, validate_transfer, ValidTransfer};
