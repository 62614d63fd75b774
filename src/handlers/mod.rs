//! Command Handlers module
//!
//! Handlers that validate caller input and drive the ledger store: the
//! transfer executor and the account service.

mod account_handler;
mod commands;
mod error;
mod transfer_handler;


pub use account_handler::AccountHandler;
pub use commands::*;
pub use error::LedgerError;
pub use transfer_handler::TransferHandler;
