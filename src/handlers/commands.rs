//! Command definitions
//!
//! Commands carry raw caller input into the handlers, which run them through
//! the validation gate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command to open a wallet account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub id: String,
    pub initial_balance: Decimal,
    pub currency: String,
}

impl CreateAccountCommand {
    pub fn new(id: impl Into<String>, initial_balance: Decimal, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial_balance,
            currency: currency.into(),
        }
    }
}

/// Command to move value from one account to another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

impl TransferCommand {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Decimal) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}
