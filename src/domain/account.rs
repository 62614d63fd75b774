//! Wallet accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Balance, Currency};

/// Longest accepted account id, matching `accounts.id VARCHAR(64)`
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

/// A wallet account as stored in the account table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub balance: Balance,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated request to open an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub id: String,
    pub initial_balance: Balance,
    pub currency: Currency,
}

/// The part of an account row the transfer executor reads inside its
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub balance: Balance,
    pub currency: Currency,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            balance: account.balance,
            currency: account.currency,
        }
    }
}
