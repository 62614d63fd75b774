//! Transfers and their per-account projection
//!
//! A `Transfer` is an immutable ledger row. A `Payment` is the same row seen
//! from one of the two accounts it touches; it is computed on read and never
//! stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Amount, Currency};

/// A committed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub from: String,
    pub to: String,
    pub currency: Currency,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

/// Row the executor appends to the ledger; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub from: String,
    pub to: String,
    pub currency: Currency,
    pub amount: Amount,
}

/// Ledger entry direction relative to the viewing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// A transfer seen from one account's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub account: String,
    pub counterparty: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub direction: Direction,
    pub transfer_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Project `transfer` onto `account`. Returns `None` when the account is
    /// neither side of the transfer.
    pub fn project(account: &str, transfer: &Transfer) -> Option<Self> {
        let (direction, counterparty) = if transfer.from == account {
            (Direction::Outgoing, &transfer.to)
        } else if transfer.to == account {
            (Direction::Incoming, &transfer.from)
        } else {
            return None;
        };

        Some(Self {
            account: account.to_string(),
            counterparty: counterparty.clone(),
            amount: transfer.amount.value(),
            currency: transfer.currency,
            direction,
            transfer_id: transfer.id,
            created_at: transfer.created_at,
        })
    }
}

/// Filter for the raw ledger listing.
///
/// `from` and `to` are OR-ed: a row matches if either id filter matches.
/// `currency`, `since` (inclusive) and `until` (exclusive) always narrow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub currency: Option<Currency>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TransferFilter {
    /// Every transfer touching `account`, either side.
    pub fn touching(account: &str) -> Self {
        Self {
            from: Some(account.to_string()),
            to: Some(account.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, transfer: &Transfer) -> bool {
        let id_match = match (&self.from, &self.to) {
            (None, None) => true,
            (from, to) => {
                from.as_deref() == Some(transfer.from.as_str())
                    || to.as_deref() == Some(transfer.to.as_str())
            }
        };

        id_match
            && self.currency.map_or(true, |c| c == transfer.currency)
            && self.since.map_or(true, |since| transfer.created_at >= since)
            && self.until.map_or(true, |until| transfer.created_at < until)
    }
}

/// Optional narrowing of an account's payment list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub counterparty: Option<String>,
    pub currency: Option<Currency>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}
