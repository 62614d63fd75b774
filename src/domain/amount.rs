//! Monetary primitives
//!
//! `Amount` is what moves in a transfer, `Balance` is what an account holds.
//! Both are exact decimals validated at construction, so a negative balance
//! or a zero-value transfer cannot be represented.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest value either type accepts (1 trillion units)
const MAX_VALUE: i64 = 1_000_000_000_000;

/// Fractional digits allowed, matching the `NUMERIC(28, 8)` columns
pub const MAX_SCALE: u32 = 8;

fn max_value() -> Decimal {
    Decimal::from(MAX_VALUE)
}

/// Errors raised while constructing an [`Amount`] or a [`Balance`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("non-positive amount: {0}")]
    NotPositive(Decimal),

    #[error("negative balance: {0}")]
    Negative(Decimal),

    #[error("too many decimal places (max 8, got {0})")]
    TooManyDecimals(u32),

    #[error("value exceeds maximum of 1000000000000")]
    Overflow,

    #[error("invalid decimal: {0}")]
    Parse(String),
}

/// A strictly positive transfer amount.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use wallet_ledger::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(3050, 2)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(3050, 2));
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        check_bounds(value)?;
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s).map_err(|e| AmountError::Parse(e.to_string()))?;
        Amount::new(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// An account balance: zero or positive, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        check_bounds(value)?;
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn covers(&self, amount: &Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Balance after receiving `amount`; fails if the result passes the maximum.
    pub fn credit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        let sum = self.0.checked_add(amount.value()).ok_or(AmountError::Overflow)?;
        Balance::new(sum)
    }

    /// Balance after paying out `amount`; fails if the result would go negative.
    pub fn debit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        Balance::new(self.0 - amount.value())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Balance::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

fn check_bounds(value: Decimal) -> Result<(), AmountError> {
    // Trailing zeros do not count: 10.000000000 is 10
    let scale = value.normalize().scale();
    if scale > MAX_SCALE {
        return Err(AmountError::TooManyDecimals(scale));
    }
    if value > max_value() {
        return Err(AmountError::Overflow);
    }
    Ok(())
}
