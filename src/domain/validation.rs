//! Validation gate
//!
//! Stateless checks run before a transaction is opened. A request that fails
//! here never reaches storage.

use rust_decimal::Decimal;

use super::account::MAX_ACCOUNT_ID_LEN;
use super::{Amount, Balance, Currency, NewAccount, ValidationError};

/// A transfer request that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTransfer {
    pub from: String,
    pub to: String,
    pub amount: Amount,
}

pub fn validate_transfer(
    from: &str,
    to: &str,
    amount: Decimal,
) -> Result<ValidTransfer, ValidationError> {
    if from == to {
        return Err(ValidationError::SameAccount {
            account_id: from.to_string(),
        });
    }

    let amount = Amount::new(amount).map_err(ValidationError::InvalidAmount)?;

    Ok(ValidTransfer {
        from: from.to_string(),
        to: to.to_string(),
        amount,
    })
}

pub fn validate_new_account(
    id: &str,
    initial_balance: Decimal,
    currency: &str,
) -> Result<NewAccount, ValidationError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::InvalidAccountId { reason: "empty" });
    }
    if id.chars().count() > MAX_ACCOUNT_ID_LEN {
        return Err(ValidationError::InvalidAccountId {
            reason: "longer than 64 characters",
        });
    }

    let currency: Currency = currency.parse()?;
    let initial_balance =
        Balance::new(initial_balance).map_err(ValidationError::InvalidInitialBalance)?;

    Ok(NewAccount {
        id: id.to_string(),
        initial_balance,
        currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AmountError, ErrorKind};
    use rust_decimal_macros::dec;

    #[test]
    fn test_self_transfer_rejected() {
        let err = validate_transfer("alice", "alice", dec!(10)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::SameAccount {
                account_id: "alice".to_string()
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidTransfer);
    }

    #[test]
    fn test_self_transfer_checked_before_amount() {
        let err = validate_transfer("alice", "alice", dec!(-5)).unwrap_err();
        assert!(matches!(err, ValidationError::SameAccount { .. }));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for amount in [Decimal::ZERO, dec!(-30)] {
            let err = validate_transfer("alice", "bob", amount).unwrap_err();
            assert!(matches!(
                err,
                ValidationError::InvalidAmount(AmountError::NotPositive(_))
            ));
        }
    }

    #[test]
    fn test_valid_transfer_passes() {
        let valid = validate_transfer("alice", "bob", dec!(30)).unwrap();
        assert_eq!(valid.from, "alice");
        assert_eq!(valid.to, "bob");
        assert_eq!(valid.amount.value(), dec!(30));
    }

    #[test]
    fn test_new_account_validation() {
        let account = validate_new_account(" alice ", dec!(100), "USD").unwrap();
        assert_eq!(account.id, "alice");
        assert_eq!(account.initial_balance.value(), dec!(100));
        assert_eq!(account.currency.code(), "USD");

        let err = validate_new_account("alice", dec!(100), "ABC").unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedCurrency(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        assert!(matches!(
            validate_new_account("", dec!(1), "USD"),
            Err(ValidationError::InvalidAccountId { .. })
        ));
        assert!(matches!(
            validate_new_account(&"x".repeat(65), dec!(1), "USD"),
            Err(ValidationError::InvalidAccountId { .. })
        ));
        assert!(matches!(
            validate_new_account("alice", dec!(-1), "USD"),
            Err(ValidationError::InvalidInitialBalance(_))
        ));
    }

    #[test]
    fn test_zero_initial_balance_allowed() {
        assert!(validate_new_account("carol", Decimal::ZERO, "EUR").is_ok());
    }
}
