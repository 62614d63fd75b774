//! Account Handler
//!
//! Opens, fetches and lists wallet accounts.

use crate::domain::{validate_new_account, Account, Currency, OperationContext, ValidationError};
use crate::store::LedgerStore;

use super::{CreateAccountCommand, LedgerError};

pub struct AccountHandler<S> {
    store: S,
}

impl<S: LedgerStore> AccountHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Open an account with its initial balance
    pub async fn create(
        &self,
        command: CreateAccountCommand,
        context: &OperationContext,
    ) -> Result<Account, LedgerError> {
        let new_account =
            validate_new_account(&command.id, command.initial_balance, &command.currency)?;

        let account = self.store.insert_account(new_account).await?;

        tracing::info!(
            account_id = %account.id,
            currency = %account.currency,
            balance = %account.balance,
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            "account created"
        );

        Ok(account)
    }

    pub async fn get(&self, id: &str) -> Result<Account, LedgerError> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    /// List accounts, optionally only those in `currency`
    pub async fn list(&self, currency: Option<&str>) -> Result<Vec<Account>, LedgerError> {
        let currency = currency
            .map(|code| code.parse::<Currency>().map_err(ValidationError::from))
            .transpose()?;

        Ok(self.store.list_accounts(currency).await?)
    }
}
