//! Transfer Handler
//!
//! The transfer executor: one atomic double-entry movement per call.

use crate::domain::{
    validate_transfer, AccountSnapshot, NewTransfer, OperationContext, Transfer, ValidTransfer,
};
use crate::store::{LedgerStore, LedgerTx};

use super::{LedgerError, TransferCommand};

/// Executes transfers against a [`LedgerStore`].
///
/// There is no in-process locking: two transfers touching the same account
/// are ordered by the store's serializable isolation, and the loser gets
/// [`LedgerError::SerializationConflict`]. The handler never retries.
pub struct TransferHandler<S> {
    store: S,
}

impl<S: LedgerStore> TransferHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Execute the transfer command
    pub async fn execute(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> Result<Transfer, LedgerError> {
        let request = validate_transfer(&command.from, &command.to, command.amount)?;

        let mut tx = self.store.begin_serializable().await?;

        let transfer = match Self::apply(&mut tx, &request).await {
            Ok(transfer) => transfer,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        error = %rollback_err,
                        original_error = %err,
                        from = %request.from,
                        to = %request.to,
                        "transfer rollback failed"
                    );
                }
                log_rejection(&err, &request, context);
                return Err(err);
            }
        };

        if let Err(err) = tx.commit().await {
            let err = LedgerError::from(err);
            log_rejection(&err, &request, context);
            return Err(err);
        }

        tracing::info!(
            transfer_id = transfer.id,
            from = %transfer.from,
            to = %transfer.to,
            amount = %transfer.amount,
            currency = %transfer.currency,
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            "transfer committed"
        );

        Ok(transfer)
    }

    /// Steps inside the transaction. Every check uses the balances read here,
    /// never anything observed before the transaction began.
    async fn apply(tx: &mut S::Tx, request: &ValidTransfer) -> Result<Transfer, LedgerError> {
        let from = read_existing(tx, &request.from).await?;
        let to = read_existing(tx, &request.to).await?;

        if from.currency != to.currency {
            return Err(LedgerError::CurrencyMismatch {
                from_account: request.from.clone(),
                from_currency: from.currency,
                to_account: request.to.clone(),
                to_currency: to.currency,
            });
        }

        let insufficient = || LedgerError::InsufficientFunds {
            account_id: request.from.clone(),
            required: request.amount.value(),
            available: from.balance.value(),
        };
        if !from.balance.covers(&request.amount) {
            return Err(insufficient());
        }

        let debited = from.balance.debit(&request.amount).map_err(|_| insufficient())?;
        let credited = to
            .balance
            .credit(&request.amount)
            .map_err(|_| LedgerError::BalanceOverflow {
                account_id: request.to.clone(),
            })?;

        tx.write_balance(&request.from, debited).await?;
        tx.write_balance(&request.to, credited).await?;

        let transfer = tx
            .append_transfer(NewTransfer {
                from: request.from.clone(),
                to: request.to.clone(),
                currency: from.currency,
                amount: request.amount,
            })
            .await?;

        Ok(transfer)
    }
}

async fn read_existing<T: LedgerTx>(tx: &mut T, id: &str) -> Result<AccountSnapshot, LedgerError> {
    tx.read_account(id)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
}

fn log_rejection(err: &LedgerError, request: &ValidTransfer, context: &OperationContext) {
    if err.is_retryable() {
        tracing::warn!(
            from = %request.from,
            to = %request.to,
            amount = %request.amount,
            correlation_id = ?context.correlation_id,
            "transfer lost a serialization conflict"
        );
    } else if matches!(err, LedgerError::Storage(_)) {
        tracing::error!(
            error = %err,
            from = %request.from,
            to = %request.to,
            correlation_id = ?context.correlation_id,
            "transfer failed"
        );
    } else {
        tracing::debug!(
            error = %err,
            from = %request.from,
            to = %request.to,
            amount = %request.amount,
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            "transfer rejected"
        );
    }
}
