//! Projection Service
//!
//! Read side of the ledger: per-account payment views and the raw transfer
//! listing. Payments are computed from transfer rows on every read.

use crate::domain::{Payment, PaymentFilter, Transfer, TransferFilter};
use crate::handlers::LedgerError;
use crate::store::LedgerStore;

/// Projection Service over a [`LedgerStore`]
#[derive(Debug, Clone)]
pub struct ProjectionService<S> {
    store: S,
}

impl<S: LedgerStore> ProjectionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Payments touching `account_id`, oldest first.
    ///
    /// Direction is relative to `account_id`. A counterparty filter keeps only
    /// payments exchanged with that account, in either direction.
    pub async fn list_payments(
        &self,
        account_id: &str,
        filter: &PaymentFilter,
    ) -> Result<Vec<Payment>, LedgerError> {
        if self.store.get_account(account_id).await?.is_none() {
            return Err(LedgerError::AccountNotFound(account_id.to_string()));
        }

        let transfers = self
            .store
            .list_transfers(&TransferFilter {
                currency: filter.currency,
                since: filter.since,
                until: filter.until,
                ..TransferFilter::touching(account_id)
            })
            .await?;

        let payments: Vec<Payment> = transfers
            .iter()
            .filter_map(|transfer| Payment::project(account_id, transfer))
            .filter(|payment| {
                filter
                    .counterparty
                    .as_deref()
                    .map_or(true, |counterparty| payment.counterparty == counterparty)
            })
            .collect();

        tracing::debug!(
            account_id = %account_id,
            count = payments.len(),
            "listed payments"
        );

        Ok(payments)
    }

    /// Raw ledger rows matching `filter`, oldest first.
    pub async fn list_transfers(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, LedgerError> {
        Ok(self.store.list_transfers(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, OperationContext};
    use crate::handlers::{AccountHandler, CreateAccountCommand, TransferCommand, TransferHandler};
    use crate::store::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    async fn ledger() -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        let accounts = AccountHandler::new(store.clone());
        let context = OperationContext::new();
        for (id, balance, currency) in [
            ("alice", dec!(100), "USD"),
            ("bob", dec!(50), "USD"),
            ("carol", dec!(10), "USD"),
            ("erin", dec!(10), "EUR"),
        ] {
            accounts
                .create(CreateAccountCommand::new(id, balance, currency), &context)
                .await
                .unwrap();
        }

        let transfers = TransferHandler::new(store.clone());
        for (from, to, amount) in [
            ("alice", "bob", dec!(30)),
            ("carol", "alice", dec!(5)),
            ("bob", "carol", dec!(20)),
        ] {
            transfers
                .execute(TransferCommand::new(from, to, amount), &context)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_payments_are_direction_relative() {
        let service = ProjectionService::new(ledger().await);

        let payments = service
            .list_payments("alice", &PaymentFilter::default())
            .await
            .unwrap();

        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].direction, Direction::Outgoing);
        assert_eq!(payments[0].counterparty, "bob");
        assert_eq!(payments[0].amount, dec!(30));
        assert_eq!(payments[1].direction, Direction::Incoming);
        assert_eq!(payments[1].counterparty, "carol");
        assert!(payments.iter().all(|p| p.account == "alice"));
        assert!(payments[0].transfer_id < payments[1].transfer_id);
    }

    #[tokio::test]
    async fn test_counterparty_filter() {
        let service = ProjectionService::new(ledger().await);

        let filter = PaymentFilter {
            counterparty: Some("carol".to_string()),
            ..PaymentFilter::default()
        };
        let payments = service.list_payments("bob", &filter).await.unwrap();

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].direction, Direction::Outgoing);
        assert_eq!(payments[0].amount, dec!(20));
    }

    #[tokio::test]
    async fn test_account_without_history_and_unknown_account() {
        let service = ProjectionService::new(ledger().await);

        assert!(service
            .list_payments("erin", &PaymentFilter::default())
            .await
            .unwrap()
            .is_empty());

        let err = service
            .list_payments("ghost", &PaymentFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_currency_and_time_window_narrow() {
        let service = ProjectionService::new(ledger().await);
        let all = service.list_transfers(&TransferFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let eur = PaymentFilter {
            currency: Some("EUR".parse().unwrap()),
            ..PaymentFilter::default()
        };
        assert!(service.list_payments("alice", &eur).await.unwrap().is_empty());

        // `until` is exclusive
        let before_first = PaymentFilter {
            until: Some(all[0].created_at),
            ..PaymentFilter::default()
        };
        assert!(service
            .list_payments("alice", &before_first)
            .await
            .unwrap()
            .is_empty());

        // `since` is inclusive
        let from_last = PaymentFilter {
            since: Some(all[2].created_at),
            ..PaymentFilter::default()
        };
        let payments = service.list_payments("carol", &from_last).await.unwrap();
        assert!(payments.iter().any(|p| p.transfer_id == all[2].id));
    }

    #[tokio::test]
    async fn test_transfer_listing_ors_id_filters() {
        let service = ProjectionService::new(ledger().await);

        let filter = TransferFilter {
            from: Some("alice".to_string()),
            to: Some("carol".to_string()),
            ..TransferFilter::default()
        };
        let transfers = service.list_transfers(&filter).await.unwrap();

        // alice -> bob by `from`, bob -> carol by `to`
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].from, "alice");
        assert_eq!(transfers[1].to, "carol");
    }
}
