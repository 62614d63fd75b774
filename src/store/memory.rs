//! In-memory ledger store
//!
//! A thread-safe fake of the Postgres store for tests and local runs. It
//! gives the same serializable guarantee with optimistic validation: a
//! transaction remembers the version of every account it read or wrote, and
//! its commit fails with [`StoreError::SerializationConflict`] if another
//! transaction committed a change to any of them in the meantime.
//!
//! Tests can also steer it: park every transaction at its first write on a
//! shared [`Barrier`] to force an interleaving, make the next commit fail, or
//! make rollbacks fail.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Barrier, Mutex, RwLock};

use crate::domain::{
    Account, AccountSnapshot, Balance, Currency, NewAccount, NewTransfer, Transfer,
    TransferFilter,
};

use super::{LedgerStore, LedgerTx, StoreError};

#[derive(Default)]
struct State {
    accounts: BTreeMap<String, VersionedAccount>,
    transfers: Vec<Transfer>,
}

struct VersionedAccount {
    account: Account,
    version: u64,
}

struct Inner {
    state: RwLock<State>,
    next_transfer_id: AtomicI64,
    begun: AtomicUsize,
    open: AtomicUsize,
    fail_next_commit: AtomicBool,
    fail_rollbacks: AtomicBool,
    write_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: RwLock::new(State::default()),
            next_transfer_id: AtomicI64::new(1),
            begun: AtomicUsize::new(0),
            open: AtomicUsize::new(0),
            fail_next_commit: AtomicBool::new(false),
            fail_rollbacks: AtomicBool::new(false),
            write_barrier: Mutex::new(None),
        }
    }
}

/// In-memory ledger store; clones share state.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    inner: Arc<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions begun since the store was created.
    pub fn transactions_begun(&self) -> usize {
        self.inner.begun.load(Ordering::SeqCst)
    }

    /// Transactions neither committed, rolled back nor dropped.
    pub fn open_transactions(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Park every transaction begun from now on at its first balance write
    /// until `barrier` releases.
    pub async fn pause_writers_at(&self, barrier: Arc<Barrier>) {
        *self.inner.write_barrier.lock().await = Some(barrier);
    }

    /// Stop parking transactions begun from now on.
    pub async fn resume_writers(&self) {
        *self.inner.write_barrier.lock().await = None;
    }

    /// Fail the next commit with a serialization conflict.
    pub fn fail_next_commit(&self) {
        self.inner.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make every rollback report failure. The writes are still discarded.
    pub fn fail_rollbacks(&self, fail: bool) {
        self.inner.fail_rollbacks.store(fail, Ordering::SeqCst);
    }

    async fn account_snapshot(&self, id: &str) -> Option<(AccountSnapshot, u64)> {
        let state = self.inner.state.read().await;
        state
            .accounts
            .get(id)
            .map(|entry| (AccountSnapshot::from(&entry.account), entry.version))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Tx = InMemoryLedgerTx;

    async fn begin_serializable(&self) -> Result<InMemoryLedgerTx, StoreError> {
        self.inner.begun.fetch_add(1, Ordering::SeqCst);
        self.inner.open.fetch_add(1, Ordering::SeqCst);

        Ok(InMemoryLedgerTx {
            store: self.clone(),
            clock: Utc::now(),
            versions: HashMap::new(),
            balances: BTreeMap::new(),
            appended: Vec::new(),
            barrier: self.inner.write_barrier.lock().await.clone(),
        })
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut state = self.inner.state.write().await;
        if state.accounts.contains_key(&account.id) {
            return Err(StoreError::DuplicateAccount(account.id));
        }

        let now = Utc::now();
        let created = Account {
            id: account.id.clone(),
            balance: account.initial_balance,
            currency: account.currency,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(
            account.id,
            VersionedAccount {
                account: created.clone(),
                version: 0,
            },
        );

        Ok(created)
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let state = self.inner.state.read().await;
        Ok(state.accounts.get(id).map(|entry| entry.account.clone()))
    }

    async fn list_accounts(&self, currency: Option<Currency>) -> Result<Vec<Account>, StoreError> {
        let state = self.inner.state.read().await;
        Ok(state
            .accounts
            .values()
            .map(|entry| &entry.account)
            .filter(|account| currency.map_or(true, |c| account.currency == c))
            .cloned()
            .collect())
    }

    async fn list_transfers(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, StoreError> {
        let state = self.inner.state.read().await;
        let mut transfers: Vec<Transfer> = state
            .transfers
            .iter()
            .filter(|transfer| filter.matches(transfer))
            .cloned()
            .collect();
        transfers.sort_by_key(|transfer| (transfer.created_at, transfer.id));
        Ok(transfers)
    }
}

/// Transaction on an [`InMemoryLedgerStore`]. Writes are buffered until commit.
pub struct InMemoryLedgerTx {
    store: InMemoryLedgerStore,
    clock: DateTime<Utc>,
    versions: HashMap<String, u64>,
    balances: BTreeMap<String, Balance>,
    appended: Vec<Transfer>,
    barrier: Option<Arc<Barrier>>,
}

impl InMemoryLedgerTx {
    async fn track(&mut self, id: &str) -> Option<AccountSnapshot> {
        let (snapshot, version) = self.store.account_snapshot(id).await?;
        self.versions.entry(id.to_string()).or_insert(version);
        Some(snapshot)
    }
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn read_account(&mut self, id: &str) -> Result<Option<AccountSnapshot>, StoreError> {
        let Some(mut snapshot) = self.track(id).await else {
            return Ok(None);
        };
        if let Some(balance) = self.balances.get(id) {
            snapshot.balance = *balance;
        }
        Ok(Some(snapshot))
    }

    async fn write_balance(&mut self, id: &str, balance: Balance) -> Result<(), StoreError> {
        if let Some(barrier) = self.barrier.take() {
            barrier.wait().await;
        }

        if self.track(id).await.is_none() {
            return Err(StoreError::Invariant(format!(
                "account {} vanished inside its transaction",
                id
            )));
        }
        self.balances.insert(id.to_string(), balance);
        Ok(())
    }

    async fn append_transfer(&mut self, transfer: NewTransfer) -> Result<Transfer, StoreError> {
        // Ids are burned even if the transaction later aborts, like a sequence
        let id = self.store.inner.next_transfer_id.fetch_add(1, Ordering::SeqCst);
        let transfer = Transfer {
            id,
            from: transfer.from,
            to: transfer.to,
            currency: transfer.currency,
            amount: transfer.amount,
            created_at: self.clock,
        };
        self.appended.push(transfer.clone());
        Ok(transfer)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        if self.store.inner.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::SerializationConflict);
        }

        let inner = Arc::clone(&self.store.inner);
        let mut state = inner.state.write().await;

        for (id, seen) in &self.versions {
            let current = state.accounts.get(id).map(|entry| entry.version);
            if current != Some(*seen) {
                tracing::debug!(account_id = %id, "in-memory commit rejected: account changed");
                return Err(StoreError::SerializationConflict);
            }
        }

        for (id, balance) in std::mem::take(&mut self.balances) {
            if let Some(entry) = state.accounts.get_mut(&id) {
                entry.account.balance = balance;
                entry.account.updated_at = self.clock;
                entry.version += 1;
            }
        }
        state.transfers.append(&mut self.appended);

        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        if self.store.inner.fail_rollbacks.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("rollback failed".to_string()));
        }
        Ok(())
    }
}

impl Drop for InMemoryLedgerTx {
    fn drop(&mut self) {
        self.store.inner.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Amount;
    use rust_decimal_macros::dec;

    async fn seeded() -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        for (id, balance, currency) in [("alice", dec!(100), "USD"), ("bob", dec!(50), "USD")] {
            store
                .insert_account(NewAccount {
                    id: id.to_string(),
                    initial_balance: Balance::new(balance).unwrap(),
                    currency: currency.parse().unwrap(),
                })
                .await
                .unwrap();
        }
        store
    }

    fn transfer_to_bob(amount: rust_decimal::Decimal) -> NewTransfer {
        NewTransfer {
            from: "alice".to_string(),
            to: "bob".to_string(),
            currency: "USD".parse().unwrap(),
            amount: Amount::new(amount).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_account_rejected() {
        let store = seeded().await;
        let err = store
            .insert_account(NewAccount {
                id: "alice".to_string(),
                initial_balance: Balance::zero(),
                currency: "EUR".parse().unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateAccount(id) if id == "alice"));
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = seeded().await;
        let mut tx = store.begin_serializable().await.unwrap();
        tx.write_balance("alice", Balance::new(dec!(70)).unwrap()).await.unwrap();
        tx.append_transfer(transfer_to_bob(dec!(30))).await.unwrap();

        // read-your-writes inside the transaction
        let seen = tx.read_account("alice").await.unwrap().unwrap();
        assert_eq!(seen.balance.value(), dec!(70));

        // nothing outside it
        let outside = store.get_account("alice").await.unwrap().unwrap();
        assert_eq!(outside.balance.value(), dec!(100));

        tx.rollback().await.unwrap();
        assert!(store.list_transfers(&TransferFilter::default()).await.unwrap().is_empty());
        assert_eq!(store.open_transactions(), 0);
    }

    #[tokio::test]
    async fn test_commit_applies_writes_and_log() {
        let store = seeded().await;
        let mut tx = store.begin_serializable().await.unwrap();
        tx.read_account("alice").await.unwrap();
        tx.write_balance("alice", Balance::new(dec!(70)).unwrap()).await.unwrap();
        let appended = tx.append_transfer(transfer_to_bob(dec!(30))).await.unwrap();
        tx.commit().await.unwrap();

        let alice = store.get_account("alice").await.unwrap().unwrap();
        assert_eq!(alice.balance.value(), dec!(70));
        assert_eq!(alice.updated_at, appended.created_at);

        let log = store.list_transfers(&TransferFilter::default()).await.unwrap();
        assert_eq!(log, vec![appended]);
    }

    #[tokio::test]
    async fn test_stale_read_conflicts_on_commit() {
        let store = seeded().await;

        let mut first = store.begin_serializable().await.unwrap();
        let mut second = store.begin_serializable().await.unwrap();
        first.read_account("alice").await.unwrap();
        second.read_account("alice").await.unwrap();

        first.write_balance("alice", Balance::new(dec!(40)).unwrap()).await.unwrap();
        first.commit().await.unwrap();

        second.write_balance("alice", Balance::new(dec!(30)).unwrap()).await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(err.is_serialization_conflict());

        let alice = store.get_account("alice").await.unwrap().unwrap();
        assert_eq!(alice.balance.value(), dec!(40));
    }

    #[tokio::test]
    async fn test_aborted_transfer_ids_are_not_reused() {
        let store = seeded().await;

        let mut aborted = store.begin_serializable().await.unwrap();
        let burned = aborted.append_transfer(transfer_to_bob(dec!(1))).await.unwrap();
        aborted.rollback().await.unwrap();

        let mut committed = store.begin_serializable().await.unwrap();
        let kept = committed.append_transfer(transfer_to_bob(dec!(1))).await.unwrap();
        committed.commit().await.unwrap();

        assert!(kept.id > burned.id);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = seeded().await;

        store.fail_next_commit();
        let tx = store.begin_serializable().await.unwrap();
        assert!(tx.commit().await.unwrap_err().is_serialization_conflict());

        store.fail_rollbacks(true);
        let tx = store.begin_serializable().await.unwrap();
        assert!(matches!(tx.rollback().await, Err(StoreError::Unavailable(_))));
        assert_eq!(store.open_transactions(), 0);
        assert_eq!(store.transactions_begun(), 2);
    }

    #[tokio::test]
    async fn test_list_accounts_by_currency() {
        let store = seeded().await;
        store
            .insert_account(NewAccount {
                id: "carol".to_string(),
                initial_balance: Balance::zero(),
                currency: "EUR".parse().unwrap(),
            })
            .await
            .unwrap();

        let all = store.list_accounts(None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);

        let eur = store.list_accounts(Some("EUR".parse().unwrap())).await.unwrap();
        assert_eq!(eur.len(), 1);
        assert_eq!(eur[0].id, "carol");
    }
}
