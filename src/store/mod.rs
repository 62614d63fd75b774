//! Ledger store module
//!
//! Storage capability consumed by the transfer executor and the ledger
//! projection, with a PostgreSQL adapter and an in-memory fake.

mod error;
mod filter;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::{
    Account, AccountSnapshot, Balance, Currency, NewAccount, NewTransfer, Transfer,
    TransferFilter,
};

pub use error::StoreError;
pub use filter::push_transfer_filter;
pub use memory::{InMemoryLedgerStore, InMemoryLedgerTx};
pub use postgres::{PgLedgerStore, PgLedgerTx};

/// Account table and transfer log.
///
/// Implementations are cheap to clone; clones share the same storage.
#[async_trait]
pub trait LedgerStore: Clone + Send + Sync + 'static {
    type Tx: LedgerTx;

    /// Open a transaction with serializable isolation.
    async fn begin_serializable(&self) -> Result<Self::Tx, StoreError>;

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn get_account(&self, id: &str) -> Result<Option<Account>, StoreError>;

    /// Accounts ordered by id, optionally restricted to one currency.
    async fn list_accounts(&self, currency: Option<Currency>) -> Result<Vec<Account>, StoreError>;

    /// Transfers matching `filter`, ascending by `created_at` then `id`.
    async fn list_transfers(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, StoreError>;
}

/// One serializable unit of work.
///
/// Dropping a transaction without calling `commit` discards its writes.
#[async_trait]
pub trait LedgerTx: Send {
    async fn read_account(&mut self, id: &str) -> Result<Option<AccountSnapshot>, StoreError>;

    /// Overwrite the balance and advance `updated_at` to the transaction clock.
    async fn write_balance(&mut self, id: &str, balance: Balance) -> Result<(), StoreError>;

    /// Append to the transfer log; the store assigns id and `created_at`.
    async fn append_transfer(&mut self, transfer: NewTransfer) -> Result<Transfer, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
