//! PostgreSQL ledger store
//!
//! Accounts and transfers live in the `accounts` and `transfers` tables (see
//! `migrations/`). Transfer transactions run at SERIALIZABLE isolation, so
//! Postgres itself rejects a conflicting concurrent transfer with SQLSTATE
//! 40001, which surfaces as [`StoreError::SerializationConflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::domain::{
    Account, AccountSnapshot, Amount, Balance, Currency, NewAccount, NewTransfer, Transfer,
    TransferFilter,
};

use super::error::is_unique_violation;
use super::{push_transfer_filter, LedgerStore, LedgerTx, StoreError};

const ACCOUNT_COLUMNS: &str = "id, balance, currency, created_at, updated_at";

/// Ledger store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A serializable Postgres transaction. Dropping it rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    balance: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            balance: decode_balance(&row.id, row.balance)?,
            currency: decode_currency(&row.id, &row.currency)?,
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransferRow {
    id: i64,
    from: String,
    to: String,
    currency: String,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransferRow> for Transfer {
    type Error = StoreError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        let amount = Amount::new(row.amount).map_err(|e| {
            StoreError::Invariant(format!("transfer {} has invalid amount: {}", row.id, e))
        })?;
        let currency = row.currency.parse::<Currency>().map_err(|e| {
            StoreError::Invariant(format!("transfer {} has invalid currency: {}", row.id, e))
        })?;

        Ok(Transfer {
            id: row.id,
            from: row.from,
            to: row.to,
            currency,
            amount,
            created_at: row.created_at,
        })
    }
}

fn decode_balance(account_id: &str, value: Decimal) -> Result<Balance, StoreError> {
    Balance::new(value).map_err(|e| {
        StoreError::Invariant(format!("account {} has invalid balance: {}", account_id, e))
    })
}

fn decode_currency(account_id: &str, code: &str) -> Result<Currency, StoreError> {
    code.trim().parse().map_err(|e| {
        StoreError::Invariant(format!("account {} has invalid currency: {}", account_id, e))
    })
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin_serializable(&self) -> Result<PgLedgerTx, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Must be the first statement of the transaction
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        Ok(PgLedgerTx { tx })
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let row: AccountRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO accounts (id, balance, currency)
            VALUES ($1, $2, $3)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.id)
        .bind(account.initial_balance.value())
        .bind(account.currency.code())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateAccount(account.id.clone())
            } else {
                StoreError::from(e)
            }
        })?;

        Account::try_from(row)
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Account::try_from).transpose()
    }

    async fn list_accounts(&self, currency: Option<Currency>) -> Result<Vec<Account>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {ACCOUNT_COLUMNS} FROM accounts"));
        if let Some(currency) = currency {
            query.push(" WHERE currency = ").push_bind(currency.code());
        }
        query.push(" ORDER BY id ASC");

        let rows: Vec<AccountRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Account::try_from).collect()
    }

    async fn list_transfers(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"SELECT id, "from", "to", currency, amount, created_at FROM transfers"#,
        );
        push_transfer_filter(&mut query, filter);
        query.push(" ORDER BY created_at ASC, id ASC");

        let rows: Vec<TransferRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Transfer::try_from).collect()
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn read_account(&mut self, id: &str) -> Result<Option<AccountSnapshot>, StoreError> {
        let row: Option<(String, Decimal)> =
            sqlx::query_as("SELECT currency, balance FROM accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;

        match row {
            Some((currency, balance)) => Ok(Some(AccountSnapshot {
                balance: decode_balance(id, balance)?,
                currency: decode_currency(id, &currency)?,
            })),
            None => Ok(None),
        }
    }

    async fn write_balance(&mut self, id: &str, balance: Balance) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(balance.value())
        .bind(id)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::Invariant(format!(
                "account {} vanished inside its transaction",
                id
            )));
        }

        Ok(())
    }

    async fn append_transfer(&mut self, transfer: NewTransfer) -> Result<Transfer, StoreError> {
        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO transfers ("from", "to", currency, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(&transfer.from)
        .bind(&transfer.to)
        .bind(transfer.currency.code())
        .bind(transfer.amount.value())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Transfer {
            id,
            from: transfer.from,
            to: transfer.to,
            currency: transfer.currency,
            amount: transfer.amount,
            created_at,
        })
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
