//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Account, Currency, Direction, OperationContext, Payment, PaymentFilter, Transfer,
    TransferFilter, ValidationError,
};
use crate::error::AppError;
use crate::handlers::{AccountHandler, CreateAccountCommand, TransferCommand, TransferHandler};
use crate::projection::ProjectionService;
use crate::store::LedgerStore;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CreateWalletRequest {
    pub id: String,
    #[serde(default)]
    pub init_amt: Decimal,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub to_account: String,
    pub amount: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListWalletsQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentsQuery {
    pub counterparty: Option<String>,
    pub currency: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransfersQuery {
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    pub currency: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance.value().normalize(),
            currency: account.currency.to_string(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// A payment as seen by `account`. Exactly one of `from_account` and
/// `to_account` is present, naming the counterparty.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub direction: Direction,
    pub transfer_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        let (from_account, to_account) = match payment.direction {
            Direction::Incoming => (Some(payment.counterparty), None),
            Direction::Outgoing => (None, Some(payment.counterparty)),
        };

        Self {
            account: payment.account,
            from_account,
            to_account,
            amount: payment.amount.normalize(),
            currency: payment.currency.to_string(),
            direction: payment.direction,
            transfer_id: payment.transfer_id,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub id: i64,
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            id: transfer.id,
            from: transfer.from,
            to: transfer.to,
            amount: transfer.amount.value().normalize(),
            currency: transfer.currency.to_string(),
            created_at: transfer.created_at,
        }
    }
}

// =========================================================================
// Query parsing
// =========================================================================

fn parse_currency(value: Option<&str>) -> Result<Option<Currency>, AppError> {
    Ok(value
        .map(|code| code.parse::<Currency>().map_err(ValidationError::from))
        .transpose()?)
}

fn parse_timestamp(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| AppError::InvalidRequest(format!("{}: {}", name, e)))
        })
        .transpose()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl PaymentsQuery {
    pub fn into_filter(self) -> Result<PaymentFilter, AppError> {
        Ok(PaymentFilter {
            currency: parse_currency(non_empty(self.currency).as_deref())?,
            since: parse_timestamp("since", non_empty(self.since).as_deref())?,
            until: parse_timestamp("until", non_empty(self.until).as_deref())?,
            counterparty: non_empty(self.counterparty),
        })
    }
}

impl TransfersQuery {
    pub fn into_filter(self) -> Result<TransferFilter, AppError> {
        Ok(TransferFilter {
            currency: parse_currency(non_empty(self.currency).as_deref())?,
            since: parse_timestamp("since", non_empty(self.since).as_deref())?,
            until: parse_timestamp("until", non_empty(self.until).as_deref())?,
            from: non_empty(self.from_id),
            to: non_empty(self.to_id),
        })
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

fn context_of(context: Option<Extension<OperationContext>>) -> OperationContext {
    context.map(|Extension(ctx)| ctx).unwrap_or_default()
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router<S: LedgerStore>() -> Router<S> {
    Router::new()
        .route("/wallets", get(list_wallets::<S>).post(create_wallet::<S>))
        .route("/wallets/:id", get(get_wallet::<S>))
        .route(
            "/wallets/:id/payments",
            get(list_payments::<S>).post(create_payment::<S>),
        )
        .route("/transfers", get(list_transfers::<S>))
}

// =========================================================================
// /wallets
// =========================================================================

async fn list_wallets<S: LedgerStore>(
    State(store): State<S>,
    Query(query): Query<ListWalletsQuery>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let handler = AccountHandler::new(store);

    let currency = non_empty(query.currency);
    let accounts = handler.list(currency.as_deref()).await?;

    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

async fn create_wallet<S: LedgerStore>(
    State(store): State<S>,
    context: Option<Extension<OperationContext>>,
    body: Result<Json<CreateWalletRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let request = json_body(body)?;
    let handler = AccountHandler::new(store);

    let command = CreateAccountCommand::new(request.id, request.init_amt, request.currency);
    let account = handler.create(command, &context_of(context)).await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

async fn get_wallet<S: LedgerStore>(
    State(store): State<S>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let handler = AccountHandler::new(store);

    let account = handler.get(&id).await?;

    Ok(Json(account.into()))
}

// =========================================================================
// /wallets/:id/payments
// =========================================================================

async fn list_payments<S: LedgerStore>(
    State(store): State<S>,
    Path(id): Path<String>,
    Query(query): Query<PaymentsQuery>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let filter = query.into_filter()?;
    let service = ProjectionService::new(store);

    let payments = service.list_payments(&id, &filter).await?;

    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

/// Send a payment from the wallet in the path
async fn create_payment<S: LedgerStore>(
    State(store): State<S>,
    Path(id): Path<String>,
    context: Option<Extension<OperationContext>>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    let request = json_body(body)?;
    let handler = TransferHandler::new(store);

    let command = TransferCommand::new(id, request.to_account, request.amount);
    let transfer = handler.execute(command, &context_of(context)).await?;

    let payment = Payment::project(&transfer.from, &transfer)
        .ok_or_else(|| AppError::Internal("committed transfer lost its sender".to_string()))?;

    Ok((StatusCode::CREATED, Json(payment.into())))
}

// =========================================================================
// /transfers
// =========================================================================

/// Raw ledger listing; `from_id` and `to_id` match either side (OR)
async fn list_transfers<S: LedgerStore>(
    State(store): State<S>,
    Query(query): Query<TransfersQuery>,
) -> Result<Json<Vec<TransferResponse>>, AppError> {
    let filter = query.into_filter()?;
    let service = ProjectionService::new(store);

    let transfers = service.list_transfers(&filter).await?;

    Ok(Json(transfers.into_iter().map(TransferResponse::from).collect()))
}
