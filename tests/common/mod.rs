//! Common test utilities

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;

use wallet_ledger::{build_router, db, InMemoryLedgerStore};

/// Router over a fresh in-memory store, plus the store for inspection
pub fn in_memory_app() -> (Router, InMemoryLedgerStore) {
    let store = InMemoryLedgerStore::new();
    (build_router(store.clone()), store)
}

/// Send one request and decode the JSON response body (`Null` when empty)
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, json)
}

pub async fn create_wallet(app: &Router, id: &str, init_amt: &str, currency: &str) -> Value {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/wallets",
        Some(serde_json::json!({ "id": id, "init_amt": init_amt, "currency": currency })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "wallet {} creation failed: {}", id, json);
    json
}

/// Setup test database - create the schema if needed and truncate the ledger
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::apply_schema(&pool).await.expect("Failed to apply schema");

    sqlx::query("TRUNCATE TABLE transfers, accounts RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
