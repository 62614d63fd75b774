//! Database module
//!
//! Connectivity, schema checks and schema bootstrap.

use sqlx::{Executor, PgPool};

/// Schema applied by [`apply_schema`]; every statement is `IF NOT EXISTS`.
pub const SCHEMA_SQL: &str = include_str!("../migrations/20240101000000_create_wallet_ledger.sql");

const REQUIRED_TABLES: [&str; 2] = ["accounts", "transfers"];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!(table, "Required table does not exist");
            return Ok(false);
        }
    }

    Ok(true)
}

/// Create the ledger tables and indexes if they are missing.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    // A bare &str runs over the simple query protocol, which accepts
    // several statements at once
    pool.execute(SCHEMA_SQL).await?;

    tracing::info!("Ledger schema applied");
    Ok(())
}
