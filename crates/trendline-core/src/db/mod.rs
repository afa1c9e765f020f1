//! Database access layer for PostgreSQL.

pub mod bars;
pub mod portfolios;
pub mod wide;

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Statements creating the full schema.
///
/// The wide tables start with only their date key; symbol columns are added
/// at aggregation time, which is why the schema lives here instead of in a
/// static migration set.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stock_data (
        symbol      VARCHAR(10) NOT NULL,
        date        DATE NOT NULL,
        close_price NUMERIC(12, 4) NOT NULL,
        ma_50       NUMERIC(14, 6),
        ma_100      NUMERIC(14, 6),
        volume      BIGINT,
        UNIQUE (symbol, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS moving_average_50 (
        date DATE PRIMARY KEY
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS moving_average_100 (
        date DATE PRIMARY KEY
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id       SERIAL PRIMARY KEY,
        username VARCHAR(80) NOT NULL UNIQUE,
        email    VARCHAR(120) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS portfolios (
        id      SERIAL PRIMARY KEY,
        name    VARCHAR(120) NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users (id)
    )
    "#,
];

const TABLES: &[&str] = &[
    "portfolios",
    "users",
    "moving_average_100",
    "moving_average_50",
    "stock_data",
];

/// Create any missing tables. Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Drop and recreate every table. Destructive; only reached through the
/// explicit reset operation.
pub async fn reset_schema(pool: &PgPool) -> Result<()> {
    for table in TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
            .execute(pool)
            .await?;
    }
    ensure_schema(pool).await
}
