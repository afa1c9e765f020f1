//! Bar store: per-symbol daily rows with precomputed moving averages.

use crate::types::Bar;
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::{Acquire, PgPool, Row};
use tracing::{debug, warn};

const UPSERT_BAR: &str = r#"
    INSERT INTO stock_data (symbol, date, close_price, ma_50, ma_100, volume)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (symbol, date) DO UPDATE SET
        close_price = EXCLUDED.close_price,
        ma_50 = EXCLUDED.ma_50,
        ma_100 = EXCLUDED.ma_100,
        volume = EXCLUDED.volume
"#;

/// Repository for the `stock_data` table.
///
/// Upserts are keyed on (symbol, date) with last-write-wins semantics, so
/// re-running an ingestion over the same window is idempotent.
#[derive(Clone)]
pub struct BarStore {
    pool: PgPool,
}

impl BarStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert or overwrite a single bar.
    pub async fn upsert(&self, bar: &Bar) -> Result<()> {
        sqlx::query(UPSERT_BAR)
            .bind(&bar.symbol)
            .bind(bar.date)
            .bind(bar.close_price)
            .bind(bar.ma_50)
            .bind(bar.ma_100)
            .bind(bar.volume)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Upsert a batch of bars inside one transaction.
    ///
    /// The batch is durable once this returns. A constraint violation on a
    /// single row rolls back just that row (savepoint) and the batch goes
    /// on; lock contention or storage failures roll back the whole batch
    /// and surface to the caller for its retry policy.
    pub async fn upsert_batch(&self, bars: &[Bar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        let mut tx = self.pool.begin().await?;

        for bar in bars {
            let mut sp = tx.begin().await?;
            let result = sqlx::query(UPSERT_BAR)
                .bind(&bar.symbol)
                .bind(bar.date)
                .bind(bar.close_price)
                .bind(bar.ma_50)
                .bind(bar.ma_100)
                .bind(bar.volume)
                .execute(&mut *sp)
                .await
                .map_err(Error::from);

            match result {
                Ok(_) => {
                    sp.commit().await?;
                    written += 1;
                }
                Err(e) if e.is_integrity() => {
                    sp.rollback().await?;
                    warn!(
                        symbol = %bar.symbol,
                        date = %bar.date,
                        error = %e,
                        "Skipping row after constraint violation"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tx.commit().await?;
        debug!(count = written, "Upserted bar batch");
        Ok(written)
    }

    /// Query one symbol's bars in `[start, end]`, ordered ascending by date.
    pub async fn query(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, date, close_price, ma_50, ma_100, volume
            FROM stock_data
            WHERE symbol = $1 AND date >= $2 AND date <= $3
            ORDER BY date
            "#,
        )
        .bind(symbol)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let bars = rows
            .iter()
            .map(|row| Bar {
                symbol: row.get("symbol"),
                date: row.get("date"),
                close_price: row.get("close_price"),
                ma_50: row.get("ma_50"),
                ma_100: row.get("ma_100"),
                volume: row.get("volume"),
            })
            .collect();

        Ok(bars)
    }

    /// All symbols currently present in the store.
    pub async fn distinct_symbols(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT symbol FROM stock_data ORDER BY symbol")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("symbol")).collect())
    }

    /// All dates currently present in the store.
    pub async fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        let rows = sqlx::query("SELECT DISTINCT date FROM stock_data ORDER BY date")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("date")).collect())
    }

    /// Most recent ingested date across all symbols.
    pub async fn last_date(&self) -> Result<Option<NaiveDate>> {
        let row = sqlx::query("SELECT MAX(date) AS max_date FROM stock_data")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("max_date"))
    }

    /// Subset of `symbols` that have at least one bar in `[start, end]`.
    pub async fn symbols_with_data(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT symbol
            FROM stock_data
            WHERE symbol = ANY($1) AND date >= $2 AND date <= $3
            ORDER BY symbol
            "#,
        )
        .bind(symbols)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("symbol")).collect())
    }

    /// Earliest stored date, used by the full aggregation rebuild.
    pub async fn first_date(&self) -> Result<Option<NaiveDate>> {
        let row = sqlx::query("SELECT MIN(date) AS min_date FROM stock_data")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("min_date"))
    }
}
