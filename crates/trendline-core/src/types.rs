//! Domain types shared across the pipeline, backtester, and API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One trading day for one symbol as returned by the market-data source.
///
/// Every field except the date may be absent: providers report gaps for
/// halted or sparsely traded days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading day.
    pub date: NaiveDate,
    /// Opening price.
    pub open: Option<Decimal>,
    /// Intraday high.
    pub high: Option<Decimal>,
    /// Intraday low.
    pub low: Option<Decimal>,
    /// Closing price.
    pub close: Option<Decimal>,
    /// Shares traded.
    pub volume: Option<i64>,
}

/// A stored bar: close price plus precomputed moving averages.
///
/// Keyed by (symbol, date); the close price is never null in the store,
/// while the moving averages are absent until enough history exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Ticker symbol.
    pub symbol: String,
    /// Trading day.
    pub date: NaiveDate,
    /// Closing price.
    pub close_price: Decimal,
    /// 50-day trailing moving average of the close.
    pub ma_50: Option<Decimal>,
    /// 100-day trailing moving average of the close.
    pub ma_100: Option<Decimal>,
    /// Shares traded.
    pub volume: Option<i64>,
}

/// Outcome of one ingestion or aggregation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Symbols fully processed.
    pub symbols_processed: usize,
    /// Symbols skipped because the source had no data.
    pub symbols_skipped: usize,
    /// Symbols whose batches failed permanently.
    pub symbols_failed: usize,
    /// Rows written to the store.
    pub rows_written: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: &RunSummary) {
        self.symbols_processed += other.symbols_processed;
        self.symbols_skipped += other.symbols_skipped;
        self.symbols_failed += other.symbols_failed;
        self.rows_written += other.rows_written;
    }
}

/// A user of the dashboard. Stub entity, CRUD only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
}

/// A named portfolio owned by a user. Stub entity, CRUD only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Portfolio {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_merge() {
        let mut total = RunSummary::default();
        total.merge(&RunSummary {
            symbols_processed: 2,
            symbols_skipped: 1,
            symbols_failed: 0,
            rows_written: 500,
        });
        total.merge(&RunSummary {
            symbols_processed: 1,
            symbols_skipped: 0,
            symbols_failed: 1,
            rows_written: 250,
        });
        assert_eq!(total.symbols_processed, 3);
        assert_eq!(total.symbols_skipped, 1);
        assert_eq!(total.symbols_failed, 1);
        assert_eq!(total.rows_written, 750);
    }
}
