//! Ingestion pipeline: fetch daily bars, compute moving averages, upsert.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

use trendline_core::api::MarketData;
use trendline_core::config::IngestConfig;
use trendline_core::db::bars::BarStore;
use trendline_core::types::{Bar, DailyBar, RunSummary};
use trendline_core::{Error, Result};

/// Trailing arithmetic means over `values`.
///
/// Index `i` gets the mean of `values[i + 1 - window ..= i]`, or `None`
/// while fewer than `window` samples exist. Absent, never zero.
pub fn rolling_mean(values: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let divisor = Decimal::from(window as u64);
    let mut means = Vec::with_capacity(values.len());
    let mut window_sum = Decimal::ZERO;

    for (i, value) in values.iter().enumerate() {
        window_sum += *value;
        if i + 1 < window {
            means.push(None);
            continue;
        }
        if i + 1 > window {
            window_sum -= values[i - window];
        }
        means.push(Some(window_sum / divisor));
    }

    means
}

/// Turn provider bars into store bars with MA50/MA100 attached.
///
/// Bars with a missing close are dropped before windowing, so the moving
/// averages run over the sequence of closes that actually exist; each drop
/// is logged with its reason. This is the single canonical MA definition
/// for both backfill and incremental runs.
pub fn compute_bars(symbol: &str, daily: &[DailyBar]) -> Vec<Bar> {
    let mut kept: Vec<(&DailyBar, Decimal)> = Vec::with_capacity(daily.len());
    for bar in daily {
        match bar.close {
            Some(close) => kept.push((bar, close)),
            None => warn!(
                symbol = symbol,
                date = %bar.date,
                "Skipping bar with missing close price"
            ),
        }
    }

    let closes: Vec<Decimal> = kept.iter().map(|(_, close)| *close).collect();
    let ma_50 = rolling_mean(&closes, 50);
    let ma_100 = rolling_mean(&closes, 100);

    kept.iter()
        .enumerate()
        .map(|(i, (bar, close))| Bar {
            symbol: symbol.to_string(),
            date: bar.date,
            close_price: *close,
            ma_50: ma_50[i],
            ma_100: ma_100[i],
            volume: bar.volume,
        })
        .collect()
}

/// Sequential per-symbol ingestion over a market-data source.
pub struct Ingestor {
    store: BarStore,
    provider: Arc<dyn MarketData>,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(store: BarStore, provider: Arc<dyn MarketData>, config: IngestConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Full-history ingest for every symbol in `symbols`.
    ///
    /// Symbols without source data are skipped, symbols whose batches fail
    /// permanently are reported, and the run continues either way; only a
    /// storage-level failure aborts the run.
    pub async fn backfill(&self, symbols: &[String]) -> Result<RunSummary> {
        let end = Utc::now().date_naive();
        self.ingest_window(symbols, self.config.history_start, end, None)
            .await
    }

    /// Incremental ingest: upsert only bars strictly newer than the last
    /// ingested date (or up to a caller-supplied end date).
    ///
    /// Fetches a lookback window so the 100-day average is computed from a
    /// fully populated window rather than the delta alone.
    pub async fn daily_update(
        &self,
        symbols: &[String],
        end_date: Option<NaiveDate>,
    ) -> Result<RunSummary> {
        let end = end_date.unwrap_or_else(|| Utc::now().date_naive());
        let last = self.store.last_date().await?;

        if let Some(last) = last {
            if last >= end {
                info!(last = %last, "Store already up to date");
                return Ok(RunSummary::default());
            }
        }

        let start = end - chrono::Duration::days(self.config.lookback_days);
        self.ingest_window(symbols, start, end, last).await
    }

    async fn ingest_window(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        newer_than: Option<NaiveDate>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for symbol in symbols {
            match self.ingest_symbol(symbol, start, end, newer_than).await {
                Ok(0) => {
                    summary.symbols_skipped += 1;
                }
                Ok(written) => {
                    summary.symbols_processed += 1;
                    summary.rows_written += written;
                }
                Err(Error::NoData { .. }) => {
                    warn!(symbol = %symbol, "No data from source, skipping symbol");
                    summary.symbols_skipped += 1;
                }
                Err(e @ (Error::Http(_) | Error::Api { .. } | Error::Json(_))) => {
                    warn!(symbol = %symbol, error = %e, "Fetch failed, skipping symbol");
                    summary.symbols_skipped += 1;
                }
                Err(e) if e.is_locked() => {
                    error!(
                        symbol = %symbol,
                        error = %e,
                        "Batch failed permanently after lock retries"
                    );
                    summary.symbols_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            processed = summary.symbols_processed,
            skipped = summary.symbols_skipped,
            failed = summary.symbols_failed,
            rows = summary.rows_written,
            "Ingestion run complete"
        );
        Ok(summary)
    }

    async fn ingest_symbol(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        newer_than: Option<NaiveDate>,
    ) -> Result<usize> {
        let daily = self.provider.fetch_daily(symbol, start, end).await?;
        let mut bars = compute_bars(symbol, &daily);
        if let Some(cutoff) = newer_than {
            bars.retain(|b| b.date > cutoff);
        }

        if bars.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        for batch in bars.chunks(self.config.batch_size) {
            written += self.upsert_batch_with_retry(symbol, batch).await?;
        }

        info!(symbol = symbol, rows = written, "Ingested symbol");
        Ok(written)
    }

    /// Upsert one batch, retrying on transient lock contention with a
    /// fixed backoff until the attempt ceiling is reached.
    async fn upsert_batch_with_retry(&self, symbol: &str, batch: &[Bar]) -> Result<usize> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.upsert_batch(batch).await {
                Ok(written) => return Ok(written),
                Err(e) if e.is_locked() && attempt < self.config.max_retries => {
                    warn!(
                        symbol = symbol,
                        attempt = attempt,
                        backoff_secs = self.config.retry_backoff_secs,
                        "Store locked, retrying batch"
                    );
                    tokio::time::sleep(self.config.retry_backoff()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(day: u32, close: Option<i64>) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close.map(|c| Decimal::new(c, 0)),
            high: close.map(|c| Decimal::new(c + 1, 0)),
            low: close.map(|c| Decimal::new(c - 1, 0)),
            close: close.map(|c| Decimal::new(c, 0)),
            volume: Some(1_000),
        }
    }

    #[test]
    fn test_rolling_mean_below_window_is_absent() {
        let values: Vec<Decimal> = (1..=4).map(|v| Decimal::new(v, 0)).collect();
        let means = rolling_mean(&values, 3);
        assert_eq!(means[0], None);
        assert_eq!(means[1], None);
        assert_eq!(means[2], Some(Decimal::new(2, 0))); // (1+2+3)/3
        assert_eq!(means[3], Some(Decimal::new(3, 0))); // (2+3+4)/3
    }

    #[test]
    fn test_rolling_mean_shorter_than_window() {
        let values: Vec<Decimal> = (1..=5).map(|v| Decimal::new(v, 0)).collect();
        let means = rolling_mean(&values, 10);
        assert!(means.iter().all(Option::is_none));
        assert_eq!(means.len(), 5);
    }

    #[test]
    fn test_rolling_mean_exact_decimal() {
        let values = vec![
            Decimal::new(101, 1), // 10.1
            Decimal::new(102, 1), // 10.2
        ];
        let means = rolling_mean(&values, 2);
        assert_eq!(means[1], Some(Decimal::new(1015, 2))); // 10.15
    }

    #[test]
    fn test_compute_bars_skips_missing_close() {
        let daily = vec![daily(1, Some(10)), daily(2, None), daily(3, Some(12))];
        let bars = compute_bars("AAPL", &daily);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(bars[1].close_price, Decimal::new(12, 0));
    }

    #[test]
    fn test_compute_bars_ma_presence() {
        let daily: Vec<DailyBar> = (1..=31).map(|d| daily(d, Some(d as i64))).collect();
        // Not enough closes for 50- or 100-day windows anywhere.
        let bars = compute_bars("AAPL", &daily);
        assert_eq!(bars.len(), 31);
        assert!(bars.iter().all(|b| b.ma_50.is_none() && b.ma_100.is_none()));
    }

    #[test]
    fn test_compute_bars_ma_window_over_present_closes() {
        // 50 present closes of constant 20 plus one missing cell; the
        // missing cell does not count toward the window.
        let mut daily: Vec<DailyBar> = (1..=25).map(|d| daily(d, Some(20))).collect();
        daily.push(self::daily(26, None));
        daily.extend((1..=25).map(|d| DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 4, d).unwrap(),
            ..self::daily(d, Some(20))
        }));

        let bars = compute_bars("AAPL", &daily);
        assert_eq!(bars.len(), 50);
        assert_eq!(bars[48].ma_50, None);
        assert_eq!(bars[49].ma_50, Some(Decimal::new(20, 0)));
        assert!(bars[49].ma_100.is_none());
    }
}
