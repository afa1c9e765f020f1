//! Wide aggregation job: pivot the long bar table into per-date rows.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{info, warn};

use trendline_core::db::bars::BarStore;
use trendline_core::db::wide::{column_name, WideTable, WideTables};
use trendline_core::Result;

/// What one aggregation pass touched.
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// Dates written to both wide tables.
    pub dates_written: usize,
    /// Symbols that contributed cells.
    pub symbols_included: Vec<String>,
    /// Requested symbols with no rows in the range, excluded from the pivot.
    pub symbols_excluded: Vec<String>,
}

/// Pivot cells for one date: (column, value) pairs per wide table.
#[derive(Debug, Default)]
struct DateCells {
    ma_50: Vec<(String, Option<Decimal>)>,
    ma_100: Vec<(String, Option<Decimal>)>,
}

/// Builds the `moving_average_50` / `moving_average_100` tables from the
/// bar store. The pivot happens in application code; the store is only
/// asked for plain per-symbol ranges.
pub struct WideAggregator {
    store: BarStore,
    wide: WideTables,
}

impl WideAggregator {
    pub fn new(store: BarStore, wide: WideTables) -> Self {
        Self { store, wide }
    }

    /// Aggregate `[start, end]` for the requested symbols.
    ///
    /// Symbols with zero matching rows are silently excluded from the
    /// pivot but reported for visibility. Every included symbol gets a
    /// column in both tables before any row is written.
    pub async fn aggregate_range(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AggregationReport> {
        let included = self.store.symbols_with_data(symbols, start, end).await?;
        let excluded: Vec<String> = symbols
            .iter()
            .filter(|s| !included.contains(*s))
            .cloned()
            .collect();

        if !excluded.is_empty() {
            warn!(
                count = excluded.len(),
                symbols = ?excluded,
                "Symbols with no rows in range excluded from aggregation"
            );
        }

        if included.is_empty() {
            warn!("No symbols with data in range, nothing to aggregate");
            return Ok(AggregationReport {
                symbols_excluded: excluded,
                ..Default::default()
            });
        }

        for symbol in &included {
            self.wide.ensure_column(WideTable::Ma50, symbol).await?;
            self.wide.ensure_column(WideTable::Ma100, symbol).await?;
        }

        // One value exists per (symbol, date) by the store's uniqueness
        // invariant, so collecting is the whole pivot.
        let mut by_date: BTreeMap<NaiveDate, DateCells> = BTreeMap::new();
        for symbol in &included {
            let column = column_name(symbol);
            for bar in self.store.query(symbol, start, end).await? {
                let cells = by_date.entry(bar.date).or_default();
                cells.ma_50.push((column.clone(), bar.ma_50));
                cells.ma_100.push((column.clone(), bar.ma_100));
            }
        }

        let mut dates_written = 0;
        for (date, cells) in &by_date {
            self.wide.upsert_row(WideTable::Ma50, *date, &cells.ma_50).await?;
            self.wide.upsert_row(WideTable::Ma100, *date, &cells.ma_100).await?;
            dates_written += 1;
        }

        info!(
            dates = dates_written,
            symbols = included.len(),
            "Aggregation pass complete"
        );

        Ok(AggregationReport {
            dates_written,
            symbols_included: included,
            symbols_excluded: excluded,
        })
    }

    /// Destructive full rebuild: drop both wide tables, then aggregate the
    /// store's entire date range.
    pub async fn rebuild(&self, symbols: &[String]) -> Result<AggregationReport> {
        self.wide.rebuild().await?;

        let Some(start) = self.store.first_date().await? else {
            warn!("Bar store is empty, rebuilt wide tables stay empty");
            return Ok(AggregationReport::default());
        };
        let end = self
            .store
            .last_date()
            .await?
            .unwrap_or_else(|| Utc::now().date_naive());

        self.aggregate_range(symbols, start, end).await
    }

    /// Incremental pass: only dates strictly after the last wide-table date.
    pub async fn incremental(
        &self,
        symbols: &[String],
        end_date: Option<NaiveDate>,
    ) -> Result<AggregationReport> {
        let end = end_date.unwrap_or_else(|| Utc::now().date_naive());

        let start = match self.wide.last_date(WideTable::Ma50).await? {
            Some(last) if last >= end => {
                info!(last = %last, "Wide tables already up to date");
                return Ok(AggregationReport::default());
            }
            Some(last) => last + Duration::days(1),
            None => self
                .store
                .first_date()
                .await?
                .unwrap_or_else(|| Utc::now().date_naive()),
        };

        self.aggregate_range(symbols, start, end).await
    }
}
