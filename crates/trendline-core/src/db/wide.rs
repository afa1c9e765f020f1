//! Wide moving-average tables: one row per date, one column per symbol.
//!
//! Column identifiers are derived from symbols through a strict sanitizer
//! and always double-quoted; cell values are always bound parameters. The
//! column set only grows — symbols are added as they first appear and
//! nothing short of a full rebuild removes a column.

use crate::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::info;

/// Which wide table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WideTable {
    Ma50,
    Ma100,
}

impl WideTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            WideTable::Ma50 => "moving_average_50",
            WideTable::Ma100 => "moving_average_100",
        }
    }
}

/// Map a ticker symbol to its wide-table column identifier.
///
/// Lowercases and collapses anything outside `[a-z0-9]` to `_`, so symbols
/// like `BRK.B` or `^SPX` become valid quoted identifiers.
pub fn column_name(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writer for both wide tables.
#[derive(Clone)]
pub struct WideTables {
    pool: PgPool,
}

impl WideTables {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add the symbol's column to `table` if it does not exist yet.
    pub async fn ensure_column(&self, table: WideTable, symbol: &str) -> Result<()> {
        let column = column_name(symbol);
        let sql = format!(
            r#"ALTER TABLE {} ADD COLUMN IF NOT EXISTS "{}" NUMERIC(14, 6)"#,
            table.table_name(),
            column
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Symbol columns currently present in `table` (the date key excluded).
    pub async fn columns(&self, table: WideTable) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT column_name
            FROM information_schema.columns
            WHERE table_name = $1 AND column_name <> 'date'
            ORDER BY column_name
            "#,
        )
        .bind(table.table_name())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("column_name")).collect())
    }

    /// Most recent date present in `table`.
    pub async fn last_date(&self, table: WideTable) -> Result<Option<NaiveDate>> {
        let sql = format!("SELECT MAX(date) AS max_date FROM {}", table.table_name());
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Ok(row.get("max_date"))
    }

    /// Insert or replace one date's row, touching only the given columns.
    ///
    /// Columns absent from `cells` keep their current value, which is what
    /// lets symbols that dropped out of the source range retain history.
    pub async fn upsert_row(
        &self,
        table: WideTable,
        date: NaiveDate,
        cells: &[(String, Option<Decimal>)],
    ) -> Result<()> {
        if cells.is_empty() {
            return Ok(());
        }

        let columns: Vec<String> = cells.iter().map(|(c, _)| format!(r#""{}""#, c)).collect();
        let placeholders: Vec<String> = (0..cells.len()).map(|i| format!("${}", i + 2)).collect();
        let updates: Vec<String> = columns
            .iter()
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect();

        let sql = format!(
            "INSERT INTO {} (date, {}) VALUES ($1, {}) ON CONFLICT (date) DO UPDATE SET {}",
            table.table_name(),
            columns.join(", "),
            placeholders.join(", "),
            updates.join(", "),
        );

        let mut query = sqlx::query(&sql).bind(date);
        for (_, value) in cells {
            query = query.bind(value);
        }
        query.execute(&self.pool).await?;

        Ok(())
    }

    /// Drop and recreate both wide tables with only their date key.
    /// Destructive; the entry point for full rebuilds.
    pub async fn rebuild(&self) -> Result<()> {
        for table in [WideTable::Ma50, WideTable::Ma100] {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table.table_name()))
                .execute(&self.pool)
                .await?;
            sqlx::query(&format!(
                "CREATE TABLE {} (date DATE PRIMARY KEY)",
                table.table_name()
            ))
            .execute(&self.pool)
            .await?;
        }
        info!("Wide tables dropped and recreated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name_plain() {
        assert_eq!(column_name("AAPL"), "aapl");
        assert_eq!(column_name("msft"), "msft");
    }

    #[test]
    fn test_column_name_special_characters() {
        assert_eq!(column_name("BRK.B"), "brk_b");
        assert_eq!(column_name("^SPX"), "_spx");
        assert_eq!(column_name("BF-B"), "bf_b");
    }

    #[test]
    fn test_table_names() {
        assert_eq!(WideTable::Ma50.table_name(), "moving_average_50");
        assert_eq!(WideTable::Ma100.table_name(), "moving_average_100");
    }
}
