//! Configuration management for the trendline system.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub market_data: MarketDataConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketDataConfig {
    pub base_url: Option<String>,
}

/// Tuning knobs for the ingestion pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Rows per upsert transaction.
    pub batch_size: usize,
    /// Attempts per batch when the store reports lock contention.
    pub max_retries: u32,
    /// Fixed wait between lock retries, seconds.
    pub retry_backoff_secs: u64,
    /// Earliest date fetched by a full backfill.
    pub history_start: NaiveDate,
    /// Calendar days of history fetched by an incremental run so the
    /// 100-day window is always fully populated.
    pub lookback_days: i64,
}

impl IngestConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_retries: 5,
            retry_backoff_secs: 5,
            history_start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            lookback_days: 220,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = IngestConfig::default();

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| Error::Config {
                    message: "DATABASE_URL environment variable not set".to_string(),
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
            market_data: MarketDataConfig {
                base_url: env::var("MARKET_DATA_BASE_URL").ok(),
            },
            ingest: IngestConfig {
                batch_size: env::var("INGEST_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.batch_size),
                max_retries: env::var("INGEST_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_retries),
                retry_backoff_secs: env::var("INGEST_RETRY_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.retry_backoff_secs),
                history_start: env::var("INGEST_HISTORY_START")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.history_start),
                lookback_days: env::var("INGEST_LOOKBACK_DAYS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.lookback_days),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_backoff(), Duration::from_secs(5));
        assert_eq!(config.history_start.to_string(), "2000-01-01");
    }
}
