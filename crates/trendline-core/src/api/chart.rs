//! Daily-bar chart API client.
//!
//! Read-only access to a Yahoo-style chart endpoint returning daily OHLCV
//! series as parallel arrays keyed by unix timestamp.

use crate::types::DailyBar;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

/// Capability: fetch ordered daily bars for one symbol.
///
/// The pipeline only depends on this trait, so tests inject a canned
/// provider instead of the network client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch daily bars for `symbol` in `[start, end]`, ordered ascending
    /// by date. Fails with [`Error::NoData`] when the range yields nothing.
    async fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<DailyBar>>;
}

/// HTTP client for the chart endpoint.
pub struct ChartClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ChartClient {
    /// Default chart API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://query1.finance.yahoo.com/v8/finance/chart";

    /// Maximum retry attempts for API calls.
    const MAX_RETRIES: u32 = 3;

    pub fn new(base_url: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .connect_timeout(StdDuration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            http_client,
        }
    }

    /// Execute an HTTP GET with retry and exponential backoff.
    ///
    /// Retries on 5xx server errors and 429 rate-limit responses (with a
    /// longer backoff for 429). All other 4xx errors fail immediately.
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut last_error = None;

        for attempt in 0..Self::MAX_RETRIES {
            match self.http_client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response)
                    if response.status().as_u16() == 429 || response.status().is_server_error() =>
                {
                    let status = response.status();
                    let is_rate_limited = status.as_u16() == 429;
                    warn!(
                        attempt = attempt + 1,
                        status = %status,
                        url = url,
                        rate_limited = is_rate_limited,
                        "Retryable API error, backing off"
                    );
                    last_error = Some(Error::Api {
                        message: format!(
                            "{}: {}",
                            if is_rate_limited { "Rate limited" } else { "Server error" },
                            status
                        ),
                        status: Some(status.as_u16()),
                    });

                    if attempt + 1 < Self::MAX_RETRIES {
                        let backoff = if is_rate_limited {
                            StdDuration::from_millis(2000 * 2u64.pow(attempt))
                        } else {
                            StdDuration::from_millis(500 * 2u64.pow(attempt))
                        };
                        tokio::time::sleep(backoff).await;
                    }
                    continue;
                }
                Ok(response) => {
                    // Client error (4xx except 429), don't retry
                    return Err(Error::Api {
                        message: format!("API error: {}", response.status()),
                        status: Some(response.status().as_u16()),
                    });
                }
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        error = %e,
                        url = url,
                        "HTTP request failed, backing off"
                    );
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt + 1 < Self::MAX_RETRIES {
                let backoff = StdDuration::from_millis(500 * 2u64.pow(attempt));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or(Error::Api {
            message: "Max retries exceeded".to_string(),
            status: None,
        }))
    }
}

#[async_trait]
impl MarketData for ChartClient {
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>> {
        // The endpoint takes half-open unix-second bounds; push the end
        // bound to the following midnight so the last day is included.
        let period1 = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let period2 = end
            .succ_opt()
            .unwrap_or(end)
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            self.base_url, symbol, period1, period2
        );

        let response = self.get_with_retry(&url).await?;
        let body: ChartResponse = response.json().await?;

        let result = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| Error::NoData {
                symbol: symbol.to_string(),
            })?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .unwrap_or_default();

        let bars: Vec<DailyBar> = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = DateTime::from_timestamp(ts, 0)?.date_naive();
                Some(DailyBar {
                    date,
                    open: decimal_at(&quote.open, i),
                    high: decimal_at(&quote.high, i),
                    low: decimal_at(&quote.low, i),
                    close: decimal_at(&quote.close, i),
                    volume: quote.volume.get(i).copied().flatten(),
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(Error::NoData {
                symbol: symbol.to_string(),
            });
        }

        debug!(symbol = symbol, count = bars.len(), "Fetched daily bars");
        Ok(bars)
    }
}

fn decimal_at(values: &[Option<f64>], i: usize) -> Option<Decimal> {
    values
        .get(i)
        .copied()
        .flatten()
        .and_then(|v| Decimal::try_from(v).ok())
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_response_parsing() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1700006400, 1700092800],
                    "indicators": {
                        "quote": [{
                            "open": [185.8, 187.7],
                            "high": [186.0, 188.1],
                            "low": [184.2, 186.6],
                            "close": [185.6, null],
                            "volume": [52696900, null]
                        }]
                    }
                }],
                "error": null
            }
        }"#;

        let parsed: ChartResponse = serde_json::from_str(json).unwrap();
        let result = &parsed.chart.result.as_ref().unwrap()[0];
        assert_eq!(result.timestamp.len(), 2);
        let quote = &result.indicators.quote[0];
        assert_eq!(quote.close[0], Some(185.6));
        assert_eq!(quote.close[1], None);
        assert_eq!(quote.volume[0], Some(52696900));
    }

    #[test]
    fn test_empty_result_parses() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        let parsed: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.chart.result.is_none());
    }

    #[test]
    fn test_decimal_at_missing_cells() {
        let values = vec![Some(1.5), None];
        assert_eq!(decimal_at(&values, 0), Some(Decimal::new(15, 1)));
        assert_eq!(decimal_at(&values, 1), None);
        assert_eq!(decimal_at(&values, 2), None);
    }

    #[tokio::test]
    async fn test_mock_market_data() {
        let mut provider = MockMarketData::new();
        provider.expect_fetch_daily().returning(|symbol, _, _| {
            Err(Error::NoData {
                symbol: symbol.to_string(),
            })
        });

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let err = provider.fetch_daily("ZZZ", start, end).await.unwrap_err();
        assert!(matches!(err, Error::NoData { .. }));
    }
}
