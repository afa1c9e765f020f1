//! Historical-series handler: close prices with day-over-day returns.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use trendline_core::types::Bar;

/// Query parameters for the historical-data endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoricalQuery {
    /// Ticker symbol.
    pub symbol: Option<String>,
    /// Range start (YYYY-MM-DD).
    pub start_date: Option<NaiveDate>,
    /// Range end (YYYY-MM-DD); defaults to today.
    pub end_date: Option<NaiveDate>,
}

/// One historical data point.
///
/// `Daily_Return` is an explicit null wherever no valid prior close
/// exists; the serialization type makes NaN or infinity unrepresentable.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoricalPoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Close")]
    pub close: Decimal,
    #[serde(rename = "Daily_Return")]
    pub daily_return: Option<Decimal>,
}

/// Attach day-over-day percent returns to an ordered bar series.
///
/// The first record has no return. A zero prior close cannot produce a
/// ratio, so the row gets null and the next row computes against the
/// nearest prior valid close instead.
pub fn daily_returns(bars: &[Bar]) -> Vec<HistoricalPoint> {
    let mut points = Vec::with_capacity(bars.len());
    let mut prev_valid: Option<Decimal> = None;

    for bar in bars {
        let daily_return = prev_valid.map(|prev| (bar.close_price - prev) / prev);
        points.push(HistoricalPoint {
            date: bar.date,
            close: bar.close_price,
            daily_return,
        });
        if bar.close_price != Decimal::ZERO {
            prev_valid = Some(bar.close_price);
        }
    }

    points
}

/// Historical close prices and daily returns for one symbol.
#[utoipa::path(
    get,
    path = "/api/historical-data",
    tag = "historical",
    params(HistoricalQuery),
    responses(
        (status = 200, description = "Ordered series of date, close, daily return", body = Vec<HistoricalPoint>),
        (status = 400, description = "Missing symbol or start date", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_historical_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoricalQuery>,
) -> ApiResult<Json<Vec<HistoricalPoint>>> {
    let symbol = query
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No symbol provided".to_string()))?;

    let start_date = query
        .start_date
        .ok_or_else(|| ApiError::BadRequest("No start date provided".to_string()))?;
    let end_date = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let bars = state.bars.query(symbol, start_date, end_date).await?;
    Ok(Json(daily_returns(&bars)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: i64) -> Bar {
        Bar {
            symbol: "AAPL".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            close_price: Decimal::new(close, 0),
            ma_50: None,
            ma_100: None,
            volume: None,
        }
    }

    #[test]
    fn test_first_return_is_null() {
        let points = daily_returns(&[bar(1, 100), bar(2, 110)]);
        assert!(points[0].daily_return.is_none());
        assert_eq!(points[1].daily_return, Some(Decimal::new(1, 1))); // +10%
    }

    #[test]
    fn test_zero_close_yields_null_and_skips() {
        let points = daily_returns(&[bar(1, 100), bar(2, 0), bar(3, 110)]);
        // Day 2: return against 100 is valid (-100%), but a zero close is
        // not a valid divisor for day 3, which falls back to day 1's close.
        assert_eq!(points[1].daily_return, Some(Decimal::new(-1, 0)));
        assert_eq!(points[2].daily_return, Some(Decimal::new(1, 1)));
    }

    #[test]
    fn test_leading_zero_close_has_no_return() {
        let points = daily_returns(&[bar(1, 0), bar(2, 110)]);
        assert!(points[0].daily_return.is_none());
        assert!(points[1].daily_return.is_none());
    }

    #[test]
    fn test_null_serializes_as_json_null() {
        let points = daily_returns(&[bar(1, 100)]);
        let json = serde_json::to_string(&points).unwrap();
        assert!(json.contains(r#""Daily_Return":null"#));
        assert!(json.contains(r#""Date":"2024-05-01""#));
        assert!(json.contains(r#""Close":"100""#));
    }

    #[test]
    fn test_empty_series() {
        assert!(daily_returns(&[]).is_empty());
    }
}
