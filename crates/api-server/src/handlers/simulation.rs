//! Simulation handler: replay the crossover rule for one symbol.

use axum::extract::State;
use axum::{Form, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use backtester::CrossoverBacktester;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// The strategy name this deployment supports.
const MA_CROSSOVER: &str = "ma_crossover";

/// Form payload for a simulation run.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RunSimulationRequest {
    /// Strategy identifier; only `ma_crossover` is supported.
    pub strategy: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Simulation start (YYYY-MM-DD).
    pub start_date: NaiveDate,
    /// Simulation end (YYYY-MM-DD).
    pub end_date: NaiveDate,
    /// Starting cash.
    pub initial_investment: Decimal,
}

/// Simulation response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimulationResponse {
    /// Cash plus position value at the last bar.
    pub final_value: Decimal,
    /// Percent return over the initial investment.
    pub total_return: Decimal,
    /// The replayed (date, close) series for rendering an equity curve.
    #[schema(value_type = Vec<Vec<String>>)]
    pub daily_prices: Vec<(NaiveDate, Decimal)>,
}

/// Run a crossover simulation over stored bars.
#[utoipa::path(
    post,
    path = "/run_simulation",
    tag = "simulation",
    request_body(
        content = RunSimulationRequest,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "Simulation result", body = SimulationResponse),
        (status = 400, description = "Unsupported strategy or invalid request", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    )
)]
pub async fn run_simulation(
    State(state): State<Arc<AppState>>,
    Form(request): Form<RunSimulationRequest>,
) -> ApiResult<Json<SimulationResponse>> {
    if request.strategy != MA_CROSSOVER {
        return Err(ApiError::BadRequest(format!(
            "Unsupported strategy: {}",
            request.strategy
        )));
    }

    if request.end_date <= request.start_date {
        return Err(ApiError::BadRequest(
            "End date must be after start date".to_string(),
        ));
    }

    if request.initial_investment <= Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "Initial investment must be positive".to_string(),
        ));
    }

    let backtester = CrossoverBacktester::new(state.bars.clone());
    let result = backtester
        .run(
            &request.symbol,
            request.start_date,
            request.end_date,
            request.initial_investment,
        )
        .await?;

    info!(
        symbol = %request.symbol,
        final_value = %result.final_value,
        return_pct = %result.total_return_pct,
        "Simulation completed"
    );

    Ok(Json(SimulationResponse {
        final_value: result.final_value,
        total_return: result.total_return_pct,
        daily_prices: result.daily_prices,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_form_decoding() {
        let body = "strategy=ma_crossover&symbol=AAPL&start_date=2023-01-01\
                    &end_date=2024-01-01&initial_investment=10000";
        let request: RunSimulationRequest = serde_urlencoded::from_str(body).unwrap();
        assert_eq!(request.strategy, "ma_crossover");
        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.initial_investment, Decimal::new(10_000, 0));
    }

    #[test]
    fn test_response_serialization() {
        let response = SimulationResponse {
            final_value: Decimal::new(12_000, 0),
            total_return: Decimal::new(20, 0),
            daily_prices: vec![(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                Decimal::new(100, 0),
            )],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""final_value":"12000""#));
        assert!(json.contains(r#"["2024-01-05","100"]"#));
    }
}
