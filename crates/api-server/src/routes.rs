//! API route definitions.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{health, historical, portfolios, simulation};
use crate::state::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trendline API",
        version = "1.0.0",
        description = "Historical daily-bar series and moving-average crossover simulations"
    ),
    paths(
        health::health_check,
        health::readiness,
        historical::get_historical_data,
        simulation::run_simulation,
        portfolios::list_users,
        portfolios::create_user,
        portfolios::list_user_portfolios,
        portfolios::create_portfolio,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            health::HealthResponse,
            historical::HistoricalPoint,
            simulation::RunSimulationRequest,
            simulation::SimulationResponse,
            portfolios::CreateUserRequest,
            portfolios::CreatePortfolioRequest,
            portfolios::UserResponse,
            portfolios::PortfolioResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "historical", description = "Historical price series"),
        (name = "simulation", description = "Crossover strategy simulation"),
        (name = "portfolios", description = "User and portfolio stubs"),
    )
)]
pub struct ApiDoc;

/// Create the main router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))

        // Historical series
        .route("/api/historical-data", get(historical::get_historical_data))

        // Simulation
        .route("/run_simulation", post(simulation::run_simulation))

        // User/portfolio stubs
        .route("/api/v1/users", get(portfolios::list_users))
        .route("/api/v1/users", post(portfolios::create_user))
        .route(
            "/api/v1/users/{user_id}/portfolios",
            get(portfolios::list_user_portfolios),
        )
        .route("/api/v1/portfolios", post(portfolios::create_portfolio))

        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))

        // Add state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("Trendline API"));
        assert!(json.contains("/api/historical-data"));
        assert!(json.contains("/run_simulation"));
    }
}
