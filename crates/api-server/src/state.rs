//! Application state shared across handlers.

use sqlx::PgPool;

use trendline_core::db::bars::BarStore;
use trendline_core::db::portfolios::PortfolioRepository;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,
    /// Bar store read path.
    pub bars: BarStore,
}

impl AppState {
    /// Create a new application state.
    pub fn new(pool: PgPool) -> Self {
        let bars = BarStore::new(pool.clone());
        Self { pool, bars }
    }

    /// Portfolio stub repository over the shared pool.
    pub fn portfolios(&self) -> PortfolioRepository {
        PortfolioRepository::new(self.pool.clone())
    }
}
