//! API Server binary entrypoint.

use api_server::{ApiServer, ServerConfig};
use trendline_core::config::Config;
use trendline_core::db;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_server=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let core_config = Config::from_env()?;
    let pool = db::create_pool(&core_config.database).await?;
    db::ensure_schema(&pool).await?;

    // Create server config from environment
    let config = ServerConfig::from_env();

    // Create and run server
    let server = ApiServer::new(config, pool);
    server.run().await?;

    Ok(())
}
