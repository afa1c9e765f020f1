//! Ingestor
//!
//! ETL entry point: backfill, daily incremental update, wide-table
//! aggregation, and database reset.

mod aggregate;
mod pipeline;
mod universe;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aggregate::WideAggregator;
use pipeline::Ingestor;
use trendline_core::api::ChartClient;
use trendline_core::config::Config;
use trendline_core::db::bars::BarStore;
use trendline_core::db::wide::WideTables;
use trendline_core::db;

#[derive(Parser)]
#[command(name = "ingestor", about = "Daily-bar ingestion and aggregation jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch full history for the universe and upsert into the bar store.
    Backfill {
        /// Comma-separated symbols; defaults to the built-in universe.
        #[arg(long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,
    },
    /// Fetch and upsert only bars newer than the last ingested date.
    DailyUpdate {
        /// Target end date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Comma-separated symbols; defaults to the built-in universe.
        #[arg(long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,
    },
    /// Rebuild or extend the wide moving-average tables.
    Aggregate {
        /// Drop and recreate both wide tables before aggregating.
        #[arg(long)]
        rebuild: bool,
        /// Target end date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Comma-separated symbols; defaults to the built-in universe.
        #[arg(long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,
    },
    /// Drop and recreate every table. Destructive.
    ResetDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ingestor=info,trendline_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database).await?;
    db::ensure_schema(&pool).await?;

    let store = BarStore::new(pool.clone());

    match cli.command {
        Command::Backfill { symbols } => {
            let symbols = symbols.unwrap_or_else(universe::default_symbols);
            let provider = Arc::new(ChartClient::new(config.market_data.base_url.clone()));
            let ingestor = Ingestor::new(store, provider, config.ingest.clone());

            info!(symbols = symbols.len(), "Starting backfill");
            let summary = ingestor.backfill(&symbols).await?;
            info!(?summary, "Backfill finished");
        }
        Command::DailyUpdate { end_date, symbols } => {
            let symbols = symbols.unwrap_or_else(universe::default_symbols);
            let provider = Arc::new(ChartClient::new(config.market_data.base_url.clone()));
            let ingestor = Ingestor::new(store, provider, config.ingest.clone());

            info!(symbols = symbols.len(), "Starting daily update");
            let summary = ingestor.daily_update(&symbols, end_date).await?;
            info!(?summary, "Daily update finished");
        }
        Command::Aggregate {
            rebuild,
            end_date,
            symbols,
        } => {
            let symbols = symbols.unwrap_or_else(universe::default_symbols);
            let aggregator = WideAggregator::new(store, WideTables::new(pool.clone()));

            let report = if rebuild {
                info!("Starting full wide-table rebuild");
                aggregator.rebuild(&symbols).await?
            } else {
                info!("Starting incremental wide-table update");
                aggregator.incremental(&symbols, end_date).await?
            };
            info!(
                dates = report.dates_written,
                included = report.symbols_included.len(),
                excluded = report.symbols_excluded.len(),
                "Aggregation finished"
            );
        }
        Command::ResetDb => {
            db::reset_schema(&pool).await?;
            info!("All tables dropped and recreated");
        }
    }

    Ok(())
}
