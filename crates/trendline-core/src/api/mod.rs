//! External market-data clients.

pub mod chart;

pub use chart::{ChartClient, MarketData};
