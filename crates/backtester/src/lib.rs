//! Backtester
//!
//! Historical simulation of the MA50/MA100 crossover rule over stored
//! daily bars.
//!
//! # Example
//!
//! ```ignore
//! use backtester::CrossoverBacktester;
//!
//! let backtester = CrossoverBacktester::new(bar_store);
//! let result = backtester.run("AAPL", start, end, initial).await?;
//! println!("Final value: {}", result.final_value);
//! ```

pub mod simulator;

pub use simulator::{simulate, CrossoverBacktester, SimulationResult};
