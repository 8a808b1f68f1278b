//! Domain model and numeric core for concentrated liquidity backtests.
//!
//! - [`math`]: tick / square-root price conversions and liquidity <-> amount formulas.
//! - [`metrics`]: annualized return formulas.
//! - [`entities`]: pools, positions and swap series.
//! - [`value_objects`]: fees and backtest results.

pub mod entities;
pub mod error;
pub mod math;
pub mod metrics;
pub mod value_objects;

pub use error::{BacktestError, Result};
