//! Prelude module for convenient imports.
//!
//! ```rust
//! use lp_backtest_simulation::prelude::*;
//! ```

// Activity
pub use crate::activity_tracker::{ActivityModel, ActivityTimeseries, ActivityTracker};

// Fees
pub use crate::fee_calculator::{FeeCalculator, FeeModel, FeeTimeseries};

// Runners
pub use crate::multi_runner::MultiPositionBacktestRunner;
pub use crate::runner::{BacktestRunner, RangeChange};

// Strategies
pub use crate::strategies::{
    LogicMode, MultiConditionRebalancer, OutOfRangeDurationRebalancer, OutOfRangeRebalancer,
    RebalanceClock, RebalanceStrategy, Rebalancer, TimeTriggeredRebalancer, compute_tick_range,
};
