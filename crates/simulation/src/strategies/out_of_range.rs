//! Out-of-range rebalancing strategy.
//!
//! This strategy moves the range as soon as a swap lands outside of it.

use super::{RebalanceStrategy, ensure_ordered, shift_range};
use chrono::{DateTime, Utc};
use lp_backtest_domain::Result;

/// Rebalances whenever the tick leaves `[tick_lower, tick_upper]`.
///
/// Ticks equal to either bound count as in range.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutOfRangeRebalancer;

impl OutOfRangeRebalancer {
    /// Creates a new out-of-range strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RebalanceStrategy for OutOfRangeRebalancer {
    fn should_rebalance(
        &mut self,
        tick: i32,
        _timestamp: DateTime<Utc>,
        tick_lower: i32,
        tick_upper: i32,
        _created_at: DateTime<Utc>,
    ) -> Result<bool> {
        ensure_ordered(tick_lower, tick_upper)?;
        Ok(!(tick_lower <= tick && tick <= tick_upper))
    }

    fn rebalance(
        &mut self,
        tick: i32,
        tick_lower: i32,
        tick_upper: i32,
        bias: f64,
    ) -> Result<(i32, i32)> {
        shift_range(tick, tick_lower, tick_upper, bias)
    }

    fn name(&self) -> &'static str {
        "Out Of Range"
    }
}
