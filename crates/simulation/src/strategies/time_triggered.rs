//! Time-triggered rebalancing strategy.
//!
//! This strategy moves the range once a fixed interval has elapsed since the
//! last rebalance (or since the position was created), regardless of price.

use super::{RebalanceStrategy, ensure_ordered, shift_range};
use chrono::{DateTime, Duration, Utc};
use lp_backtest_domain::{BacktestError, Result};

/// Source of the timestamp recorded when a rebalance fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RebalanceClock {
    /// Record the real wall-clock time.
    #[default]
    WallClock,
    /// Record the timestamp of the last swap passed to `should_rebalance`.
    /// Repeated backtests over the same swaps then behave identically.
    Simulated,
}

/// Time-triggered rebalancing strategy.
#[derive(Debug, Clone)]
pub struct TimeTriggeredRebalancer {
    /// Minimum time between two rebalances.
    pub interval: Duration,
    /// When the last rebalance fired, if any.
    pub last_rebalanced_at: Option<DateTime<Utc>>,
    /// Where `last_rebalanced_at` is read from on rebalance.
    pub clock: RebalanceClock,
    last_evaluated_at: Option<DateTime<Utc>>,
}

impl TimeTriggeredRebalancer {
    /// Creates a new time-triggered strategy.
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::InvalidConfig`] if `interval` is negative.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval < Duration::zero() {
            return Err(BacktestError::InvalidConfig(format!(
                "interval must be non-negative, got {interval}"
            )));
        }
        Ok(Self {
            interval,
            last_rebalanced_at: None,
            clock: RebalanceClock::default(),
            last_evaluated_at: None,
        })
    }

    /// Sets the clock used to stamp rebalances.
    #[must_use]
    pub fn with_clock(mut self, clock: RebalanceClock) -> Self {
        self.clock = clock;
        self
    }
}

impl RebalanceStrategy for TimeTriggeredRebalancer {
    fn should_rebalance(
        &mut self,
        _tick: i32,
        timestamp: DateTime<Utc>,
        tick_lower: i32,
        tick_upper: i32,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        ensure_ordered(tick_lower, tick_upper)?;
        self.last_evaluated_at = Some(timestamp);

        let reference_time = self.last_rebalanced_at.unwrap_or(created_at);
        Ok(timestamp - reference_time >= self.interval)
    }

    fn rebalance(
        &mut self,
        tick: i32,
        tick_lower: i32,
        tick_upper: i32,
        bias: f64,
    ) -> Result<(i32, i32)> {
        let new_range = shift_range(tick, tick_lower, tick_upper, bias)?;

        // Without an evaluated swap the simulated clock has nothing to record.
        let stamp = match self.clock {
            RebalanceClock::WallClock => Some(Utc::now()),
            RebalanceClock::Simulated => self.last_evaluated_at,
        };
        if stamp.is_some() {
            self.last_rebalanced_at = stamp;
        }

        Ok(new_range)
    }

    fn name(&self) -> &'static str {
        "Time Triggered"
    }
}
