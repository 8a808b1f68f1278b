//! Rebalancing strategies.
//!
//! Every strategy answers two questions for the runner: should the range move
//! at this swap, and where should it move to. Concrete strategies are gathered
//! in the closed [`Rebalancer`] set so that a batch of positions can each carry
//! a different policy.

mod multi_condition;
mod out_of_range;
mod out_of_range_duration;
mod time_triggered;

pub use multi_condition::{LogicMode, MultiConditionRebalancer};
pub use out_of_range::OutOfRangeRebalancer;
pub use out_of_range_duration::OutOfRangeDurationRebalancer;
pub use time_triggered::{RebalanceClock, TimeTriggeredRebalancer};

use chrono::{DateTime, Utc};
use lp_backtest_domain::{BacktestError, Result};

/// Shared capability of all rebalancing strategies.
///
/// Both operations fail with [`BacktestError::NotImplemented`] unless the
/// strategy provides them.
pub trait RebalanceStrategy {
    /// Decides whether the range `[tick_lower, tick_upper]` should move at this swap.
    fn should_rebalance(
        &mut self,
        _tick: i32,
        _timestamp: DateTime<Utc>,
        _tick_lower: i32,
        _tick_upper: i32,
        _created_at: DateTime<Utc>,
    ) -> Result<bool> {
        Err(BacktestError::NotImplemented("should_rebalance"))
    }

    /// Computes the new `(tick_lower, tick_upper)` around `tick`.
    fn rebalance(
        &mut self,
        _tick: i32,
        _tick_lower: i32,
        _tick_upper: i32,
        _bias: f64,
    ) -> Result<(i32, i32)> {
        Err(BacktestError::NotImplemented("rebalance"))
    }

    /// Returns the name of the strategy.
    fn name(&self) -> &'static str;
}

/// Closed set of the available strategies.
#[derive(Debug, Clone)]
pub enum Rebalancer {
    TimeTriggered(TimeTriggeredRebalancer),
    OutOfRange(OutOfRangeRebalancer),
    OutOfRangeDuration(OutOfRangeDurationRebalancer),
    MultiCondition(MultiConditionRebalancer),
}

impl Rebalancer {
    fn strategy_mut(&mut self) -> &mut dyn RebalanceStrategy {
        match self {
            Self::TimeTriggered(s) => s,
            Self::OutOfRange(s) => s,
            Self::OutOfRangeDuration(s) => s,
            Self::MultiCondition(s) => s,
        }
    }
}

impl RebalanceStrategy for Rebalancer {
    fn should_rebalance(
        &mut self,
        tick: i32,
        timestamp: DateTime<Utc>,
        tick_lower: i32,
        tick_upper: i32,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.strategy_mut()
            .should_rebalance(tick, timestamp, tick_lower, tick_upper, created_at)
    }

    fn rebalance(
        &mut self,
        tick: i32,
        tick_lower: i32,
        tick_upper: i32,
        bias: f64,
    ) -> Result<(i32, i32)> {
        self.strategy_mut()
            .rebalance(tick, tick_lower, tick_upper, bias)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::TimeTriggered(s) => s.name(),
            Self::OutOfRange(s) => s.name(),
            Self::OutOfRangeDuration(s) => s.name(),
            Self::MultiCondition(s) => s.name(),
        }
    }
}

impl From<TimeTriggeredRebalancer> for Rebalancer {
    fn from(s: TimeTriggeredRebalancer) -> Self {
        Self::TimeTriggered(s)
    }
}

impl From<OutOfRangeRebalancer> for Rebalancer {
    fn from(s: OutOfRangeRebalancer) -> Self {
        Self::OutOfRange(s)
    }
}

impl From<OutOfRangeDurationRebalancer> for Rebalancer {
    fn from(s: OutOfRangeDurationRebalancer) -> Self {
        Self::OutOfRangeDuration(s)
    }
}

impl From<MultiConditionRebalancer> for Rebalancer {
    fn from(s: MultiConditionRebalancer) -> Self {
        Self::MultiCondition(s)
    }
}

/// Computes a new range of `width` ticks around `tick`.
///
/// `bias` is the fraction of the width placed below `tick`:
/// - 0.5 centers the range on `tick`
/// - 0.0 puts the whole width above `tick` (token0-heavy)
/// - 1.0 puts the whole width below `tick` (token1-heavy)
///
/// # Errors
///
/// Returns [`BacktestError::InvalidBias`] if `bias` is outside `[0, 1]`.
pub fn compute_tick_range(tick: i32, width: i32, bias: f64) -> Result<(i32, i32)> {
    if !(0.0..=1.0).contains(&bias) {
        return Err(BacktestError::InvalidBias(bias));
    }

    let left = (f64::from(width) * bias).floor() as i32;
    let right = width - left;

    let lower = tick
        .checked_sub(left)
        .ok_or(BacktestError::ArithmeticOverflow("new tick_lower"))?;
    let upper = tick
        .checked_add(right)
        .ok_or(BacktestError::ArithmeticOverflow("new tick_upper"))?;
    Ok((lower, upper))
}

/// Rejects ranges whose upper bound sits below the lower bound.
///
/// Equal bounds are accepted here; strategies only need an ordered pair.
pub(crate) fn ensure_ordered(tick_lower: i32, tick_upper: i32) -> Result<()> {
    if tick_upper < tick_lower {
        return Err(BacktestError::invalid_range(tick_lower, tick_upper));
    }
    Ok(())
}

/// Shared `rebalance` body: keep the current width, move it around `tick`.
pub(crate) fn shift_range(tick: i32, tick_lower: i32, tick_upper: i32, bias: f64) -> Result<(i32, i32)> {
    ensure_ordered(tick_lower, tick_upper)?;
    let width = tick_upper
        .checked_sub(tick_lower)
        .ok_or(BacktestError::ArithmeticOverflow("range width"))?;
    compute_tick_range(tick, width, bias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::t0;
    use proptest::prelude::*;

    #[test]
    fn test_tick_range_with_bias() {
        assert_eq!(compute_tick_range(1500, 100, 0.25).unwrap(), (1475, 1575));
        assert_eq!(compute_tick_range(1500, 100, 0.5).unwrap(), (1450, 1550));
    }

    #[test]
    fn test_tick_range_extreme_biases() {
        assert_eq!(compute_tick_range(1500, 100, 0.0).unwrap(), (1500, 1600));
        assert_eq!(compute_tick_range(1500, 100, 1.0).unwrap(), (1400, 1500));
    }

    #[test]
    fn test_tick_range_floors_odd_widths() {
        // 101 * 0.5 = 50.5 -> 50 below, 51 above
        assert_eq!(compute_tick_range(0, 101, 0.5).unwrap(), (-50, 51));
    }

    #[test]
    fn test_bias_validation() {
        assert_eq!(
            compute_tick_range(1500, 100, -0.1),
            Err(BacktestError::InvalidBias(-0.1))
        );
        assert!(matches!(
            compute_tick_range(1500, 100, 1.1),
            Err(BacktestError::InvalidBias(_))
        ));
        assert!(matches!(
            compute_tick_range(1500, 100, f64::NAN),
            Err(BacktestError::InvalidBias(_))
        ));
    }

    #[test]
    fn test_shift_range_rejects_inverted_range() {
        assert_eq!(
            shift_range(1500, 2000, 1000, 0.5),
            Err(BacktestError::InvalidRange {
                tick_lower: 2000,
                tick_upper: 1000
            })
        );
    }

    #[derive(Debug)]
    struct Abstract;

    impl RebalanceStrategy for Abstract {
        fn name(&self) -> &'static str {
            "Abstract"
        }
    }

    #[test]
    fn test_base_strategy_is_not_implemented() {
        let mut strategy = Abstract;
        assert_eq!(
            strategy.should_rebalance(1500, t0(), 1000, 2000, t0()),
            Err(BacktestError::NotImplemented("should_rebalance"))
        );
        assert_eq!(
            strategy.rebalance(1500, 1000, 2000, 0.5),
            Err(BacktestError::NotImplemented("rebalance"))
        );
    }

    #[test]
    fn test_rebalancer_dispatch() {
        let mut rebalancer = Rebalancer::from(OutOfRangeRebalancer::new());
        assert_eq!(rebalancer.name(), "Out Of Range");
        assert!(rebalancer.should_rebalance(2100, t0(), 1000, 2000, t0()).unwrap());
        assert_eq!(rebalancer.rebalance(2100, 1000, 2000, 0.5).unwrap(), (1600, 2600));
    }

    proptest! {
        #[test]
        fn prop_tick_range_keeps_width(
            tick in -500_000i32..500_000,
            width in 0i32..200_000,
            bias in 0.0f64..=1.0,
        ) {
            let (lower, upper) = compute_tick_range(tick, width, bias).unwrap();
            prop_assert_eq!(upper - lower, width);
            prop_assert!(lower <= tick && tick <= upper);
        }
    }
}
