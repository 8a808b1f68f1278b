//! Out-of-range duration rebalancing strategy.
//!
//! This strategy tolerates the price leaving the range for a while and only
//! moves the range once it has been out for at least `duration`.

use super::{RebalanceStrategy, ensure_ordered, shift_range};
use chrono::{DateTime, Duration, Utc};
use lp_backtest_domain::{BacktestError, Result};

/// Rebalances once the tick has been outside the range for `duration`.
///
/// The out-of-range timer is cleared whenever a swap lands back in range. By
/// default it is never started, so the elapsed time is measured from the
/// position's creation. With [`track_transitions`](Self::track_transitions)
/// the timer starts at the first out-of-range swap instead.
#[derive(Debug, Clone)]
pub struct OutOfRangeDurationRebalancer {
    /// How long the tick must stay out of range.
    pub duration: Duration,
    /// Start of the current out-of-range stretch, if recorded.
    pub out_of_range_since: Option<DateTime<Utc>>,
    /// Whether to record the start of each out-of-range stretch.
    pub track_transitions: bool,
}

impl OutOfRangeDurationRebalancer {
    /// Creates a new out-of-range duration strategy.
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::InvalidConfig`] if `duration` is negative.
    pub fn new(duration: Duration) -> Result<Self> {
        if duration < Duration::zero() {
            return Err(BacktestError::InvalidConfig(format!(
                "duration must be non-negative, got {duration}"
            )));
        }
        Ok(Self {
            duration,
            out_of_range_since: None,
            track_transitions: false,
        })
    }

    /// Sets whether the timer starts at the out-of-range transition.
    #[must_use]
    pub fn track_transitions(mut self, value: bool) -> Self {
        self.track_transitions = value;
        self
    }
}

impl RebalanceStrategy for OutOfRangeDurationRebalancer {
    fn should_rebalance(
        &mut self,
        tick: i32,
        timestamp: DateTime<Utc>,
        tick_lower: i32,
        tick_upper: i32,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        ensure_ordered(tick_lower, tick_upper)?;

        if tick_lower <= tick && tick <= tick_upper {
            self.out_of_range_since = None;
            return Ok(false);
        }

        if self.track_transitions && self.out_of_range_since.is_none() {
            self.out_of_range_since = Some(timestamp);
        }
        let reference_time = self.out_of_range_since.unwrap_or(created_at);
        Ok(timestamp - reference_time >= self.duration)
    }

    fn rebalance(
        &mut self,
        tick: i32,
        tick_lower: i32,
        tick_upper: i32,
        bias: f64,
    ) -> Result<(i32, i32)> {
        let new_range = shift_range(tick, tick_lower, tick_upper, bias)?;
        self.out_of_range_since = None;
        Ok(new_range)
    }

    fn name(&self) -> &'static str {
        "Out Of Range Duration"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::t0;

    fn strategy(seconds: i64) -> OutOfRangeDurationRebalancer {
        OutOfRangeDurationRebalancer::new(Duration::seconds(seconds)).unwrap()
    }

    #[test]
    fn test_waits_for_duration() {
        let mut s = strategy(30);
        let now = t0();

        assert!(!s.should_rebalance(950, now, 1000, 2000, now).unwrap());
        assert!(
            !s.should_rebalance(1500, now + Duration::seconds(20), 1000, 2000, now)
                .unwrap()
        );
        assert!(
            s.should_rebalance(2100, now + Duration::seconds(40), 1000, 2000, now)
                .unwrap()
        );
    }

    #[test]
    fn test_never_recovers() {
        let mut s = strategy(30);
        let now = t0();

        assert!(!s.should_rebalance(950, now, 1000, 2000, now).unwrap());
        assert!(
            !s.should_rebalance(950, now + Duration::seconds(15), 1000, 2000, now)
                .unwrap()
        );
        assert!(
            s.should_rebalance(950, now + Duration::seconds(31), 1000, 2000, now)
                .unwrap()
        );
    }

    #[test]
    fn test_zero_duration_triggers_immediately() {
        let mut s = strategy(0);
        assert!(s.should_rebalance(950, t0(), 1000, 2000, t0()).unwrap());
    }

    #[test]
    fn test_in_range_clears_timer() {
        let mut s = strategy(30).track_transitions(true);
        let now = t0();

        assert!(!s.should_rebalance(950, now, 1000, 2000, now).unwrap());
        assert_eq!(s.out_of_range_since, Some(now));

        assert!(
            !s.should_rebalance(1500, now + Duration::seconds(10), 1000, 2000, now)
                .unwrap()
        );
        assert_eq!(s.out_of_range_since, None);
    }

    #[test]
    fn test_default_timer_measures_from_creation() {
        let mut s = strategy(30);
        let created_at = t0();

        // in range for a long time, then out: the stretch just started but the
        // reference is still the creation time
        assert!(
            !s.should_rebalance(1500, created_at + Duration::seconds(100), 1000, 2000, created_at)
                .unwrap()
        );
        assert!(
            s.should_rebalance(2100, created_at + Duration::seconds(101), 1000, 2000, created_at)
                .unwrap()
        );
        assert_eq!(s.out_of_range_since, None);
    }

    #[test]
    fn test_tracked_timer_measures_from_transition() {
        let mut s = strategy(30).track_transitions(true);
        let created_at = t0();

        assert!(
            !s.should_rebalance(2100, created_at + Duration::seconds(101), 1000, 2000, created_at)
                .unwrap()
        );
        assert!(
            !s.should_rebalance(2100, created_at + Duration::seconds(120), 1000, 2000, created_at)
                .unwrap()
        );
        assert!(
            s.should_rebalance(2100, created_at + Duration::seconds(131), 1000, 2000, created_at)
                .unwrap()
        );

        s.rebalance(2100, 1000, 2000, 0.5).unwrap();
        assert_eq!(s.out_of_range_since, None);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut s = strategy(30).track_transitions(true);
        assert!(matches!(
            s.should_rebalance(950, t0(), 2000, 1000, t0()),
            Err(BacktestError::InvalidRange {
                tick_lower: 2000,
                tick_upper: 1000
            })
        ));
        // rejected before the timer is touched
        assert_eq!(s.out_of_range_since, None);

        assert!(matches!(
            s.rebalance(950, 2000, 1000, 0.5),
            Err(BacktestError::InvalidRange {
                tick_lower: 2000,
                tick_upper: 1000
            })
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert!(matches!(
            OutOfRangeDurationRebalancer::new(Duration::seconds(-5)),
            Err(BacktestError::InvalidConfig(_))
        ));
    }
}
