//! Activity tracking: is the position's range earning fees at a given tick?

use chrono::{DateTime, Utc};
use lp_backtest_domain::entities::{Position, SwapSeries};
use serde::{Deserialize, Serialize};

/// Per-swap activity flags aligned with the swap timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimeseries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub activity: Vec<bool>,
}

impl ActivityTimeseries {
    /// Share of swaps during which the position was active, between 0 and 1.
    #[must_use]
    pub fn time_in_range(&self) -> f64 {
        if self.activity.is_empty() {
            return 0.0;
        }
        let active = self.activity.iter().filter(|a| **a).count();
        active as f64 / self.activity.len() as f64
    }
}

/// Trait to model whether a position participates in a swap.
pub trait ActivityModel {
    /// Returns true if the position earns fees at `tick`.
    fn is_active(&self, position: &Position, tick: i32) -> bool;

    /// Evaluates every swap of the series against the position's current range.
    fn track(&self, position: &Position, series: &SwapSeries) -> ActivityTimeseries {
        ActivityTimeseries {
            timestamps: series.timestamps(),
            activity: series
                .iter()
                .map(|swap| self.is_active(position, swap.tick))
                .collect(),
        }
    }
}

/// Default activity model: active iff `tick_lower <= tick <= tick_upper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityTracker;

impl ActivityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ActivityModel for ActivityTracker {
    fn is_active(&self, position: &Position, tick: i32) -> bool {
        position.contains_tick(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{basic_series, position, position_in};
    use proptest::prelude::*;

    #[test]
    fn test_is_active_inclusive_bounds() {
        let tracker = ActivityTracker::new();
        let position = position();
        assert!(tracker.is_active(&position, 1000));
        assert!(tracker.is_active(&position, 1500));
        assert!(tracker.is_active(&position, 2000));
        assert!(!tracker.is_active(&position, 999));
        assert!(!tracker.is_active(&position, 2001));
    }

    #[test]
    fn test_track_series() {
        let tracker = ActivityTracker::new();
        let series = basic_series();
        let tracked = tracker.track(&position(), &series);

        assert_eq!(tracked.activity, vec![false, true, false]);
        assert_eq!(tracked.timestamps, series.timestamps());
        assert!((tracked.time_in_range() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_track_empty_series() {
        let tracked = ActivityTracker::new().track(&position(), &SwapSeries::default());
        assert!(tracked.activity.is_empty());
        assert!(tracked.timestamps.is_empty());
        assert_eq!(tracked.time_in_range(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_is_active_matches_range(
            tick in -1_000_000i32..1_000_000,
            lower in -1_000_000i32..1_000_000,
            width in 1i32..100_000,
        ) {
            let position = position_in(lower, lower + width);
            let expected = lower <= tick && tick <= lower + width;
            prop_assert_eq!(ActivityTracker.is_active(&position, tick), expected);
        }
    }
}
