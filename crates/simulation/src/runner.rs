//! Single-position backtest runner.
//!
//! The runner walks a swap series in the order given, letting the optional
//! rebalancer move the position's range before activity and fees are
//! evaluated for each swap.

use crate::activity_tracker::{ActivityModel, ActivityTimeseries, ActivityTracker};
use crate::fee_calculator::{FeeCalculator, FeeModel, FeeTimeseries};
use crate::strategies::{RebalanceStrategy, Rebalancer};
use chrono::{DateTime, Utc};
use lp_backtest_domain::entities::{Position, Swap, SwapSeries};
use lp_backtest_domain::metrics::compute_usd_apr;
use lp_backtest_domain::value_objects::{BacktestResult, Fee};
use lp_backtest_domain::{BacktestError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A range change applied during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeChange {
    /// Timestamp of the swap that triggered the change.
    pub timestamp: DateTime<Utc>,
    /// Tick the new range was placed around.
    pub tick: i32,
    /// Range before the change.
    pub old_range: (i32, i32),
    /// Range after the change.
    pub new_range: (i32, i32),
}

/// Replays a swap series against one position.
#[derive(Debug, Clone)]
pub struct BacktestRunner<A = ActivityTracker, F = FeeCalculator> {
    position: Position,
    swap_series: SwapSeries,
    tracker: A,
    calculator: F,
    rebalancer: Option<Rebalancer>,
    rebalance_bias: f64,
    created_at: DateTime<Utc>,
    activity_series: ActivityTimeseries,
    fee_series: FeeTimeseries,
    range_history: Vec<RangeChange>,
}

impl<A: ActivityModel, F: FeeModel> BacktestRunner<A, F> {
    /// Creates a runner over `swaps`, which must already be in ascending time order.
    ///
    /// `created_at` defaults to the first swap's timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::EmptySeries`] if there are no swaps.
    pub fn new(
        position: Position,
        swaps: impl Into<SwapSeries>,
        tracker: A,
        calculator: F,
        rebalance_bias: f64,
    ) -> Result<Self> {
        let swap_series = swaps.into();
        let created_at = swap_series
            .first()
            .map(|s| s.timestamp)
            .ok_or(BacktestError::EmptySeries)?;

        Ok(Self {
            position,
            swap_series,
            tracker,
            calculator,
            rebalancer: None,
            rebalance_bias,
            created_at,
            activity_series: ActivityTimeseries::default(),
            fee_series: FeeTimeseries::default(),
            range_history: Vec::new(),
        })
    }

    /// Sets the rebalancing strategy.
    #[must_use]
    pub fn with_rebalancer(mut self, rebalancer: impl Into<Rebalancer>) -> Self {
        self.rebalancer = Some(rebalancer.into());
        self
    }

    /// Sets the rebalancing strategy, or removes it with `None`.
    #[must_use]
    pub fn with_optional_rebalancer(mut self, rebalancer: Option<Rebalancer>) -> Self {
        self.rebalancer = rebalancer;
        self
    }

    /// Overrides the position creation time handed to the rebalancer.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets the bias used to place rebalanced ranges.
    pub fn set_rebalance_bias(&mut self, bias: f64) {
        self.rebalance_bias = bias;
    }

    /// Runs the backtest.
    ///
    /// The position is updated in place when a rebalance fires, so after this
    /// call [`position`](Self::position) reflects the final range. Calling `run`
    /// again continues from that range with fresh totals.
    ///
    /// # Errors
    ///
    /// Propagates strategy, liquidity and arithmetic errors; the first one
    /// aborts the run.
    pub fn run(&mut self) -> Result<BacktestResult> {
        let mut total_fees = Fee::ZERO;
        let mut activity = Vec::with_capacity(self.swap_series.len());
        let mut fees = Vec::with_capacity(self.swap_series.len());
        self.range_history.clear();

        let initial_token0 = self.position.amount0;
        let initial_token1 = self.position.amount1;

        for swap in &self.swap_series.swaps {
            if let Some(rebalancer) = self.rebalancer.as_mut() {
                if rebalancer.should_rebalance(
                    swap.tick,
                    swap.timestamp,
                    self.position.tick_lower,
                    self.position.tick_upper,
                    self.created_at,
                )? {
                    let old_range = (self.position.tick_lower, self.position.tick_upper);
                    let (new_lower, new_upper) = rebalancer.rebalance(
                        swap.tick,
                        self.position.tick_lower,
                        self.position.tick_upper,
                        self.rebalance_bias,
                    )?;
                    self.position.set_range(new_lower, new_upper);

                    debug!(
                        strategy = rebalancer.name(),
                        tick = swap.tick,
                        timestamp = %swap.timestamp,
                        old_lower = old_range.0,
                        old_upper = old_range.1,
                        new_lower,
                        new_upper,
                        "Rebalanced position"
                    );
                    self.range_history.push(RangeChange {
                        timestamp: swap.timestamp,
                        tick: swap.tick,
                        old_range,
                        new_range: (new_lower, new_upper),
                    });
                }
            }

            let is_active = self.tracker.is_active(&self.position, swap.tick);
            activity.push(is_active);

            let fee = self.calculator.compute_fee_for_swap(&self.position, swap)?;
            fees.push(fee);

            if is_active {
                total_fees = total_fees.checked_add(fee)?;
            }
        }

        let timestamps = self.swap_series.timestamps();
        self.activity_series = ActivityTimeseries {
            timestamps: timestamps.clone(),
            activity,
        };
        self.fee_series = FeeTimeseries { timestamps, fees };

        let end_token0 = initial_token0
            .checked_add(total_fees.token0)
            .ok_or(BacktestError::ArithmeticOverflow("end token0 balance"))?;
        let end_token1 = initial_token1
            .checked_add(total_fees.token1)
            .ok_or(BacktestError::ArithmeticOverflow("end token1 balance"))?;

        // new() guarantees at least one swap
        let (first, last) = match (self.swap_series.first(), self.swap_series.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(BacktestError::EmptySeries),
        };
        let price0_start = token0_price(first)?;
        let price0_end = token0_price(last)?;
        // token1 is the USD numeraire
        let price1 = Decimal::ONE;

        let duration_days = duration_days(first.timestamp, last.timestamp);

        let apr = compute_usd_apr(
            initial_token0,
            end_token0,
            initial_token1,
            end_token1,
            price0_start,
            price0_end,
            price1,
            price1,
            duration_days,
        )?;

        info!(
            swaps = self.swap_series.len(),
            rebalances = self.range_history.len(),
            fees_token0 = %total_fees.token0,
            fees_token1 = %total_fees.token1,
            apr = %apr,
            "Backtest finished"
        );

        Ok(BacktestResult {
            total_fees_token0: total_fees.token0,
            total_fees_token1: total_fees.token1,
            apr,
        })
    }

    /// The position, reflecting the latest range.
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Consumes the runner and returns the position.
    #[must_use]
    pub fn into_position(self) -> Position {
        self.position
    }

    #[must_use]
    pub fn swap_series(&self) -> &SwapSeries {
        &self.swap_series
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Activity of the last run, one flag per swap.
    #[must_use]
    pub fn activity_series(&self) -> &ActivityTimeseries {
        &self.activity_series
    }

    /// Fees of the last run, one entry per swap, active or not.
    #[must_use]
    pub fn fee_series(&self) -> &FeeTimeseries {
        &self.fee_series
    }

    /// Range changes applied during the last run.
    #[must_use]
    pub fn range_history(&self) -> &[RangeChange] {
        &self.range_history
    }

    #[must_use]
    pub fn rebalance_count(&self) -> usize {
        self.range_history.len()
    }

    /// The rebalancing strategy with whatever state it built up during the last run.
    #[must_use]
    pub fn rebalancer(&self) -> Option<&Rebalancer> {
        self.rebalancer.as_ref()
    }
}

/// Price of token0 in token1 units: the swap's square-root price, squared.
fn token0_price(swap: &Swap) -> Result<Decimal> {
    swap.sqrt_price_x96
        .checked_mul(swap.sqrt_price_x96)
        .ok_or(BacktestError::ArithmeticOverflow("token0 price from sqrt price"))
}

/// Whole days between the first and last swap, never less than one.
fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let days = (end - start).num_days();
    if days < 0 {
        warn!(%start, %end, "Swap series is not in ascending time order");
    }
    u32::try_from(days).ok().filter(|d| *d > 0).unwrap_or(1)
}
