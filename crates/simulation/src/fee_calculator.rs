//! Pro-rata fee attribution for a position.

use chrono::{DateTime, Utc};
use lp_backtest_domain::entities::{Position, Swap, SwapSeries};
use lp_backtest_domain::value_objects::Fee;
use lp_backtest_domain::{BacktestError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-swap fees aligned with the swap timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTimeseries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub fees: Vec<Fee>,
}

impl FeeTimeseries {
    /// Sum of every fee in the series, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::ArithmeticOverflow`] if the sum leaves the `Decimal` range.
    pub fn total(&self) -> Result<Fee> {
        self.fees.iter().try_fold(Fee::ZERO, |acc, fee| acc.checked_add(*fee))
    }
}

/// Trait to model the fees a position earns from a swap.
pub trait FeeModel {
    /// Returns the position's fee share of a single swap.
    fn compute_fee_for_swap(&self, position: &Position, swap: &Swap) -> Result<Fee>;

    /// Computes the fee of every swap in the series against the position's current range.
    fn track(&self, position: &Position, series: &SwapSeries) -> Result<FeeTimeseries> {
        let fees = series
            .iter()
            .map(|swap| self.compute_fee_for_swap(position, swap))
            .collect::<Result<Vec<_>>>()?;
        Ok(FeeTimeseries {
            timestamps: series.timestamps(),
            fees,
        })
    }
}

/// Default fee model.
///
/// The position's share is its liquidity over the combined liquidity of the
/// swap and the position:
/// share = L_position / (L_swap + L_position)
/// fee_i = share * volume_i * pool.fee
///
/// A position without liquidity earns nothing. A swap reporting zero pool
/// liquidity gives the position the whole nominal fee.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeCalculator;

impl FeeCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FeeModel for FeeCalculator {
    fn compute_fee_for_swap(&self, position: &Position, swap: &Swap) -> Result<Fee> {
        let liquidity = position.liquidity()?;
        if liquidity.is_zero() {
            return Ok(Fee::ZERO);
        }

        let share = swap
            .liquidity
            .checked_add(liquidity)
            .and_then(|combined| liquidity.checked_div(combined))
            .ok_or(BacktestError::ArithmeticOverflow("fee share"))?;
        let fee_share = |volume: Decimal| {
            share
                .checked_mul(volume)
                .and_then(|v| v.checked_mul(position.pool.fee))
                .ok_or(BacktestError::ArithmeticOverflow("fee for swap"))
        };

        Ok(Fee::new(
            fee_share(swap.volume_token0)?,
            fee_share(swap.volume_token1)?,
        ))
    }
}
