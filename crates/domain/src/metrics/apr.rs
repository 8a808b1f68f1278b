//! Annualized return formulas.

use crate::error::{BacktestError, Result};
use rust_decimal::Decimal;

const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Annualizes a start/end performance ratio over `duration_days`, in percent.
fn annualize(start: Decimal, end: Decimal, duration_days: u32) -> Result<Decimal> {
    let performance = end
        .checked_div(start)
        .ok_or(BacktestError::ArithmeticOverflow("apr performance"))?;
    performance
        .checked_sub(Decimal::ONE)
        .and_then(|v| v.checked_mul(DAYS_PER_YEAR))
        .and_then(|v| v.checked_div(Decimal::from(duration_days)))
        .and_then(|v| v.checked_mul(HUNDRED))
        .ok_or(BacktestError::ArithmeticOverflow("apr annualization"))
}

/// APR of a single token balance, in percent.
///
/// Returns zero when `token_start` is zero or the duration is zero.
pub fn compute_token_native_apr(
    token_start: Decimal,
    token_end: Decimal,
    duration_days: u32,
) -> Result<Decimal> {
    if token_start.is_zero() || duration_days == 0 {
        return Ok(Decimal::ZERO);
    }
    annualize(token_start, token_end, duration_days)
}

/// APR of a two-token position valued in USD, in percent.
///
/// Start and end values are `amount0 * price0 + amount1 * price1`. Returns zero
/// when the duration is zero or the starting USD value is zero.
#[allow(clippy::too_many_arguments)]
pub fn compute_usd_apr(
    token0_start: Decimal,
    token0_end: Decimal,
    token1_start: Decimal,
    token1_end: Decimal,
    price0_start: Decimal,
    price0_end: Decimal,
    price1_start: Decimal,
    price1_end: Decimal,
    duration_days: u32,
) -> Result<Decimal> {
    if duration_days == 0 {
        return Ok(Decimal::ZERO);
    }

    let usd_start = usd_value(token0_start, price0_start, token1_start, price1_start)?;
    let usd_end = usd_value(token0_end, price0_end, token1_end, price1_end)?;

    if usd_start.is_zero() {
        return Ok(Decimal::ZERO);
    }

    annualize(usd_start, usd_end, duration_days)
}

fn usd_value(amount0: Decimal, price0: Decimal, amount1: Decimal, price1: Decimal) -> Result<Decimal> {
    let value0 = amount0
        .checked_mul(price0)
        .ok_or(BacktestError::ArithmeticOverflow("usd value of token0"))?;
    let value1 = amount1
        .checked_mul(price1)
        .ok_or(BacktestError::ArithmeticOverflow("usd value of token1"))?;
    value0
        .checked_add(value1)
        .ok_or(BacktestError::ArithmeticOverflow("usd value"))
}
