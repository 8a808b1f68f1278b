use crate::error::{BacktestError, Result};
use crate::math::price_tick::tick_to_sqrt_price;
use rust_decimal::Decimal;

/// Calculates the liquidity backed by a pair of token amounts over a tick range.
///
/// Both tokens are assumed to be deposited at once, so the result is bounded by
/// the scarcer asset:
/// L0 = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
/// L1 = amount1 / (sqrt(P_b) - sqrt(P_a))
/// L  = min(L0, L1)
///
/// # Errors
///
/// Returns [`BacktestError::InvalidRange`] when `tick_lower >= tick_upper`.
pub fn compute_liquidity_from_amounts(
    tick_lower: i32,
    tick_upper: i32,
    amount0: Decimal,
    amount1: Decimal,
) -> Result<Decimal> {
    if tick_lower >= tick_upper {
        return Err(BacktestError::invalid_range(tick_lower, tick_upper));
    }

    let sqrt_pa = tick_to_sqrt_price(tick_lower)?;
    let sqrt_pb = tick_to_sqrt_price(tick_upper)?;
    let den = price_span(sqrt_pa, sqrt_pb)?;

    let liquidity0 = amount0
        .checked_mul(sqrt_pa)
        .and_then(|v| v.checked_mul(sqrt_pb))
        .and_then(|v| v.checked_div(den))
        .ok_or(BacktestError::ArithmeticOverflow("liquidity for amount0"))?;
    let liquidity1 = amount1
        .checked_div(den)
        .ok_or(BacktestError::ArithmeticOverflow("liquidity for amount1"))?;

    Ok(liquidity0.min(liquidity1))
}

fn price_span(sqrt_pa: Decimal, sqrt_pb: Decimal) -> Result<Decimal> {
    sqrt_pb
        .checked_sub(sqrt_pa)
        .ok_or(BacktestError::ArithmeticOverflow("sqrt price span"))
}

/// Calculates the amount of token0 (x) required for a liquidity over a price range.
/// delta_x = L * (sqrt(P_b) - sqrt(P_a)) / (sqrt(P_b) * sqrt(P_a))
pub fn compute_token0_amount(liquidity: Decimal, sqrt_pa: Decimal, sqrt_pb: Decimal) -> Result<Decimal> {
    let span = price_span(sqrt_pa, sqrt_pb)?;
    let product = sqrt_pb
        .checked_mul(sqrt_pa)
        .ok_or(BacktestError::ArithmeticOverflow("compute_token0_amount"))?;
    liquidity
        .checked_mul(span)
        .and_then(|v| v.checked_div(product))
        .ok_or(BacktestError::ArithmeticOverflow("compute_token0_amount"))
}

/// Calculates the amount of token1 (y) required for a liquidity over a price range.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a))
pub fn compute_token1_amount(liquidity: Decimal, sqrt_pa: Decimal, sqrt_pb: Decimal) -> Result<Decimal> {
    liquidity
        .checked_mul(price_span(sqrt_pa, sqrt_pb)?)
        .ok_or(BacktestError::ArithmeticOverflow("compute_token1_amount"))
}

/// Converts a liquidity over a tick range back into `(amount0, amount1)`.
///
/// Useful for estimating the balance held at mint or at burn.
pub fn compute_token_amounts_from_liquidity(
    liquidity: Decimal,
    tick_lower: i32,
    tick_upper: i32,
) -> Result<(Decimal, Decimal)> {
    let sqrt_pa = tick_to_sqrt_price(tick_lower)?;
    let sqrt_pb = tick_to_sqrt_price(tick_upper)?;

    let amount0 = compute_token0_amount(liquidity, sqrt_pa, sqrt_pb)?;
    let amount1 = compute_token1_amount(liquidity, sqrt_pa, sqrt_pb)?;

    Ok((amount0, amount1))
}
