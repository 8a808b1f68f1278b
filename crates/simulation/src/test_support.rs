//! Shared fixtures for unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lp_backtest_domain::entities::{Pool, Position, Swap, SwapSeries};
use lp_backtest_domain::math::tick_to_sqrt_price;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
}

pub(crate) fn pool() -> Pool {
    Pool::new("0xPool", "ETH", "USDC", dec!(0.003))
}

pub(crate) fn position() -> Position {
    Position::new(1000, 2000, dec!(10), dec!(20000), pool())
}

pub(crate) fn position_in(tick_lower: i32, tick_upper: i32) -> Position {
    Position::new(tick_lower, tick_upper, dec!(10), dec!(20000), pool())
}

pub(crate) fn swap(
    tick: i32,
    volume_token0: Decimal,
    volume_token1: Decimal,
    timestamp: DateTime<Utc>,
) -> Swap {
    Swap {
        tick,
        volume_token0,
        volume_token1,
        liquidity: dec!(10000),
        timestamp,
        sqrt_price_x96: tick_to_sqrt_price(tick).unwrap(),
    }
}

/// Three swaps one minute apart: below, inside and above the 1000..2000 range.
pub(crate) fn basic_series() -> SwapSeries {
    SwapSeries::new(vec![
        swap(950, dec!(100), dec!(200), t0()),
        swap(1500, dec!(150), dec!(250), t0() + Duration::minutes(1)),
        swap(2100, dec!(200), dec!(300), t0() + Duration::minutes(2)),
    ])
}
