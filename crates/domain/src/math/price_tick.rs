use crate::error::{BacktestError, Result};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

/// Base of the tick-price exponential: `P = 1.0001 ^ tick`.
const TICK_BASE: Decimal = Decimal::from_parts(10001, 0, 0, false, 4);

/// Returns the price corresponding to a given tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal> {
    TICK_BASE
        .checked_powi(i64::from(tick))
        .ok_or(BacktestError::ArithmeticOverflow("tick_to_price"))
}

/// Returns the square root of the price at a given tick.
/// sqrt(P) = 1.0001 ^ (tick / 2)
///
/// Evaluated as `sqrt(1.0001) ^ tick` so the exponent stays integral and the
/// whole computation runs in decimal arithmetic. Tick 0 maps to exactly 1.
///
/// `Decimal` keeps at most 28 fractional digits, not 28 significant ones, so
/// precision falls off for very negative ticks: near the minimum tick
/// (-887272, about 5.42e-20) only nine or ten significant digits remain.
pub fn tick_to_sqrt_price(tick: i32) -> Result<Decimal> {
    let sqrt_base = TICK_BASE
        .sqrt()
        .ok_or(BacktestError::ArithmeticOverflow("tick_to_sqrt_price"))?;
    sqrt_base
        .checked_powi(i64::from(tick))
        .ok_or(BacktestError::ArithmeticOverflow("tick_to_sqrt_price"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick_zero_is_unit() {
        assert_eq!(tick_to_sqrt_price(0).unwrap(), Decimal::ONE);
        assert_eq!(tick_to_price(0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_tick_to_sqrt_price_small_ticks() {
        // 1.0001^0.5 ~= 1.00004999875
        let up = tick_to_sqrt_price(1).unwrap();
        assert!((up - dec!(1.00004999875)).abs() < dec!(0.00000001));

        // 1.0001^-0.5 ~= 0.99995000375
        let down = tick_to_sqrt_price(-1).unwrap();
        assert!((down - dec!(0.99995000375)).abs() < dec!(0.00000001));
    }

    #[test]
    fn test_tick_to_sqrt_price_large_ticks() {
        assert!(tick_to_sqrt_price(100_000).unwrap() > Decimal::ZERO);
        assert!(tick_to_sqrt_price(-100_000).unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_sqrt_price_squares_to_price() {
        let sqrt_p = tick_to_sqrt_price(100).unwrap();
        let p = tick_to_price(100).unwrap();
        assert!((sqrt_p * sqrt_p - p).abs() < dec!(0.000000000001));
        // Tick 100 -> Price 1.0001^100 ~= 1.010049
        assert!((p - dec!(1.01004966)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_tick_to_sqrt_price_min_tick_precision() {
        // 1.0001^(-887272 / 2) ~= 5.42121463104e-20
        let value = tick_to_sqrt_price(-887_272).unwrap();
        assert!(value > Decimal::ZERO);
        let expected = dec!(0.0000000000000000000542121463);
        assert!((value - expected).abs() < dec!(0.0000000000000000000000001));
        assert!(value.scale() <= 28);
    }

    proptest! {
        #[test]
        fn prop_sqrt_price_strictly_increasing(tick in -200_000i32..200_000) {
            let here = tick_to_sqrt_price(tick).unwrap();
            let next = tick_to_sqrt_price(tick + 1).unwrap();
            prop_assert!(next > here);
        }
    }
}
