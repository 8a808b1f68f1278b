use crate::error::{BacktestError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fees denominated in each of the pool's two tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub token0: Decimal,
    pub token1: Decimal,
}

impl Fee {
    pub const ZERO: Self = Self {
        token0: Decimal::ZERO,
        token1: Decimal::ZERO,
    };

    #[must_use]
    pub fn new(token0: Decimal, token1: Decimal) -> Self {
        Self { token0, token1 }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.token0.is_zero() && self.token1.is_zero()
    }

    /// Adds two fees token by token.
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::ArithmeticOverflow`] if either sum leaves the
    /// `Decimal` range.
    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        let token0 = self
            .token0
            .checked_add(rhs.token0)
            .ok_or(BacktestError::ArithmeticOverflow("fee token0 sum"))?;
        let token1 = self
            .token1
            .checked_add(rhs.token1)
            .ok_or(BacktestError::ArithmeticOverflow("fee token1 sum"))?;
        Ok(Self { token0, token1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checked_add() {
        let sum = Fee::new(dec!(1.5), dec!(2)).checked_add(Fee::new(dec!(0.5), dec!(3))).unwrap();
        assert_eq!(sum, Fee::new(dec!(2), dec!(5)));
    }

    #[test]
    fn test_checked_add_overflow() {
        let result = Fee::new(Decimal::MAX, Decimal::ONE).checked_add(Fee::new(Decimal::ONE, Decimal::ONE));
        assert_eq!(result, Err(BacktestError::ArithmeticOverflow("fee token0 sum")));
    }
}
