use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A two-token concentrated liquidity pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub address: String,
    pub token0: String,
    pub token1: String,
    /// Fee charged on swap volume, as a fraction (0.003 for a 0.3% tier).
    pub fee: Decimal,
}

impl Pool {
    pub fn new(
        address: impl Into<String>,
        token0: impl Into<String>,
        token1: impl Into<String>,
        fee: Decimal,
    ) -> Self {
        Self {
            address: address.into(),
            token0: token0.into(),
            token1: token1.into(),
            fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_pool() {
        let pool = Pool::new("0xabc", "ETH", "USDC", dec!(0.003));
        assert_eq!(pool.address, "0xabc");
        assert_eq!((pool.token0.as_str(), pool.token1.as_str()), ("ETH", "USDC"));
        assert_eq!(pool.fee, dec!(0.003));
    }
}
