//! Tick, square-root price and liquidity math for concentrated liquidity.

pub mod concentrated_liquidity;
pub mod price_tick;

pub use concentrated_liquidity::{
    compute_liquidity_from_amounts, compute_token0_amount, compute_token1_amount,
    compute_token_amounts_from_liquidity,
};
pub use price_tick::{tick_to_price, tick_to_sqrt_price};
