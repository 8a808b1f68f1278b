use crate::entities::pool::Pool;
use crate::error::Result;
use crate::math::concentrated_liquidity::compute_liquidity_from_amounts;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic identifier of a position: lower tick, upper tick and creation
/// time, each rendered in hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(pub String);

impl PositionId {
    #[must_use]
    pub fn generate(tick_lower: i32, tick_upper: i32, created_at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}_{}_{}",
            signed_hex(i64::from(tick_lower)),
            signed_hex(i64::from(tick_upper)),
            signed_hex(created_at.timestamp())
        ))
    }
}

fn signed_hex(value: i64) -> String {
    if value < 0 {
        format!("-{:x}", value.unsigned_abs())
    } else {
        format!("{value:x}")
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A liquidity position over `[tick_lower, tick_upper]`.
///
/// Token amounts are fixed for the lifetime of a backtest; only the range moves
/// when a rebalance fires. Range ordering is checked by the operations that
/// consume it, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0: Decimal,
    pub amount1: Decimal,
    pub pool: Pool,
}

impl Position {
    #[must_use]
    pub fn new(tick_lower: i32, tick_upper: i32, amount0: Decimal, amount1: Decimal, pool: Pool) -> Self {
        Self {
            tick_lower,
            tick_upper,
            amount0,
            amount1,
            pool,
        }
    }

    /// Liquidity implied by the current range and token amounts.
    ///
    /// Recomputed on every call since the range changes during a run.
    pub fn liquidity(&self) -> Result<Decimal> {
        compute_liquidity_from_amounts(self.tick_lower, self.tick_upper, self.amount0, self.amount1)
    }

    /// Whether `tick` lies inside the range, both bounds included.
    #[must_use]
    pub fn contains_tick(&self, tick: i32) -> bool {
        self.tick_lower <= tick && tick <= self.tick_upper
    }

    /// Moves the range. Amounts are left untouched.
    pub fn set_range(&mut self, tick_lower: i32, tick_upper: i32) {
        self.tick_lower = tick_lower;
        self.tick_upper = tick_upper;
    }

    #[must_use]
    pub fn id(&self, created_at: DateTime<Utc>) -> PositionId {
        PositionId::generate(self.tick_lower, self.tick_upper, created_at)
    }
}
