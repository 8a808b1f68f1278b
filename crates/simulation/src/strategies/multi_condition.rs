//! Combinator over several rebalancing strategies.

use super::{RebalanceStrategy, Rebalancer, ensure_ordered};
use chrono::{DateTime, Utc};
use lp_backtest_domain::{BacktestError, Result};
use serde::{Deserialize, Serialize};

/// How child decisions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicMode {
    And,
    Or,
}

/// Rebalances when its children agree according to [`LogicMode`].
///
/// Every child is evaluated on every swap so that stateful children keep their
/// timers current. The new range always comes from the first child.
#[derive(Debug, Clone)]
pub struct MultiConditionRebalancer {
    pub strategies: Vec<Rebalancer>,
    pub mode: LogicMode,
}

impl MultiConditionRebalancer {
    #[must_use]
    pub fn new(strategies: Vec<Rebalancer>, mode: LogicMode) -> Self {
        Self { strategies, mode }
    }
}

impl RebalanceStrategy for MultiConditionRebalancer {
    fn should_rebalance(
        &mut self,
        tick: i32,
        timestamp: DateTime<Utc>,
        tick_lower: i32,
        tick_upper: i32,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        ensure_ordered(tick_lower, tick_upper)?;
        if self.strategies.is_empty() {
            return Ok(false);
        }

        let checks = self
            .strategies
            .iter_mut()
            .map(|s| s.should_rebalance(tick, timestamp, tick_lower, tick_upper, created_at))
            .collect::<Result<Vec<bool>>>()?;

        Ok(match self.mode {
            LogicMode::And => checks.iter().all(|c| *c),
            LogicMode::Or => checks.iter().any(|c| *c),
        })
    }

    fn rebalance(
        &mut self,
        tick: i32,
        tick_lower: i32,
        tick_upper: i32,
        bias: f64,
    ) -> Result<(i32, i32)> {
        ensure_ordered(tick_lower, tick_upper)?;
        let first = self.strategies.first_mut().ok_or_else(|| {
            BacktestError::InvalidConfig("multi-condition rebalancer has no strategies".into())
        })?;
        first.rebalance(tick, tick_lower, tick_upper, bias)
    }

    fn name(&self) -> &'static str {
        "Multi Condition"
    }
}
