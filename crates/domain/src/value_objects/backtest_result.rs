use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of one completed backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_fees_token0: Decimal,
    pub total_fees_token1: Decimal,
    /// Annualized USD return, in percent.
    pub apr: Decimal,
}
