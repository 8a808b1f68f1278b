//! Error taxonomy shared by every backtesting crate.

/// Errors raised by the domain math, the rebalancing strategies and the runners.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BacktestError {
    /// A tick range whose bounds are not strictly ordered was passed to a range-consuming call.
    #[error("Invalid tick range: lower {tick_lower}, upper {tick_upper}")]
    InvalidRange {
        /// Lower bound received.
        tick_lower: i32,
        /// Upper bound received.
        tick_upper: i32,
    },
    /// Rebalance bias outside `[0, 1]`.
    #[error("Bias must be between 0.0 and 1.0, got {0}")]
    InvalidBias(f64),
    /// A strategy or runner was configured with an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A runner was given no swaps to simulate.
    #[error("Swap series is empty")]
    EmptySeries,
    /// Batch inputs whose lengths do not line up.
    #[error("Mismatched input: expected {expected} entries, got {actual}")]
    MismatchedInput {
        /// Number of positions.
        expected: usize,
        /// Length of the offending list.
        actual: usize,
    },
    /// A strategy capability that has no concrete behavior.
    #[error("{0} is not implemented by this strategy")]
    NotImplemented(&'static str),
    /// A decimal computation left the representable range.
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
}

impl BacktestError {
    /// Builds an [`BacktestError::InvalidRange`] from the offending bounds.
    #[must_use]
    pub fn invalid_range(tick_lower: i32, tick_upper: i32) -> Self {
        Self::InvalidRange {
            tick_lower,
            tick_upper,
        }
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, BacktestError>;
