//! Swap-by-swap replay of concentrated liquidity positions.
//!
//! A [`runner::BacktestRunner`] walks a historical swap series, asks an
//! [`activity_tracker::ActivityModel`] whether the position is in range,
//! accrues fees through a [`fee_calculator::FeeModel`] and lets an optional
//! [`strategies::Rebalancer`] move the range. [`multi_runner`] runs many
//! independent positions at once.

pub mod activity_tracker;
pub mod fee_calculator;
pub mod multi_runner;
pub mod prelude;
pub mod runner;
pub mod strategies;

#[cfg(test)]
pub(crate) mod test_support;
