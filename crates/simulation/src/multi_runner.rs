//! Batch runner over many independent positions.

use crate::activity_tracker::{ActivityModel, ActivityTracker};
use crate::fee_calculator::{FeeCalculator, FeeModel};
use crate::runner::BacktestRunner;
use crate::strategies::Rebalancer;
use lp_backtest_domain::entities::{Position, Swap};
use lp_backtest_domain::value_objects::BacktestResult;
use lp_backtest_domain::{BacktestError, Result};
use rayon::prelude::*;
use tracing::{info, warn};

/// Runs one [`BacktestRunner`] per position.
///
/// Runners share no state, so the batch can be executed sequentially or on
/// the rayon pool with identical results. Results are always returned in the
/// order positions were given.
#[derive(Debug, Clone)]
pub struct MultiPositionBacktestRunner<A = ActivityTracker, F = FeeCalculator> {
    runners: Vec<BacktestRunner<A, F>>,
}

fn ensure_len<T>(list: &[T], expected: usize) -> Result<()> {
    if !list.is_empty() && list.len() != expected {
        return Err(BacktestError::MismatchedInput {
            expected,
            actual: list.len(),
        });
    }
    Ok(())
}

impl<A, F> MultiPositionBacktestRunner<A, F>
where
    A: ActivityModel + Default,
    F: FeeModel + Default,
{
    /// Builds a batch from parallel lists.
    ///
    /// `trackers`, `calculators` and `rebalancers` may be empty, in which case
    /// each position gets the default tracker and calculator and no
    /// rebalancer. Non-empty lists must have one entry per position.
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::MismatchedInput`] when list lengths disagree and
    /// [`BacktestError::EmptySeries`] when a position has no swaps.
    pub fn new(
        positions: Vec<Position>,
        swap_series_list: Vec<Vec<Swap>>,
        trackers: Vec<A>,
        calculators: Vec<F>,
        rebalancers: Vec<Rebalancer>,
        rebalance_bias: f64,
    ) -> Result<Self> {
        let expected = positions.len();
        if swap_series_list.len() != expected {
            return Err(BacktestError::MismatchedInput {
                expected,
                actual: swap_series_list.len(),
            });
        }
        ensure_len(&trackers, expected)?;
        ensure_len(&calculators, expected)?;
        ensure_len(&rebalancers, expected)?;

        let mut trackers = trackers.into_iter();
        let mut calculators = calculators.into_iter();
        let mut rebalancers = rebalancers.into_iter();

        let runners = positions
            .into_iter()
            .zip(swap_series_list)
            .map(|(position, swaps)| {
                BacktestRunner::new(
                    position,
                    swaps,
                    trackers.next().unwrap_or_default(),
                    calculators.next().unwrap_or_default(),
                    rebalance_bias,
                )
                .map(|runner| runner.with_optional_rebalancer(rebalancers.next()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { runners })
    }
}

impl MultiPositionBacktestRunner {
    /// Builds a batch with default trackers and calculators.
    ///
    /// # Errors
    ///
    /// See [`MultiPositionBacktestRunner::new`].
    pub fn with_defaults(
        positions: Vec<Position>,
        swap_series_list: Vec<Vec<Swap>>,
        rebalancers: Vec<Rebalancer>,
        rebalance_bias: f64,
    ) -> Result<Self> {
        Self::new(
            positions,
            swap_series_list,
            Vec::new(),
            Vec::new(),
            rebalancers,
            rebalance_bias,
        )
    }
}

impl<A: ActivityModel, F: FeeModel> MultiPositionBacktestRunner<A, F> {
    /// Overrides the shared bias with one bias per position.
    ///
    /// # Errors
    ///
    /// Returns [`BacktestError::MismatchedInput`] if `biases` does not have one
    /// entry per position.
    pub fn with_rebalance_biases(mut self, biases: Vec<f64>) -> Result<Self> {
        if biases.len() != self.runners.len() {
            return Err(BacktestError::MismatchedInput {
                expected: self.runners.len(),
                actual: biases.len(),
            });
        }
        for (runner, bias) in self.runners.iter_mut().zip(biases) {
            runner.set_rebalance_bias(bias);
        }
        Ok(self)
    }

    /// Runs every position in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any runner.
    pub fn run(&mut self) -> Result<Vec<BacktestResult>> {
        let results = self
            .runners
            .iter_mut()
            .map(BacktestRunner::run)
            .collect::<Result<Vec<_>>>()?;
        info!(positions = results.len(), "Batch backtest finished");
        Ok(results)
    }

    /// Runs every position, keeping each outcome in its own slot.
    ///
    /// A failing position does not stop the rest of the batch.
    pub fn run_isolated(&mut self) -> Vec<Result<BacktestResult>> {
        self.runners
            .iter_mut()
            .enumerate()
            .map(|(index, runner)| {
                runner.run().inspect_err(|e| {
                    warn!(index, error = %e, "Position backtest failed, continuing");
                })
            })
            .collect()
    }

    #[must_use]
    pub fn runners(&self) -> &[BacktestRunner<A, F>] {
        &self.runners
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }
}

impl<A, F> MultiPositionBacktestRunner<A, F>
where
    A: ActivityModel + Send,
    F: FeeModel + Send,
{
    /// Runs every position on the rayon thread pool, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns an error raised by one of the runners.
    pub fn run_parallel(&mut self) -> Result<Vec<BacktestResult>> {
        let results = self
            .runners
            .par_iter_mut()
            .map(BacktestRunner::run)
            .collect::<Result<Vec<_>>>()?;
        info!(positions = results.len(), "Parallel batch backtest finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::OutOfRangeRebalancer;
    use crate::test_support::{basic_series, position, position_in};

    fn batch(rebalancers: Vec<Rebalancer>) -> MultiPositionBacktestRunner {
        MultiPositionBacktestRunner::with_defaults(
            vec![position(), position_in(900, 1600)],
            vec![basic_series().swaps, basic_series().swaps],
            rebalancers,
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn test_mismatched_series_rejected() {
        let result = MultiPositionBacktestRunner::with_defaults(
            vec![position(), position()],
            vec![basic_series().swaps],
            Vec::new(),
            0.5,
        );
        assert_eq!(
            result.err(),
            Some(BacktestError::MismatchedInput {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_mismatched_rebalancers_rejected() {
        let result = MultiPositionBacktestRunner::with_defaults(
            vec![position(), position()],
            vec![basic_series().swaps, basic_series().swaps],
            vec![OutOfRangeRebalancer::new().into()],
            0.5,
        );
        assert!(matches!(result, Err(BacktestError::MismatchedInput { .. })));
    }

    #[test]
    fn test_empty_series_rejected() {
        let result = MultiPositionBacktestRunner::with_defaults(
            vec![position()],
            vec![Vec::new()],
            Vec::new(),
            0.5,
        );
        assert!(matches!(result, Err(BacktestError::EmptySeries)));
    }

    #[test]
    fn test_results_in_input_order() {
        let mut runner = batch(Vec::new());
        let results = runner.run().unwrap();
        assert_eq!(results.len(), 2);

        let mut single = BacktestRunner::new(
            position_in(900, 1600),
            basic_series(),
            ActivityTracker,
            FeeCalculator,
            0.5,
        )
        .unwrap();
        assert_eq!(results[1], single.run().unwrap());
        assert_eq!(
            runner.runners()[1].activity_series().activity,
            vec![true, true, false]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rebalancers = || {
            vec![
                OutOfRangeRebalancer::new().into(),
                OutOfRangeRebalancer::new().into(),
            ]
        };
        let sequential = batch(rebalancers()).run().unwrap();
        let parallel = batch(rebalancers()).run_parallel().unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_isolated_run_continues_past_failures() {
        let mut runner = batch(vec![
            OutOfRangeRebalancer::new().into(),
            OutOfRangeRebalancer::new().into(),
        ])
        .with_rebalance_biases(vec![2.0, 0.5])
        .unwrap();

        let results = runner.run_isolated();
        assert!(matches!(results[0], Err(BacktestError::InvalidBias(_))));
        assert!(results[1].is_ok());

        // the same batch fails fast through run()
        assert!(runner.run().is_err());
    }

    #[test]
    fn test_bias_override_length_checked() {
        let result = batch(Vec::new()).with_rebalance_biases(vec![0.5]);
        assert!(matches!(result, Err(BacktestError::MismatchedInput { .. })));
    }
}
