pub mod backtest_result;
pub mod fee;

pub use backtest_result::BacktestResult;
pub use fee::Fee;
