//! PostgreSQL access to indexed pool swaps.
//!
//! Swaps are stored one row per on-chain event, with block timestamps kept in a
//! separate table. [`repositories::SwapRepository`] joins the two and turns the
//! rows into a [`lp_backtest_domain::entities::SwapSeries`] ready for replay.

pub mod config;
pub mod repositories;

pub use config::DatabaseConfig;
pub use repositories::{Database, SwapRecord, SwapRepository, decode_sqrt_price_x96};
