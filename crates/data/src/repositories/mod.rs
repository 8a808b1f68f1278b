//! Repository implementations for reading swap history.

mod swap_repository;

pub use swap_repository::{SwapRecord, SwapRepository, decode_sqrt_price_x96};

use crate::config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

/// Database connection wrapper for repositories.
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
    swap_table: String,
    block_table: String,
}

impl Database {
    /// Wraps an existing pool, reading from the given swap and block tables.
    #[must_use]
    pub fn new(pool: PgPool, swap_table: impl Into<String>, block_table: impl Into<String>) -> Self {
        Self {
            pool: Arc::new(pool),
            swap_table: swap_table.into(),
            block_table: block_table.into(),
        }
    }

    /// Opens a connection pool using `config`.
    ///
    /// # Errors
    /// Returns an error if the options are invalid or the connection fails.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let options = config.connect_options()?;
        let pool = PgPoolOptions::new()
            .acquire_timeout(config.connect_timeout())
            .connect_with(options)
            .await?;
        info!(host = %config.host, database = %config.name, "Connected to swap database");
        Ok(Self::new(pool, &config.swap_table, &config.block_table))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates a SwapRepository instance.
    #[must_use]
    pub fn swaps(&self) -> SwapRepository {
        SwapRepository::new(self.pool.clone(), &self.swap_table, &self.block_table)
    }
}
