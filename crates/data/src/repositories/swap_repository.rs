//! Swap history repository.

use anyhow::{Context, bail, ensure};
use chrono::{DateTime, NaiveDateTime, Utc};
use lp_backtest_domain::entities::{Swap, SwapSeries};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of fractional bits in a Q64.96 square-root price.
const Q96_BITS: usize = 96;

/// Database record for one swap event joined with its block timestamp.
///
/// Amounts and prices are stored as text because they exceed 64-bit integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    pub tx_hash: String,
    pub block_number: i32,
    pub event_index: i32,
    /// Signed pool delta of token0 in raw units.
    pub volume_token0: String,
    /// Signed pool delta of token1 in raw units.
    pub volume_token1: String,
    /// Q64.96 fixed-point square-root price after the swap.
    pub sqrt_price_x96: String,
    pub liquidity: String,
    pub tick: i32,
    pub pool_address: String,
    pub timestamp: DateTime<Utc>,
}

impl SwapRecord {
    /// Creates a SwapRecord from a database row.
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let timestamp: NaiveDateTime = row.try_get("timestamp")?;
        Ok(Self {
            tx_hash: row.try_get("tx_hash")?,
            block_number: row.try_get("block_number")?,
            event_index: row.try_get("event_index")?,
            volume_token0: row.try_get("volume_token0")?,
            volume_token1: row.try_get("volume_token1")?,
            sqrt_price_x96: row.try_get("sqrt_price_x96")?,
            liquidity: row.try_get("liquidity")?,
            tick: row.try_get("tick")?,
            pool_address: row.try_get("pool_address")?,
            timestamp: timestamp.and_utc(),
        })
    }

    /// Converts the raw record into an engine swap.
    ///
    /// Volumes become traded magnitudes, since the pool records one side of a
    /// swap as a negative delta. The square-root price is decoded from Q64.96.
    ///
    /// # Errors
    /// Returns an error if a numeric column does not parse or overflows `Decimal`.
    pub fn into_swap(&self) -> anyhow::Result<Swap> {
        let parse = |column: &str, raw: &str| {
            Decimal::from_str(raw.trim())
                .with_context(|| format!("swap {}: invalid {column}: {raw:?}", self.tx_hash))
        };
        Ok(Swap {
            tick: self.tick,
            volume_token0: parse("volume_token0", &self.volume_token0)?.abs(),
            volume_token1: parse("volume_token1", &self.volume_token1)?.abs(),
            liquidity: parse("liquidity", &self.liquidity)?,
            timestamp: self.timestamp,
            sqrt_price_x96: decode_sqrt_price_x96(&self.sqrt_price_x96)
                .with_context(|| format!("swap {}: invalid sqrt_price_x96", self.tx_hash))?,
        })
    }
}

/// Decodes a decimal Q64.96 string into a plain square-root price.
///
/// `2^96` does not fit in a `Decimal`, so the fractional part is divided by
/// `2^48` twice.
///
/// # Errors
/// Returns an error if `raw` is not an unsigned integer or its integer part
/// exceeds 64 bits.
pub fn decode_sqrt_price_x96(raw: &str) -> anyhow::Result<Decimal> {
    let raw = raw.trim();
    ensure!(!raw.is_empty(), "sqrt_price_x96 is empty");
    let value = U256::from_dec_str(raw)
        .map_err(|e| anyhow::anyhow!("not an unsigned integer: {raw:?} ({e:?})"))?;

    let integer = value >> Q96_BITS;
    ensure!(
        integer.bits() <= 64,
        "sqrt_price_x96 integer part exceeds 64 bits: {raw}"
    );
    let fraction = value - (integer << Q96_BITS);

    let half_shift = Decimal::from(1u64 << (Q96_BITS / 2));
    let fraction = Decimal::try_from_i128_with_scale(i128::try_from(fraction.low_u128())?, 0)?
        / half_shift
        / half_shift;
    Ok(Decimal::from(integer.low_u64()) + fraction)
}

/// Newest-first page of swaps for one pool, joined with block timestamps.
fn page_query(swap_table: &str, block_table: &str) -> String {
    format!(
        r#"
        SELECT s.*, b.block_date AS timestamp
        FROM public.{swap_table} s
        JOIN public.{block_table} b ON s.block_number = b.block_number
        WHERE LOWER(s.pool_address) = LOWER($1)
        AND b.block_date BETWEEN $2 AND $3
        ORDER BY b.block_date DESC, s.block_number DESC, s.event_index DESC
        LIMIT $4 OFFSET $5
        "#
    )
}

/// Repository for swap history queries.
#[derive(Clone)]
pub struct SwapRepository {
    pool: Arc<PgPool>,
    swap_table: String,
    block_table: String,
}

impl SwapRepository {
    /// Creates a new SwapRepository.
    ///
    /// Table names are interpolated into queries and must be trusted identifiers.
    #[must_use]
    pub fn new(pool: Arc<PgPool>, swap_table: impl Into<String>, block_table: impl Into<String>) -> Self {
        Self {
            pool,
            swap_table: swap_table.into(),
            block_table: block_table.into(),
        }
    }

    fn page_query(&self) -> String {
        page_query(&self.swap_table, &self.block_table)
    }

    /// Finds one page of swaps for a pool, newest first.
    ///
    /// Both bounds are inclusive and the pool address is matched case-insensitively.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_page(
        &self,
        pool_address: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SwapRecord>, sqlx::Error> {
        let sql = self.page_query();
        let rows = sqlx::query(&sql)
            .bind(pool_address)
            .bind(start)
            .bind(end)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(SwapRecord::from_row).collect()
    }

    /// Loads every swap of a pool between `start` and `end` in ascending time order.
    ///
    /// Pages of `page_size` rows are fetched until a short page comes back.
    ///
    /// # Errors
    /// Returns an error if `page_size` is not positive, a query fails or a row
    /// cannot be decoded.
    pub async fn load_series(
        &self,
        pool_address: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        page_size: i64,
    ) -> anyhow::Result<SwapSeries> {
        if page_size <= 0 {
            bail!("page size must be positive, got {page_size}");
        }

        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .find_page(pool_address, start, end, page_size, offset)
                .await
                .with_context(|| format!("failed to fetch swaps at offset {offset}"))?;
            let fetched = page.len();
            debug!(pool = pool_address, offset, fetched, "Fetched swap page");
            records.extend(page);
            if i64::try_from(fetched).map_or(true, |n| n < page_size) {
                break;
            }
            offset += page_size;
        }
        records.reverse();

        let swaps = records
            .iter()
            .map(SwapRecord::into_swap)
            .collect::<anyhow::Result<Vec<_>>>()?;
        info!(pool = pool_address, swaps = swaps.len(), "Loaded swap series");
        Ok(SwapSeries::new(swaps))
    }
}
