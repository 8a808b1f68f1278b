use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single historical trade against the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    pub tick: i32,
    pub volume_token0: Decimal,
    pub volume_token1: Decimal,
    /// Pool-wide active liquidity at the time of the swap.
    pub liquidity: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Square-root price after the swap. Its square is read as the token0 price
    /// in token1 units.
    pub sqrt_price_x96: Decimal,
}

/// Swaps of one pool in ascending time order.
///
/// Ordering is the caller's responsibility; nothing here sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSeries {
    pub swaps: Vec<Swap>,
}

impl SwapSeries {
    #[must_use]
    pub fn new(swaps: Vec<Swap>) -> Self {
        Self { swaps }
    }

    #[must_use]
    pub fn ticks(&self) -> Vec<i32> {
        self.swaps.iter().map(|s| s.tick).collect()
    }

    #[must_use]
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.swaps.iter().map(|s| s.timestamp).collect()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Swap> {
        self.swaps.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Swap> {
        self.swaps.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.swaps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Swap> {
        self.swaps.iter()
    }
}

impl From<Vec<Swap>> for SwapSeries {
    fn from(swaps: Vec<Swap>) -> Self {
        Self::new(swaps)
    }
}

impl<'a> IntoIterator for &'a SwapSeries {
    type Item = &'a Swap;
    type IntoIter = std::slice::Iter<'a, Swap>;

    fn into_iter(self) -> Self::IntoIter {
        self.swaps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn swap(tick: i32, minutes: i64) -> Swap {
        Swap {
            tick,
            volume_token0: dec!(1),
            volume_token1: dec!(2000),
            liquidity: dec!(100000),
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
            sqrt_price_x96: Decimal::ONE,
        }
    }

    #[test]
    fn test_series_views() {
        let series = SwapSeries::new(vec![swap(950, 0), swap(1500, 1), swap(2100, 2)]);
        assert_eq!(series.ticks(), vec![950, 1500, 2100]);
        assert_eq!(series.timestamps().len(), 3);
        assert_eq!(series.first().map(|s| s.tick), Some(950));
        assert_eq!(series.last().map(|s| s.tick), Some(2100));
        assert_eq!(series.iter().count(), series.len());
    }

    #[test]
    fn test_empty_series() {
        let series = SwapSeries::default();
        assert!(series.is_empty());
        assert!(series.ticks().is_empty());
        assert!(series.first().is_none());
    }
}
