//! Market-data collaborator contract.

use async_trait::async_trait;

use super::types::{Lookback, PriceBar};
use crate::error::{MatrixError, MatrixResult};

/// Provider of daily close series.
///
/// Series are chronological with the most recent bar last.
#[async_trait]
pub trait MarketDataSource: Send {
    /// Fetch daily closes for `symbol` over `lookback`.
    async fn fetch_series(&mut self, symbol: &str, lookback: Lookback) -> MatrixResult<Vec<PriceBar>>;

    /// Latest close for `symbol`.
    async fn fetch_latest(&mut self, symbol: &str) -> MatrixResult<f64> {
        let bars = self.fetch_series(symbol, Lookback::FiveDays).await?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| MatrixError::upstream(format!("no recent close for {}", symbol)))
    }
}
