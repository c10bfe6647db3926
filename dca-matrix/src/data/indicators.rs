//! Trailing moving averages over fetched close series.

use tracing::debug;

use super::types::{MarketSnapshot, PriceBar};
use crate::error::{MatrixError, MatrixResult};

/// Arithmetic mean of the trailing `window` values.
///
/// Returns `None` when the window is zero or longer than the series.
pub fn simple_moving_average(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let tail = &closes[closes.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

impl MarketSnapshot {
    /// Build a snapshot from a chronological benchmark series and a VIX close.
    ///
    /// The series must hold at least `slow_window` bars; a short history is an
    /// upstream failure, never a shorter average.
    pub fn from_series(
        bars: &[PriceBar],
        vix: f64,
        fast_window: usize,
        slow_window: usize,
    ) -> MatrixResult<Self> {
        let required = fast_window.max(slow_window);
        if bars.len() < required {
            return Err(MatrixError::upstream(format!(
                "need {} closes for the {}-period average, got {}",
                required,
                slow_window,
                bars.len()
            )));
        }

        let closes: Vec<f64> = bars[bars.len() - required..]
            .iter()
            .map(|b| b.close)
            .collect();
        if let Some(bad) = closes.iter().find(|c| !c.is_finite() || **c <= 0.0) {
            return Err(MatrixError::upstream(format!(
                "series contains an unusable close ({})",
                bad
            )));
        }

        let price = *closes
            .last()
            .ok_or_else(|| MatrixError::upstream("empty close series"))?;
        let sma_fast = simple_moving_average(&closes, fast_window)
            .ok_or_else(|| MatrixError::upstream("fast average window is empty"))?;
        let sma_slow = simple_moving_average(&closes, slow_window)
            .ok_or_else(|| MatrixError::upstream("slow average window is empty"))?;

        debug!(
            "Computed SMA{}={:.2}, SMA{}={:.2} from {} bars (last close {:.2})",
            fast_window,
            sma_fast,
            slow_window,
            sma_slow,
            bars.len(),
            price
        );

        Ok(Self::new(price, sma_fast, sma_slow, vix))
    }
}
