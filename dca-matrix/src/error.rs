//! Error kinds surfaced by an evaluation.
//!
//! Every failure aborts the whole evaluation; callers never receive a
//! partial allocation alongside an error.

use thiserror::Error;

use crate::data::YahooError;

/// Errors returned by the classifier, the allocator and the scan pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// Non-finite or out-of-domain numeric input (NaN price, sma200 <= 0,
    /// negative vix or cash, malformed allocation table).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The market-data collaborator failed or returned too little history.
    #[error("Upstream data unavailable: {0}")]
    UpstreamDataUnavailable(String),
}

impl MatrixError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamDataUnavailable(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamDataUnavailable(_))
    }
}

impl From<YahooError> for MatrixError {
    fn from(err: YahooError) -> Self {
        Self::UpstreamDataUnavailable(err.to_string())
    }
}

/// Result alias for evaluation operations.
pub type MatrixResult<T> = Result<T, MatrixError>;

/// Reject NaN and infinities with a named field in the message.
pub(crate) fn ensure_finite(name: &str, value: f64) -> MatrixResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MatrixError::invalid(format!("{} must be finite, got {}", name, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("price", 400.0).is_ok());
        assert!(ensure_finite("price", f64::NAN).unwrap_err().is_invalid_input());
        assert!(ensure_finite("vix", f64::INFINITY).is_err());
    }

    #[test]
    fn test_yahoo_error_maps_to_upstream() {
        let err: MatrixError = YahooError::EmptySeries("SPY".to_string()).into();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("SPY"));
    }
}
