//! VIX shield.
//!
//! When the volatility index is above the threshold the volatility-sensitive
//! asset (SVOL, short volatility) is suspended and its weight goes to the
//! hedge asset (SPYI).

use serde::{Deserialize, Serialize};

use super::table::AllocationTable;
use crate::error::{MatrixError, MatrixResult};

/// Shield configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// VIX level above which the shield triggers (strict).
    pub vix_threshold: f64,
    /// Asset whose weight is suspended.
    pub sensitive_asset: String,
    /// Asset that absorbs the suspended weight.
    pub hedge_asset: String,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            vix_threshold: 20.0,
            sensitive_asset: "SVOL".to_string(),
            hedge_asset: "SPYI".to_string(),
        }
    }
}

impl ShieldConfig {
    /// Check the threshold and that both assets exist in `table`.
    pub fn validate(&self, table: &AllocationTable) -> MatrixResult<()> {
        if !self.vix_threshold.is_finite() || self.vix_threshold < 0.0 {
            return Err(MatrixError::invalid(format!(
                "vix_threshold must be finite and non-negative, got {}",
                self.vix_threshold
            )));
        }
        if self.sensitive_asset.eq_ignore_ascii_case(&self.hedge_asset) {
            return Err(MatrixError::invalid(
                "shield sensitive and hedge assets must differ",
            ));
        }
        for asset in [&self.sensitive_asset, &self.hedge_asset] {
            if !table.contains(asset) {
                return Err(MatrixError::invalid(format!(
                    "shield asset {} not in allocation table",
                    asset
                )));
            }
        }
        Ok(())
    }

    /// Status for a VIX reading.
    pub fn status_for(&self, vix: f64) -> ShieldStatus {
        if vix > self.vix_threshold {
            ShieldStatus::Suppressed
        } else {
            ShieldStatus::Active
        }
    }
}

/// Shield status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShieldStatus {
    /// Normal operation, sensitive asset keeps its weight.
    Active,
    /// VIX above threshold, sensitive asset suspended.
    Suppressed,
}

impl ShieldStatus {
    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Suppressed)
    }

    /// Status line for the report.
    pub fn message(&self, config: &ShieldConfig) -> String {
        match self {
            Self::Active => format!(
                "{} active (collecting dividends normally)",
                config.sensitive_asset
            ),
            Self::Suppressed => format!(
                "DANGER! VIX > {}: {} suspended, weight moved to {}",
                config.vix_threshold, config.sensitive_asset, config.hedge_asset
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let config = ShieldConfig::default();
        assert_eq!(config.status_for(15.0), ShieldStatus::Active);
        assert_eq!(config.status_for(20.0), ShieldStatus::Active);
        assert_eq!(config.status_for(20.01), ShieldStatus::Suppressed);
        assert!(config.status_for(45.0).is_triggered());
    }

    #[test]
    fn test_messages() {
        let config = ShieldConfig::default();
        assert_eq!(
            ShieldStatus::Active.message(&config),
            "SVOL active (collecting dividends normally)"
        );
        assert_eq!(
            ShieldStatus::Suppressed.message(&config),
            "DANGER! VIX > 20: SVOL suspended, weight moved to SPYI"
        );
    }

    #[test]
    fn test_validate_against_table() {
        let table = AllocationTable::income_default();
        assert!(ShieldConfig::default().validate(&table).is_ok());

        let missing = ShieldConfig {
            hedge_asset: "TLT".to_string(),
            ..Default::default()
        };
        assert!(missing.validate(&table).is_err());

        let same = ShieldConfig {
            hedge_asset: "svol".to_string(),
            ..Default::default()
        };
        assert!(same.validate(&table).is_err());

        let negative = ShieldConfig {
            vix_threshold: -1.0,
            ..Default::default()
        };
        assert!(negative.validate(&table).is_err());
    }
}
