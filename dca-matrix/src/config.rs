//! Configuration loader.
//!
//! Every section is optional; defaults reproduce the classic covered-call rules
//! (SNIPER at -5% under SMA200, half budget in DEFENSE, VIX shield at 20).

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::{AllocationEngine, AllocationTable, ShieldConfig};
use crate::data::Lookback;
use crate::error::MatrixError;
use crate::regime::{RegimeClassifier, RegimeConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] MatrixError),
}

/// Market-data settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Index tracked for the regime.
    pub benchmark_symbol: String,
    /// Volatility index feeding the shield.
    pub volatility_symbol: String,
    /// History fetched for the moving averages.
    pub benchmark_lookback: Lookback,
    pub request_timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            benchmark_symbol: "SPY".to_string(),
            volatility_symbol: "^VIX".to_string(),
            benchmark_lookback: Lookback::OneYear,
            request_timeout_secs: 15,
        }
    }
}

impl DataConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Report rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Offset used for the "updated at" footer.
    pub utc_offset_hours: i32,
    /// Label printed next to the footer time.
    pub timezone_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 7,
            timezone_label: "Bangkok time".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
    }
}

/// Full configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub data: DataConfig,
    pub regime: RegimeConfig,
    pub shield: ShieldConfig,
    pub report: ReportConfig,
    /// Base weights, in output order.
    pub allocation: AllocationTable,
}

impl MatrixConfig {
    /// Load config from a TOML file.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-section constraints.
    pub fn validate(&self) -> Result<(), MatrixError> {
        self.regime.validate()?;
        self.shield.validate(&self.allocation)?;

        if self.data.benchmark_symbol.trim().is_empty() || self.data.volatility_symbol.trim().is_empty() {
            return Err(MatrixError::invalid("market data symbols must not be blank"));
        }
        if self.data.benchmark_lookback.approx_trading_days() < self.regime.slow_window {
            return Err(MatrixError::invalid(format!(
                "benchmark_lookback {} covers ~{} sessions, fewer than slow_window {}",
                self.data.benchmark_lookback,
                self.data.benchmark_lookback.approx_trading_days(),
                self.regime.slow_window
            )));
        }
        if self.data.request_timeout_secs == 0 {
            return Err(MatrixError::invalid("request_timeout_secs must be at least 1"));
        }
        if self.report.utc_offset_hours.abs() > 14 || self.report.offset().is_none() {
            return Err(MatrixError::invalid(format!(
                "utc_offset_hours must be within +/-14, got {}",
                self.report.utc_offset_hours
            )));
        }
        Ok(())
    }

    pub fn classifier(&self) -> RegimeClassifier {
        RegimeClassifier::new(self.regime.clone())
    }

    pub fn allocation_engine(&self) -> Result<AllocationEngine, MatrixError> {
        AllocationEngine::new(self.allocation.clone(), self.shield.clone())
    }
}
