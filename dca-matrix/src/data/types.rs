//! Core data types for a single evaluation.
//!
//! Market readings are plain `f64` (prices, averages, index levels). Cash
//! amounts are `Decimal` so that splitting a budget never creates or loses
//! a cent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, MatrixError, MatrixResult};

/// One daily close from the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// History window requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Lookback {
    /// Provider range code (e.g. "1y").
    pub fn as_range(&self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
        }
    }

    /// Rough number of trading sessions covered.
    pub fn approx_trading_days(&self) -> usize {
        match self {
            Self::FiveDays => 5,
            Self::OneMonth => 21,
            Self::ThreeMonths => 63,
            Self::SixMonths => 126,
            Self::OneYear => 252,
            Self::TwoYears => 504,
            Self::FiveYears => 1260,
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

impl FromStr for Lookback {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "5d" => Ok(Self::FiveDays),
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            other => Err(MatrixError::invalid(format!("unknown lookback '{}'", other))),
        }
    }
}

/// Market readings consumed by one evaluation.
///
/// Built fresh every run, either from explicit numbers or from fetched
/// series via `MarketSnapshot::from_series`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Latest benchmark close.
    pub price: f64,
    /// 50-period simple moving average.
    pub sma50: f64,
    /// 200-period simple moving average.
    pub sma200: f64,
    /// Latest volatility index close.
    pub vix: f64,
}

impl MarketSnapshot {
    pub fn new(price: f64, sma50: f64, sma200: f64, vix: f64) -> Self {
        Self {
            price,
            sma50,
            sma200,
            vix,
        }
    }

    /// Percentage distance of price from the 200-period average.
    ///
    /// Callers must have checked `sma200 > 0`.
    pub fn gap_percent(&self) -> f64 {
        (self.price - self.sma200) / self.sma200 * 100.0
    }

    /// Check every reading the classifier divides or compares with.
    pub fn validate(&self) -> MatrixResult<()> {
        ensure_finite("price", self.price)?;
        ensure_finite("sma50", self.sma50)?;
        ensure_finite("sma200", self.sma200)?;
        if self.sma200 <= 0.0 {
            return Err(MatrixError::invalid(format!(
                "sma200 must be positive, got {}",
                self.sma200
            )));
        }
        Ok(())
    }
}

/// Cash supplied by the user for this month's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    /// New DCA money for this month (USD).
    pub monthly_budget: Decimal,
    /// Cash held back from previous months (USD).
    pub reserve: Decimal,
}

impl CashFlow {
    pub fn new(monthly_budget: Decimal, reserve: Decimal) -> Self {
        Self {
            monthly_budget,
            reserve,
        }
    }

    /// Total cash on hand before any decision.
    pub fn total(&self) -> MatrixResult<Decimal> {
        self.monthly_budget
            .checked_add(self.reserve)
            .ok_or_else(|| MatrixError::invalid("cash amount overflows"))
    }

    pub fn validate(&self) -> MatrixResult<()> {
        if self.monthly_budget < Decimal::ZERO {
            return Err(MatrixError::invalid(format!(
                "monthly budget must not be negative, got {}",
                self.monthly_budget
            )));
        }
        if self.reserve < Decimal::ZERO {
            return Err(MatrixError::invalid(format!(
                "reserve must not be negative, got {}",
                self.reserve
            )));
        }
        self.total()?;
        Ok(())
    }
}
