//! Yahoo Finance chart API client.
//!
//! Only the daily close series is used. Bars whose close is null (halted
//! sessions, partial days) are dropped.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::source::MarketDataSource;
use super::types::{Lookback, PriceBar};
use crate::error::MatrixResult;

/// Chart endpoint base URL.
const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Minimum interval between requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);

/// Yahoo chart API errors.
#[derive(Error, Debug)]
pub enum YahooError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("No price data returned for {0}")]
    EmptySeries(String),
}

/// Top-level wrapper: `{"chart": {"result": [...], "error": ...}}`.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartApiError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteBlock {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Convert into chronological bars, skipping null closes.
    pub fn into_bars(self, symbol: &str) -> Result<Vec<PriceBar>, YahooError> {
        if let Some(err) = self.chart.error {
            return Err(YahooError::ApiError(format!("{}: {}", err.code, err.description)));
        }

        let result = self
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| YahooError::EmptySeries(symbol.to_string()))?;

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        if closes.len() != result.timestamp.len() {
            return Err(YahooError::InvalidResponse(format!(
                "{} timestamps but {} closes",
                result.timestamp.len(),
                closes.len()
            )));
        }

        let mut bars: Vec<PriceBar> = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let close = close?;
                let timestamp = DateTime::from_timestamp(*ts, 0)?;
                Some(PriceBar { timestamp, close })
            })
            .collect();

        if bars.is_empty() {
            return Err(YahooError::EmptySeries(symbol.to_string()));
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

/// Yahoo Finance client.
pub struct YahooClient {
    client: Client,
    last_request: Instant,
    request_count: u64,
}

impl YahooClient {
    /// Create a new client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, YahooError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            last_request: Instant::now() - MIN_REQUEST_INTERVAL,
            request_count: 0,
        })
    }

    /// Get request count for monitoring.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Rate-limited chart request.
    async fn chart(&mut self, symbol: &str, lookback: Lookback) -> Result<Vec<PriceBar>, YahooError> {
        let elapsed = self.last_request.elapsed();
        if elapsed < MIN_REQUEST_INTERVAL {
            tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
        }

        let url = format!("{}/{}", BASE_URL, symbol);
        let params = [("range", lookback.as_range()), ("interval", "1d")];
        debug!("GET {} range={}", url, lookback);

        let response = self.client.get(&url).query(&params).send().await?;

        self.last_request = Instant::now();
        self.request_count += 1;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(YahooError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            // Unknown symbols come back as 404 with a chart error payload
            if let Ok(body) = serde_json::from_str::<ChartResponse>(&text) {
                if let Some(err) = body.chart.error {
                    return Err(YahooError::ApiError(format!(
                        "{} ({}): {}",
                        status, err.code, err.description
                    )));
                }
            }
            return Err(YahooError::ApiError(format!("{}: {}", status, text)));
        }

        let body: ChartResponse = response.json().await.map_err(|e| {
            YahooError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        body.into_bars(symbol)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch_series(&mut self, symbol: &str, lookback: Lookback) -> MatrixResult<Vec<PriceBar>> {
        Ok(self.chart(symbol, lookback).await?)
    }
}
