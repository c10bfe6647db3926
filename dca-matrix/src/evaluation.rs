//! Evaluation pipeline: market data -> regime -> allocation.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocation::AllocationPlan;
use crate::config::MatrixConfig;
use crate::data::{CashFlow, MarketDataSource, MarketSnapshot};
use crate::error::MatrixResult;
use crate::regime::RegimeDecision;

/// Everything produced by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub snapshot: MarketSnapshot,
    pub cash: CashFlow,
    pub decision: RegimeDecision,
    pub plan: AllocationPlan,
}

/// Classify then allocate. Fails as a whole; no plan without a decision.
pub fn evaluate(
    snapshot: &MarketSnapshot,
    cash: &CashFlow,
    config: &MatrixConfig,
) -> MatrixResult<Evaluation> {
    let decision = config.classifier().classify(snapshot, cash)?;
    let plan = config
        .allocation_engine()?
        .allocate(decision.authorized_budget, snapshot.vix)?;

    info!(
        "Regime {}: authorized ${}, carried ${}, shield {:?}",
        decision.state.as_str(),
        decision.authorized_budget,
        decision.carried_reserve,
        plan.shield
    );

    Ok(Evaluation {
        snapshot: *snapshot,
        cash: *cash,
        decision,
        plan,
    })
}

/// Fetch market data from `source`, then [`evaluate`].
pub async fn scan<S: MarketDataSource + ?Sized>(
    source: &mut S,
    cash: &CashFlow,
    config: &MatrixConfig,
) -> MatrixResult<Evaluation> {
    cash.validate()?;

    let data = &config.data;
    info!(
        "Fetching {} ({}) and {}",
        data.benchmark_symbol, data.benchmark_lookback, data.volatility_symbol
    );

    let bars = source
        .fetch_series(&data.benchmark_symbol, data.benchmark_lookback)
        .await?;
    let vix = source.fetch_latest(&data.volatility_symbol).await?;

    let snapshot = MarketSnapshot::from_series(
        &bars,
        vix,
        config.regime.fast_window,
        config.regime.slow_window,
    )?;
    info!(
        "{} {:.2} | SMA{} {:.2} | SMA{} {:.2} | {} {:.2}",
        data.benchmark_symbol,
        snapshot.price,
        config.regime.fast_window,
        snapshot.sma50,
        config.regime.slow_window,
        snapshot.sma200,
        data.volatility_symbol,
        snapshot.vix
    );

    evaluate(&snapshot, cash, config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::allocation::{OrderAction, ShieldStatus};
    use crate::data::{Lookback, PriceBar};
    use crate::error::MatrixError;
    use crate::regime::RegimeState;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// In-memory provider keyed by symbol.
    #[derive(Default)]
    struct StaticSource {
        series: HashMap<String, Vec<PriceBar>>,
        calls: Vec<(String, Lookback)>,
    }

    impl StaticSource {
        fn with(mut self, symbol: &str, closes: &[f64]) -> Self {
            let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
            let bars = closes
                .iter()
                .enumerate()
                .map(|(i, c)| PriceBar {
                    timestamp: start + Duration::days(i as i64),
                    close: *c,
                })
                .collect();
            self.series.insert(symbol.to_string(), bars);
            self
        }
    }

    #[async_trait]
    impl MarketDataSource for StaticSource {
        async fn fetch_series(&mut self, symbol: &str, lookback: Lookback) -> MatrixResult<Vec<PriceBar>> {
            self.calls.push((symbol.to_string(), lookback));
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| MatrixError::upstream(format!("unknown symbol {}", symbol)))
        }
    }

    fn cash() -> CashFlow {
        CashFlow::new(dec!(100), dec!(50))
    }

    #[test]
    fn test_defense_calm_scenario() {
        let snapshot = MarketSnapshot::new(400.0, 410.0, 420.0, 15.0);
        let eval = evaluate(&snapshot, &cash(), &MatrixConfig::default()).unwrap();

        assert_eq!(eval.decision.state, RegimeState::Defense);
        assert_eq!(eval.decision.authorized_budget, dec!(50));
        assert_eq!(eval.decision.carried_reserve, dec!(100));
        assert_eq!(eval.plan.shield, ShieldStatus::Active);

        let amounts: Vec<Decimal> = eval.plan.orders.iter().map(|o| o.amount_usd).collect();
        assert_eq!(amounts, vec![dec!(15), dec!(15), dec!(10), dec!(10)]);
    }

    #[test]
    fn test_defense_stressed_scenario() {
        let snapshot = MarketSnapshot::new(400.0, 410.0, 420.0, 25.0);
        let eval = evaluate(&snapshot, &cash(), &MatrixConfig::default()).unwrap();

        let amounts: Vec<Decimal> = eval.plan.orders.iter().map(|o| o.amount_usd).collect();
        assert_eq!(amounts, vec![dec!(15), dec!(15), dec!(20), dec!(0)]);
        assert_eq!(eval.plan.orders[3].action, OrderAction::Hold);
        assert_eq!(eval.plan.table.weight("SPYI"), Some(dec!(0.40)));
    }

    #[test]
    fn test_sniper_deploys_everything() {
        let snapshot = MarketSnapshot::new(395.0, 410.0, 420.0, 30.0);
        let eval = evaluate(&snapshot, &cash(), &MatrixConfig::default()).unwrap();

        assert_eq!(eval.decision.state, RegimeState::Sniper);
        assert_eq!(eval.plan.total_amount(), dec!(150));
        assert_eq!(eval.decision.carried_reserve, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_input_produces_no_plan() {
        let snapshot = MarketSnapshot::new(400.0, 410.0, 0.0, 15.0);
        assert!(evaluate(&snapshot, &cash(), &MatrixConfig::default())
            .unwrap_err()
            .is_invalid_input());

        let negative_vix = MarketSnapshot::new(430.0, 410.0, 420.0, -3.0);
        assert!(evaluate(&negative_vix, &cash(), &MatrixConfig::default()).is_err());
    }

    #[test]
    fn test_evaluation_serializes() {
        let snapshot = MarketSnapshot::new(430.0, 410.0, 420.0, 15.0);
        let eval = evaluate(&snapshot, &cash(), &MatrixConfig::default()).unwrap();
        let json = serde_json::to_value(&eval).unwrap();

        assert_eq!(json["decision"]["state"], "BULL");
        assert_eq!(json["plan"]["shield"], "active");
        assert_eq!(json["plan"]["orders"][0]["asset"], "XDTE");
        assert_eq!(json["plan"]["orders"][0]["action"], "BUY");
    }

    #[tokio::test]
    async fn test_scan_fetches_and_evaluates() {
        let mut closes = vec![400.0; 150];
        closes.extend(vec![430.0; 50]);
        let mut source = StaticSource::default()
            .with("SPY", &closes)
            .with("^VIX", &[18.0, 19.0, 22.5]);

        // SMA50 == price == 430 so this is DEFENSE, not BULL
        let eval = scan(&mut source, &cash(), &MatrixConfig::default()).await.unwrap();
        assert_eq!(eval.decision.state, RegimeState::Defense);
        assert_eq!(eval.snapshot.vix, 22.5);
        assert_eq!(eval.plan.shield, ShieldStatus::Suppressed);
        assert_eq!(
            source.calls,
            vec![
                ("SPY".to_string(), Lookback::OneYear),
                ("^VIX".to_string(), Lookback::FiveDays)
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_bull_market() {
        let mut closes: Vec<f64> = (0..250).map(|i| 300.0 + i as f64).collect();
        closes.push(600.0);
        let mut source = StaticSource::default()
            .with("SPY", &closes)
            .with("^VIX", &[13.2]);

        let eval = scan(&mut source, &cash(), &MatrixConfig::default()).await.unwrap();
        assert_eq!(eval.decision.state, RegimeState::Bull);
        assert_eq!(eval.plan.total_amount(), dec!(100));
    }

    #[tokio::test]
    async fn test_scan_short_history_is_upstream_error() {
        let mut source = StaticSource::default()
            .with("SPY", &vec![400.0; 120])
            .with("^VIX", &[15.0]);

        let err = scan(&mut source, &cash(), &MatrixConfig::default()).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_scan_missing_vix_is_upstream_error() {
        let mut source = StaticSource::default().with("SPY", &vec![400.0; 250]);
        let err = scan(&mut source, &cash(), &MatrixConfig::default()).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_scan_rejects_negative_cash_before_fetching() {
        let mut source = StaticSource::default();
        let bad = CashFlow::new(dec!(-10), dec!(0));

        let err = scan(&mut source, &bad, &MatrixConfig::default()).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert!(source.calls.is_empty());
    }
}
