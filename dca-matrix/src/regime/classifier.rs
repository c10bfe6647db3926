//! Market regime classifier.
//!
//! Uses the benchmark price against its 50 and 200 period averages to decide
//! how much of this month's cash to deploy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{CashFlow, MarketSnapshot};
use crate::error::{MatrixError, MatrixResult};

/// Market regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegimeState {
    /// Price more than 5% under SMA200. Deploy budget and reserve.
    Sniper,
    /// Price above SMA50. Deploy the full monthly budget.
    Bull,
    /// Neither. Deploy half, carry half.
    Defense,
}

/// How loudly a state should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl RegimeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sniper => "SNIPER",
            Self::Bull => "BULL",
            Self::Defense => "DEFENSE",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sniper => "SNIPER (buy the dip)",
            Self::Bull => "BULL (normal uptrend)",
            Self::Defense => "DEFENSE (sluggish market)",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Sniper => Severity::Error,
            Self::Bull => Severity::Success,
            Self::Defense => Severity::Warning,
        }
    }

    /// Whether the carried reserve is spent in this state.
    pub fn deploys_reserve(&self) -> bool {
        matches!(self, Self::Sniper)
    }
}

/// Regime classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Window of the fast (trend) average.
    pub fast_window: usize,
    /// Window of the slow (core) average.
    pub slow_window: usize,
    /// Fraction of SMA200 under which the SNIPER state triggers.
    pub sniper_discount: f64,
    /// Share of the monthly budget deployed in DEFENSE.
    pub defense_deploy_fraction: Decimal,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            fast_window: 50,
            slow_window: 200,
            sniper_discount: 0.95,
            defense_deploy_fraction: Decimal::new(5, 1),
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> MatrixResult<()> {
        if self.fast_window == 0 {
            return Err(MatrixError::invalid("fast_window must be at least 1"));
        }
        if self.slow_window < self.fast_window {
            return Err(MatrixError::invalid(format!(
                "slow_window ({}) must not be shorter than fast_window ({})",
                self.slow_window, self.fast_window
            )));
        }
        if !self.sniper_discount.is_finite()
            || self.sniper_discount <= 0.0
            || self.sniper_discount > 1.0
        {
            return Err(MatrixError::invalid(format!(
                "sniper_discount must be in (0, 1], got {}",
                self.sniper_discount
            )));
        }
        if self.defense_deploy_fraction < Decimal::ZERO
            || self.defense_deploy_fraction > Decimal::ONE
        {
            return Err(MatrixError::invalid(format!(
                "defense_deploy_fraction must be in [0, 1], got {}",
                self.defense_deploy_fraction
            )));
        }
        Ok(())
    }
}

/// Outcome of one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDecision {
    pub state: RegimeState,
    /// Cash approved for buying this round.
    pub authorized_budget: Decimal,
    /// Cash kept for next month.
    pub carried_reserve: Decimal,
    /// Distance of price from SMA200, in percent.
    pub gap_percent: f64,
    /// Price level under which SNIPER triggers.
    pub sniper_threshold: f64,
    pub description: String,
}

/// Market regime classifier.
#[derive(Debug, Clone, Default)]
pub struct RegimeClassifier {
    config: RegimeConfig,
}

impl RegimeClassifier {
    /// Create a new classifier.
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    /// Classify the market and split the cash accordingly.
    ///
    /// Precedence is SNIPER, then BULL, then DEFENSE. Both comparisons are
    /// strict: a price exactly on the threshold is not SNIPER and a price
    /// exactly on SMA50 is DEFENSE.
    pub fn classify(&self, market: &MarketSnapshot, cash: &CashFlow) -> MatrixResult<RegimeDecision> {
        market.validate()?;
        cash.validate()?;

        let sniper_threshold = market.sma200 * self.config.sniper_discount;
        let gap_percent = market.gap_percent();

        let (state, authorized_budget, carried_reserve) = if market.price < sniper_threshold {
            (RegimeState::Sniper, cash.total()?, Decimal::ZERO)
        } else if market.price > market.sma50 {
            (RegimeState::Bull, cash.monthly_budget, cash.reserve)
        } else {
            let overflow = || MatrixError::invalid("cash amount overflows");
            let deployed = cash
                .monthly_budget
                .checked_mul(self.config.defense_deploy_fraction)
                .ok_or_else(overflow)?;
            let held = cash.monthly_budget.checked_sub(deployed).ok_or_else(overflow)?;
            let carried = cash.reserve.checked_add(held).ok_or_else(overflow)?;
            (RegimeState::Defense, deployed, carried)
        };

        debug!(
            "Classified {} (price {:.2}, SMA{} {:.2}, SMA{} {:.2}, threshold {:.2})",
            state.as_str(),
            market.price,
            self.config.fast_window,
            market.sma50,
            self.config.slow_window,
            market.sma200,
            sniper_threshold
        );

        Ok(RegimeDecision {
            state,
            authorized_budget,
            carried_reserve,
            gap_percent,
            sniper_threshold,
            description: self.describe(state, sniper_threshold),
        })
    }

    fn describe(&self, state: RegimeState, sniper_threshold: f64) -> String {
        match state {
            RegimeState::Sniper => format!(
                "Below ${:.2} (-{:.0}%): deploy reserve, buy 100%",
                sniper_threshold,
                (1.0 - self.config.sniper_discount) * 100.0
            ),
            RegimeState::Bull => format!(
                "Price > SMA {}: strong market, deploy full budget",
                self.config.fast_window
            ),
            RegimeState::Defense => {
                let buy = (self.config.defense_deploy_fraction * Decimal::ONE_HUNDRED).normalize();
                let hold = (Decimal::ONE_HUNDRED - buy).normalize();
                format!("No trigger: buy {}%, hold {}%", buy, hold)
            }
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(
    price: f64,
    sma50: f64,
    sma200: f64,
    monthly_budget: Decimal,
    reserve: Decimal,
) -> MatrixResult<RegimeDecision> {
    let market = MarketSnapshot::new(price, sma50, sma200, 0.0);
    RegimeClassifier::default().classify(&market, &CashFlow::new(monthly_budget, reserve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn decide(price: f64, sma50: f64, sma200: f64) -> RegimeDecision {
        classify(price, sma50, sma200, dec!(100), dec!(50)).unwrap()
    }

    #[test]
    fn test_defense_scenario() {
        // threshold 399, price 400 sits above it but below SMA50
        let decision = decide(400.0, 410.0, 420.0);
        assert_eq!(decision.state, RegimeState::Defense);
        assert_eq!(decision.authorized_budget, dec!(50));
        assert_eq!(decision.carried_reserve, dec!(100));
        assert_relative_eq!(decision.sniper_threshold, 399.0, epsilon = 1e-9);
        assert_eq!(decision.description, "No trigger: buy 50%, hold 50%");
    }

    #[test]
    fn test_bull_scenario() {
        let decision = decide(430.0, 410.0, 420.0);
        assert_eq!(decision.state, RegimeState::Bull);
        assert_eq!(decision.authorized_budget, dec!(100));
        assert_eq!(decision.carried_reserve, dec!(50));
        assert!(decision.description.contains("SMA 50"));
    }

    #[test]
    fn test_sniper_ignores_sma50() {
        for sma50 in [300.0, 395.0, 410.0, 500.0] {
            let decision = decide(395.0, sma50, 420.0);
            assert_eq!(decision.state, RegimeState::Sniper);
            assert_eq!(decision.authorized_budget, dec!(150));
            assert_eq!(decision.carried_reserve, Decimal::ZERO);
        }
        assert!(decide(395.0, 410.0, 420.0).description.contains("$399.00 (-5%)"));
    }

    #[test]
    fn test_equality_boundaries_fall_through() {
        // price == threshold is not SNIPER
        let at_threshold = decide(399.0, 410.0, 420.0);
        assert_eq!(at_threshold.state, RegimeState::Defense);

        // price == SMA50 is not BULL
        let at_sma50 = decide(410.0, 410.0, 420.0);
        assert_eq!(at_sma50.state, RegimeState::Defense);

        let at_threshold_bull = decide(399.0, 380.0, 420.0);
        assert_eq!(at_threshold_bull.state, RegimeState::Bull);
    }

    #[test]
    fn test_gap_percent_independent_of_state() {
        assert_relative_eq!(decide(430.0, 410.0, 420.0).gap_percent, 2.380952, epsilon = 1e-5);
        assert_relative_eq!(decide(420.0, 500.0, 420.0).gap_percent, 0.0);
        assert_relative_eq!(decide(378.0, 410.0, 420.0).gap_percent, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cash_conservation_across_grid() {
        let cash = CashFlow::new(dec!(123.45), dec!(67.89));
        let classifier = RegimeClassifier::default();

        for price in (300..=500).step_by(5) {
            for sma50 in (350..=450).step_by(25) {
                let market = MarketSnapshot::new(price as f64, sma50 as f64, 420.0, 15.0);
                let d = classifier.classify(&market, &cash).unwrap();

                match d.state {
                    RegimeState::Sniper => {
                        assert!((price as f64) < 399.0);
                        assert_eq!(d.authorized_budget, cash.total().unwrap());
                        assert_eq!(d.carried_reserve, Decimal::ZERO);
                    }
                    RegimeState::Bull => {
                        assert!(price >= 399 && price > sma50);
                        assert_eq!(d.authorized_budget + d.carried_reserve, cash.total().unwrap());
                    }
                    RegimeState::Defense => {
                        assert!(price >= 399 && price <= sma50);
                        assert_eq!(d.authorized_budget + d.carried_reserve, cash.total().unwrap());
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(classify(f64::NAN, 410.0, 420.0, dec!(100), dec!(50))
            .unwrap_err()
            .is_invalid_input());
        assert!(classify(400.0, f64::INFINITY, 420.0, dec!(100), dec!(50)).is_err());
        assert!(classify(400.0, 410.0, 0.0, dec!(100), dec!(50)).is_err());
        assert!(classify(400.0, 410.0, -420.0, dec!(100), dec!(50)).is_err());
        assert!(classify(400.0, 410.0, 420.0, dec!(-100), dec!(50)).is_err());
    }

    #[test]
    fn test_cash_overflow_is_invalid_input() {
        // SNIPER, BULL and DEFENSE prices
        for price in [300.0, 430.0, 400.0] {
            let err = classify(price, 410.0, 420.0, Decimal::MAX, Decimal::ONE).unwrap_err();
            assert!(err.is_invalid_input());
            assert!(err.to_string().contains("overflows"));
        }

        let d = classify(400.0, 410.0, 420.0, Decimal::MAX, Decimal::ZERO).unwrap();
        assert_eq!(d.state, RegimeState::Defense);
        assert_eq!(d.authorized_budget + d.carried_reserve, Decimal::MAX);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = RegimeConfig {
            sniper_discount: 0.90,
            defense_deploy_fraction: dec!(0.25),
            ..Default::default()
        };
        let classifier = RegimeClassifier::new(config);
        let cash = CashFlow::new(dec!(200), dec!(0));

        // 395 would be SNIPER at 0.95 but not at 0.90 (threshold 378)
        let d = classifier
            .classify(&MarketSnapshot::new(395.0, 410.0, 420.0, 15.0), &cash)
            .unwrap();
        assert_eq!(d.state, RegimeState::Defense);
        assert_eq!(d.authorized_budget, dec!(50));
        assert_eq!(d.carried_reserve, dec!(150));
        assert_eq!(d.description, "No trigger: buy 25%, hold 75%");
    }

    #[test]
    fn test_config_validation() {
        assert!(RegimeConfig::default().validate().is_ok());

        let bad_windows = RegimeConfig {
            fast_window: 200,
            slow_window: 50,
            ..Default::default()
        };
        assert!(bad_windows.validate().is_err());

        let bad_discount = RegimeConfig {
            sniper_discount: 1.2,
            ..Default::default()
        };
        assert!(bad_discount.validate().is_err());

        let bad_fraction = RegimeConfig {
            defense_deploy_fraction: dec!(1.5),
            ..Default::default()
        };
        assert!(bad_fraction.validate().is_err());
    }

    #[test]
    fn test_state_presentation() {
        assert_eq!(RegimeState::Sniper.severity(), Severity::Error);
        assert_eq!(RegimeState::Bull.severity(), Severity::Success);
        assert_eq!(RegimeState::Defense.severity(), Severity::Warning);
        assert!(RegimeState::Sniper.deploys_reserve());
        assert!(!RegimeState::Defense.deploys_reserve());
        assert_eq!(
            serde_json::to_string(&RegimeState::Defense).unwrap(),
            "\"DEFENSE\""
        );
    }
}
