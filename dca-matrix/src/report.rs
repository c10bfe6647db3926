//! Plain-text report for one evaluation.
//!
//! Three sections: macro radar (regime), VIX shield, execution orders.

use std::fmt;

use chrono::{DateTime, Offset, Utc};
use rust_decimal::Decimal;

use crate::config::MatrixConfig;
use crate::evaluation::Evaluation;
use crate::regime::Severity;

const SEPARATOR: &str = "============================================================";

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "[OK]",
        Severity::Warning => "[WARN]",
        Severity::Error => "[ALERT]",
    }
}

/// Format a dollar amount with thousands separators and cents: `$1,234.50`.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = format!("{:.2}", amount.round_dp(2).abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount.round_dp(2) < Decimal::ZERO { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}

/// Whole-percent label for a weight fraction: 0.30 -> "30%".
pub fn format_weight(weight: Decimal) -> String {
    format!("{}%", (weight * Decimal::ONE_HUNDRED).round_dp(0).normalize())
}

/// Text report for one evaluation, rendered through `Display`.
pub struct Report<'a> {
    eval: &'a Evaluation,
    config: &'a MatrixConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> Report<'a> {
    pub fn new(eval: &'a Evaluation, config: &'a MatrixConfig, generated_at: DateTime<Utc>) -> Self {
        Self {
            eval,
            config,
            generated_at,
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config;
        let snap = &self.eval.snapshot;
        let decision = &self.eval.decision;
        let plan = &self.eval.plan;

        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f, "THE ULTIMATE MATRIX (Classic Covered Call Edition)")?;
        writeln!(f, "{}", SEPARATOR)?;

        writeln!(f, "\n1. MACRO RADAR")?;
        writeln!(
            f,
            "  {} Price:      ${:.2} ({:+.2}% vs SMA{})",
            config.data.benchmark_symbol, snap.price, decision.gap_percent, config.regime.slow_window
        )?;
        writeln!(f, "  SMA {} (Speed):  ${:.2}", config.regime.fast_window, snap.sma50)?;
        writeln!(f, "  SMA {} (Core):  ${:.2}", config.regime.slow_window, snap.sma200)?;
        writeln!(
            f,
            "  {} Status: {} | Order: {}",
            marker(decision.state.severity()),
            decision.state.label(),
            decision.description
        )?;

        writeln!(f, "\n2. VIX SHIELD")?;
        writeln!(f, "  {} Index: {:.2}", config.data.volatility_symbol, snap.vix)?;
        let shield_severity = if plan.shield.is_triggered() {
            Severity::Error
        } else {
            Severity::Success
        };
        writeln!(f, "  {} {}", marker(shield_severity), plan.shield_message)?;

        writeln!(f, "\n3. EXECUTION ORDERS")?;
        write!(
            f,
            "  Authorized this round: {} | Cash kept for next month: {}",
            format_usd(decision.authorized_budget),
            format_usd(decision.carried_reserve)
        )?;
        if decision.state.deploys_reserve() {
            write!(f, " (reserve deployed)")?;
        }
        writeln!(f, "\n")?;
        writeln!(
            f,
            "  {:<8} {:>8}  {:<6} {:>14}",
            "Asset", "Target %", "Action", "Amount (USD)"
        )?;
        for order in &plan.orders {
            writeln!(
                f,
                "  {:<8} {:>8}  {:<6} {:>14}",
                order.asset,
                format_weight(order.target_weight),
                order.action.as_str(),
                format_usd(order.amount_usd)
            )?;
        }
        writeln!(
            f,
            "  {} buy order(s), total {}",
            plan.buys().count(),
            format_usd(plan.total_amount())
        )?;

        let offset = config.report.offset().unwrap_or_else(|| Utc.fix());
        writeln!(
            f,
            "\nUpdated: {} ({})",
            self.generated_at.with_timezone(&offset).format("%d/%m/%Y %H:%M:%S"),
            config.report.timezone_label
        )
    }
}

/// Render the full report. `generated_at` is shown in the configured offset.
pub fn render_report(eval: &Evaluation, config: &MatrixConfig, generated_at: DateTime<Utc>) -> String {
    Report::new(eval, config, generated_at).to_string()
}
