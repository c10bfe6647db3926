//! Allocation engine.
//!
//! Turns the authorized budget into per-asset order lines:
//! 1. Copy the base table
//! 2. Apply the VIX shield
//! 3. amount = authorized budget x effective weight, in table order

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::shield::{ShieldConfig, ShieldStatus};
use super::table::AllocationTable;
use crate::error::{ensure_finite, MatrixError, MatrixResult};

/// Order action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderAction {
    Buy,
    Hold,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
        }
    }
}

/// One advisory order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub asset: String,
    /// Effective weight after the shield.
    pub target_weight: Decimal,
    pub action: OrderAction,
    pub amount_usd: Decimal,
}

/// Result of one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub shield: ShieldStatus,
    pub shield_message: String,
    /// Effective weights after the shield.
    pub table: AllocationTable,
    /// One line per asset in table order, zero-weight lines included.
    pub orders: Vec<OrderLine>,
}

impl AllocationPlan {
    /// Sum of all order amounts, saturating at `Decimal::MAX`.
    pub fn total_amount(&self) -> Decimal {
        self.orders
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.amount_usd))
    }

    /// Order line for an asset.
    pub fn order(&self, asset: &str) -> Option<&OrderLine> {
        self.orders
            .iter()
            .find(|o| o.asset.eq_ignore_ascii_case(asset))
    }

    /// Lines with something to buy.
    pub fn buys(&self) -> impl Iterator<Item = &OrderLine> {
        self.orders.iter().filter(|o| o.action == OrderAction::Buy)
    }
}

/// Allocation engine holding the base table and shield rules.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    base: AllocationTable,
    shield: ShieldConfig,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self {
            base: AllocationTable::income_default(),
            shield: ShieldConfig::default(),
        }
    }
}

impl AllocationEngine {
    /// Create an engine; the shield assets must exist in `base`.
    pub fn new(base: AllocationTable, shield: ShieldConfig) -> MatrixResult<Self> {
        shield.validate(&base)?;
        Ok(Self { base, shield })
    }

    pub fn base_table(&self) -> &AllocationTable {
        &self.base
    }

    /// Weights in effect for a VIX reading. The base table is never touched.
    pub fn effective_table(&self, vix: f64) -> MatrixResult<(ShieldStatus, AllocationTable)> {
        validate_vix(vix)?;

        let mut table = self.base.clone();
        let status = self.shield.status_for(vix);
        if status.is_triggered() {
            let moved = table.shift_weight(&self.shield.sensitive_asset, &self.shield.hedge_asset)?;
            debug!(
                "VIX {:.2} > {}: moved {} weight from {} to {}",
                vix, self.shield.vix_threshold, moved, self.shield.sensitive_asset, self.shield.hedge_asset
            );
        }
        Ok((status, table))
    }

    /// Split `authorized_budget` across the effective table.
    pub fn allocate(&self, authorized_budget: Decimal, vix: f64) -> MatrixResult<AllocationPlan> {
        if authorized_budget < Decimal::ZERO {
            return Err(MatrixError::invalid(format!(
                "authorized budget must not be negative, got {}",
                authorized_budget
            )));
        }

        let (shield, table) = self.effective_table(vix)?;
        debug!("Allocating {} over {:?}", authorized_budget, table.symbols());

        let orders = table
            .iter()
            .map(|entry| {
                let amount_usd = authorized_budget
                    .checked_mul(entry.weight)
                    .ok_or_else(|| MatrixError::invalid("cash amount overflows"))?;
                let action = if amount_usd > Decimal::ZERO {
                    OrderAction::Buy
                } else {
                    OrderAction::Hold
                };
                Ok(OrderLine {
                    asset: entry.symbol.clone(),
                    target_weight: entry.weight,
                    action,
                    amount_usd,
                })
            })
            .collect::<MatrixResult<Vec<_>>>()?;

        Ok(AllocationPlan {
            shield,
            shield_message: shield.message(&self.shield),
            table,
            orders,
        })
    }
}

/// Allocate over `base_table` with the default SVOL -> SPYI shield at VIX 20.
pub fn allocate(
    authorized_budget: Decimal,
    vix: f64,
    base_table: &AllocationTable,
) -> MatrixResult<AllocationPlan> {
    AllocationEngine::new(base_table.clone(), ShieldConfig::default())?.allocate(authorized_budget, vix)
}

fn validate_vix(vix: f64) -> MatrixResult<()> {
    ensure_finite("vix", vix)?;
    if vix < 0.0 {
        return Err(MatrixError::invalid(format!("vix must not be negative, got {}", vix)));
    }
    Ok(())
}
