//! Target weight table.

use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{MatrixError, MatrixResult};

/// One asset and its share of the authorized budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetWeight {
    pub symbol: String,
    pub weight: Decimal,
}

impl AssetWeight {
    pub fn new(symbol: impl Into<String>, weight: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
        }
    }
}

/// Ordered asset weights summing to exactly 1.
///
/// Order is the output order of the order list. Invariants are checked once
/// at construction; the allocator never re-derives them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AssetWeight>", into = "Vec<AssetWeight>")]
pub struct AllocationTable {
    entries: Vec<AssetWeight>,
}

impl AllocationTable {
    pub fn new(entries: Vec<AssetWeight>) -> MatrixResult<Self> {
        if entries.is_empty() {
            return Err(MatrixError::invalid("allocation table is empty"));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.symbol.trim().is_empty() {
                return Err(MatrixError::invalid("allocation table has a blank symbol"));
            }
            if !seen.insert(entry.symbol.to_uppercase()) {
                return Err(MatrixError::invalid(format!(
                    "asset {} listed twice in allocation table",
                    entry.symbol
                )));
            }
            if entry.weight < Decimal::ZERO || entry.weight > Decimal::ONE {
                return Err(MatrixError::invalid(format!(
                    "weight for {} must be in [0, 1], got {}",
                    entry.symbol, entry.weight
                )));
            }
        }

        let table = Self { entries };
        let total = table.total_weight();
        if total != Decimal::ONE {
            return Err(MatrixError::invalid(format!(
                "allocation weights must sum to 1, got {}",
                total
            )));
        }

        Ok(table)
    }

    /// The covered-call income table: XDTE 30%, QQQI 30%, SPYI 20%, SVOL 20%.
    pub fn income_default() -> Self {
        Self {
            entries: vec![
                AssetWeight::new("XDTE", dec!(0.30)),
                AssetWeight::new("QQQI", dec!(0.30)),
                AssetWeight::new("SPYI", dec!(0.20)),
                AssetWeight::new("SVOL", dec!(0.20)),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetWeight> {
        self.entries.iter()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.symbol.as_str()).collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.position(symbol).is_some()
    }

    pub fn weight(&self, symbol: &str) -> Option<Decimal> {
        self.position(symbol).map(|i| self.entries[i].weight)
    }

    pub fn total_weight(&self) -> Decimal {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Move the whole weight of `from` onto `to`. Returns the amount moved.
    ///
    /// The sum is unchanged, so the table stays valid.
    pub(crate) fn shift_weight(&mut self, from: &str, to: &str) -> MatrixResult<Decimal> {
        let from_idx = self
            .position(from)
            .ok_or_else(|| MatrixError::invalid(format!("asset {} not in allocation table", from)))?;
        let to_idx = self
            .position(to)
            .ok_or_else(|| MatrixError::invalid(format!("asset {} not in allocation table", to)))?;
        if from_idx == to_idx {
            return Ok(Decimal::ZERO);
        }

        let moved = self.entries[from_idx].weight;
        self.entries[to_idx].weight += moved;
        self.entries[from_idx].weight = Decimal::ZERO;
        Ok(moved)
    }

    fn position(&self, symbol: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.symbol.eq_ignore_ascii_case(symbol))
    }
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self::income_default()
    }
}

impl TryFrom<Vec<AssetWeight>> for AllocationTable {
    type Error = MatrixError;

    fn try_from(entries: Vec<AssetWeight>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<AllocationTable> for Vec<AssetWeight> {
    fn from(table: AllocationTable) -> Self {
        table.entries
    }
}
