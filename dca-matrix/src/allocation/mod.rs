//! Allocation module.
//!
//! Provides:
//! - The base weight table (XDTE / QQQI / SPYI / SVOL)
//! - The VIX shield (suspend SVOL into SPYI when VIX > 20)
//! - Order line generation from the authorized budget

pub mod engine;
pub mod shield;
pub mod table;

pub use engine::{allocate, AllocationEngine, AllocationPlan, OrderAction, OrderLine};
pub use shield::{ShieldConfig, ShieldStatus};
pub use table::{AllocationTable, AssetWeight};
