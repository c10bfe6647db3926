//! Market regime classification module.
//!
//! Maps the benchmark price against its moving averages to one of:
//! - Sniper: price more than 5% under SMA200, deploy budget and reserve
//! - Bull: price above SMA50, deploy the monthly budget
//! - Defense: everything else, deploy half and carry the rest

pub mod classifier;

pub use classifier::{classify, RegimeClassifier, RegimeConfig, RegimeDecision, RegimeState, Severity};
