pub mod allocation;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod regime;
pub mod report;

// Re-export commonly used types
pub use allocation::{allocate, AllocationEngine, AllocationPlan, AllocationTable, OrderAction, OrderLine, ShieldConfig, ShieldStatus};
pub use config::{ConfigError, MatrixConfig};
pub use data::{CashFlow, Lookback, MarketDataSource, MarketSnapshot, PriceBar, YahooClient};
pub use error::{MatrixError, MatrixResult};
pub use evaluation::{evaluate, scan, Evaluation};
pub use regime::{classify, RegimeClassifier, RegimeConfig, RegimeDecision, RegimeState};
pub use report::{render_report, Report};
