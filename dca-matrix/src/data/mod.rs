pub mod indicators;
pub mod source;
pub mod types;
pub mod yahoo;

pub use indicators::simple_moving_average;
pub use source::MarketDataSource;
pub use types::{CashFlow, Lookback, MarketSnapshot, PriceBar};
pub use yahoo::{YahooClient, YahooError};
