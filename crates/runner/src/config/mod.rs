//! Session configuration
//!
//! A session file lists the backtests to run. Each backtest names one
//! security, one parent order, the algorithm parameters as the host would
//! send them, and the random-walk market to replay against.

pub mod loader;
pub mod types;

pub use loader::{ConfigError, load_config, load_config_from_str, load_default_config};
pub use types::{BacktestConfig, SessionConfig};
