//! Tempo Runner - hosting for TWAP instances
//!
//! - **Dispatcher**: one tokio task per running instance; timer, market data,
//!   execution reports and parameter changes arrive through its channel
//! - **Registry**: starts instances and keeps their handles by id
//! - **Backtest**: replays a market path against one instance on a
//!   simulated clock
//! - **Live**: runs a whole session concurrently on the system clock against
//!   the paper venue
//! - **Config**: session files listing backtests
//!
//! ## Architecture
//!
//! ```text
//!   AlgoRegistry::start ──► TwapAlgo::start ──► AlgoDispatcher::spawn
//!                                                      │
//!            AlgoHandle ── modify / stop / market ──►  │ mpsc
//!                 ▲                                    ▼
//!                 └──────── watch<AlgoState> ◄──── run loop (interval + select!)
//!                                                      │
//!                                            OrderRouter / MarketDataSource
//! ```

pub mod backtest;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod live;
pub mod market;
pub mod registry;

pub use backtest::{Backtest, BacktestReport};
pub use config::{BacktestConfig, ConfigError, SessionConfig};
pub use dispatcher::{AlgoCommand, AlgoDispatcher, AlgoHandle, MarketUpdate};
pub use error::{Result, RunnerError};
pub use live::{InstanceOutcome, LiveReport, LiveSession};
pub use market::{MarketPath, MarketStep, Print, RandomWalk, RandomWalkConfig, ScriptedPath};
pub use registry::AlgoRegistry;
