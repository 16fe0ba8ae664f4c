//! Tempo Paper Venue
//!
//! An in-memory stand-in for the order-management system and the market-data
//! layer, used by backtests and tests. It implements the
//! [`OrderRouter`](tempo_ports::OrderRouter) and
//! [`MarketDataSource`](tempo_ports::MarketDataSource) ports.
//!
//! ## Fill model
//!
//! This is not a matching engine. Child orders fill in full when they are
//! marketable against the current quote, and resting limit orders fill
//! against trade prints that trade through (or, optionally, at) their price.
//!
//! ```text
//!   update_quote / record_trade ──► PaperBook ──► fills ──► ExecutionReports
//!                                      ▲                         │
//!   OrderRouter::place / cancel ───────┘                         ▼
//!                                                          drain_reports()
//! ```

pub mod book;
pub mod error;
pub mod instrument;
pub mod venue;

pub use book::{BookStats, PaperBook, PaperFill};
pub use error::{PaperError, Result};
pub use instrument::PaperInstrument;
pub use venue::{PaperConfig, PaperVenue};
