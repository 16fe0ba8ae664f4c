//! Tempo Ports
//!
//! Port definitions (traits) for the Tempo execution workspace.
//! These define the boundaries between the execution algorithm and the
//! collaborators it does not own: time, order management and market data.

mod clock;
mod error;
mod market_data;
mod order_router;

pub use clock::Clock;
pub use error::{MarketDataError, OrderError};
pub use market_data::{Instrument, MarketDataSource};
pub use order_router::OrderRouter;
