//! Tempo Clock Infrastructure
//!
//! Provides time sources for live and simulated execution:
//!
//! - [`SystemClock`]: wall-clock time for live trading
//! - [`SimClock`]: time that only moves when told to, for backtests and
//!   deterministic tests
//!
//! ## Usage
//!
//! ```ignore
//! use tempo_clock::{Clock, SimClock};
//! use chrono::Duration;
//!
//! let clock = SimClock::new(start);
//! clock.advance(Duration::seconds(1)); // one algorithm tick later
//! assert_eq!(clock.now(), start + Duration::seconds(1));
//! ```

mod sim;
mod system;

pub use sim::SimClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use tempo_ports::Clock;
