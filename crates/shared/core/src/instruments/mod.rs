//! Security and exchange reference data
//!
//! Reference-data lookup itself lives outside this workspace; these types are
//! the resolved view the algorithm consumes (tick size, lot size, odd-lot
//! policy, trading periods).

mod exchange;
mod security;

pub use exchange::{Exchange, TradePeriod};
pub use security::{Security, SecurityType};
