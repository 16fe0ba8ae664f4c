//! Tempo Core Domain
//!
//! Pure domain types for the Tempo execution workspace: parent/child orders,
//! security reference data and market snapshots.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod instruments;
pub mod market;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    ChildOrder, ExecutionReport, OrderId, OrderStatus, OrderType, ParentOrder, PositionEffect,
    Side, SubscriptionId,
};
pub use instruments::{Exchange, Security, SecurityType, TradePeriod};
pub use market::{MarketSnapshot, Quote, TradeStats};
pub use values::{Price, Quantity, Symbol, Timestamp};
