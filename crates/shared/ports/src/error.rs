use tempo_core::OrderId;
use thiserror::Error;

/// Errors reported by the order-management system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    #[error("Order already terminal: {0}")]
    AlreadyTerminal(OrderId),

    #[error("Order routing unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by the market-data layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("Unknown security: {0}")]
    UnknownSecurity(String),

    #[error("Unknown market-data source: {0}")]
    UnknownSource(String),
}
