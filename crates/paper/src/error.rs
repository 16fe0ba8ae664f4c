//! Paper venue errors

use tempo_ports::{MarketDataError, OrderError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaperError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("No liquidity for market order on {0}")]
    NoLiquidity(String),
}

pub type Result<T> = std::result::Result<T, PaperError>;

impl From<PaperError> for OrderError {
    fn from(err: PaperError) -> Self {
        match err {
            PaperError::SymbolNotFound(s) => OrderError::Rejected(format!("unknown symbol {s}")),
            PaperError::InvalidOrder(msg) => OrderError::Rejected(msg),
            PaperError::OrderNotFound(msg) => OrderError::Rejected(msg),
            PaperError::NoLiquidity(s) => OrderError::Rejected(format!("no liquidity on {s}")),
        }
    }
}

impl From<PaperError> for MarketDataError {
    fn from(err: PaperError) -> Self {
        match err {
            PaperError::SymbolNotFound(s) => MarketDataError::UnknownSecurity(s),
            other => MarketDataError::UnknownSecurity(other.to_string()),
        }
    }
}
