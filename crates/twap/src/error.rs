//! Algorithm errors

use tempo_core::Quantity;
use tempo_ports::MarketDataError;
use thiserror::Error;

use crate::algo::AlgoState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgoError {
    #[error("Too short ValidSeconds, must be >= 60")]
    ShortHorizon { seconds: i64 },

    #[error("MinSize required for security without lot size")]
    MinSizeRequired,

    #[error("Invalid aggression, must be in (Low, Medium, High, Highest)")]
    InvalidAggression(String),

    #[error("Invalid {name}: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("Invalid parent order: quantity {0} must be > 0")]
    InvalidQuantity(Quantity),

    #[error("Algorithm not running (state: {0:?})")]
    NotRunning(AlgoState),

    #[error("Algorithm already started (state: {0:?})")]
    AlreadyStarted(AlgoState),

    #[error("Subscription failed: {0}")]
    Subscription(#[from] MarketDataError),
}

impl AlgoError {
    pub fn invalid_param(name: &str, reason: impl Into<String>) -> Self {
        AlgoError::InvalidParam {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AlgoError>;
