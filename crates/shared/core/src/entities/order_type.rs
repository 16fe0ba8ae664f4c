use serde::{Deserialize, Serialize};

/// Child order types the algorithm can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at current market price
    Market,
    /// Execute at specified price or better
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
        }
    }
}
