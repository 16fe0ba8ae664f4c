use serde::{Deserialize, Serialize};

/// Whether an order opens or closes a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PositionEffect {
    #[default]
    Open,
    Close,
}
