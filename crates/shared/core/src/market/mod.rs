mod snapshot;

pub use snapshot::{MarketSnapshot, Quote, TradeStats};
