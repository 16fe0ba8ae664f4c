//! Market snapshot consumed by the algorithm on each tick

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::values::{Price, Quantity, Timestamp};

/// Top of book. Absent sides are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid_price: Option<Price>,
    pub bid_size: Quantity,
    pub ask_price: Option<Price>,
    pub ask_size: Quantity,
}

/// Session trade statistics. `close` is the last trade price, zero before
/// the first trade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    /// Size of the last trade
    pub qty: Quantity,
    pub vwap: Price,
    /// Cumulative traded volume
    pub volume: Quantity,
}

impl TradeStats {
    /// Fold a new print into the statistics
    pub fn record(&mut self, price: Price, qty: Quantity) {
        if self.open.is_zero() {
            self.open = price;
            self.high = price;
            self.low = price;
        }
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        let notional = self.vwap * self.volume + price * qty;
        self.volume += qty;
        if self.volume > Decimal::ZERO {
            self.vwap = notional / self.volume;
        }
        self.close = price;
        self.qty = qty;
    }
}

/// Read-only market snapshot for one security
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub quote: Quote,
    pub trade: TradeStats,
    pub timestamp: Option<Timestamp>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bbo(mut self, bid: Price, ask: Price) -> Self {
        self.quote.bid_price = Some(bid);
        self.quote.ask_price = Some(ask);
        self
    }

    pub fn with_last(mut self, price: Price, volume: Quantity) -> Self {
        self.trade.close = price;
        self.trade.volume = volume;
        self
    }

    /// Best bid, ignoring non-positive prices
    pub fn bid(&self) -> Option<Price> {
        self.quote.bid_price.filter(|p| *p > Decimal::ZERO)
    }

    /// Best ask, ignoring non-positive prices
    pub fn ask(&self) -> Option<Price> {
        self.quote.ask_price.filter(|p| *p > Decimal::ZERO)
    }

    /// Last trade price, `None` before the first trade
    pub fn last_price(&self) -> Option<Price> {
        Some(self.trade.close).filter(|p| *p > Decimal::ZERO)
    }

    /// Midpoint, only when both sides are present and not crossed or locked
    pub fn mid_price(&self) -> Option<Price> {
        match (self.bid(), self.ask()) {
            (Some(b), Some(a)) if a > b => Some((b + a) / dec!(2)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_requires_both_sides() {
        let snap = MarketSnapshot::new().with_bbo(dec!(10.00), dec!(10.02));
        assert_eq!(snap.mid_price(), Some(dec!(10.01)));

        let mut one_sided = MarketSnapshot::new();
        one_sided.quote.bid_price = Some(dec!(10));
        assert_eq!(one_sided.mid_price(), None);

        let locked = MarketSnapshot::new().with_bbo(dec!(10), dec!(10));
        assert_eq!(locked.mid_price(), None);
    }

    #[test]
    fn test_zero_prices_are_absent() {
        let snap = MarketSnapshot::new().with_bbo(Decimal::ZERO, dec!(5));
        assert_eq!(snap.bid(), None);
        assert_eq!(snap.ask(), Some(dec!(5)));
        assert_eq!(snap.last_price(), None);
    }

    #[test]
    fn test_trade_stats_record() {
        let mut stats = TradeStats::default();
        stats.record(dec!(10), dec!(100));
        stats.record(dec!(12), dec!(100));
        assert_eq!(stats.open, dec!(10));
        assert_eq!(stats.high, dec!(12));
        assert_eq!(stats.low, dec!(10));
        assert_eq!(stats.close, dec!(12));
        assert_eq!(stats.volume, dec!(200));
        assert_eq!(stats.vwap, dec!(11));
    }
}
