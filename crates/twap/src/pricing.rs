//! Price selection across aggression tiers
//!
//! Each tier is an ordered list of price sources; the first source that
//! resolves from the current snapshot wins. The chosen limit price is then
//! clamped to the user's price limit and, for short sales on markets that
//! require it, floored at the last trade.

use tempo_core::{MarketSnapshot, Price, Security, Side};

use crate::params::Aggression;

/// Where a candidate price comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Near touch (buy: bid, sell: ask), else last trade
    Passive,
    /// Midpoint of a two-sided, uncrossed quote
    Midpoint,
    /// Far touch (buy: ask, sell: bid)
    Aggressive,
    /// Market order
    Market,
}

/// Resolved price for the next child order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPrice {
    Limit(Price),
    Market,
}

impl TargetPrice {
    pub fn limit_price(&self) -> Option<Price> {
        match self {
            TargetPrice::Limit(price) => Some(*price),
            TargetPrice::Market => None,
        }
    }
}

impl Aggression {
    /// Price sources tried in order for this tier
    pub fn price_sources(&self) -> &'static [PriceSource] {
        match self {
            Aggression::Low => &[PriceSource::Passive],
            Aggression::Medium => &[
                PriceSource::Midpoint,
                PriceSource::Aggressive,
                PriceSource::Market,
            ],
            Aggression::High => &[PriceSource::Aggressive, PriceSource::Market],
            Aggression::Highest => &[PriceSource::Market],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSelector {
    side: Side,
    aggression: Aggression,
    price_limit: Option<Price>,
    not_below_last: bool,
}

impl PriceSelector {
    pub fn new(
        side: Side,
        aggression: Aggression,
        price_limit: Option<Price>,
        not_below_last: bool,
    ) -> Self {
        Self {
            side,
            aggression,
            price_limit,
            not_below_last,
        }
    }

    /// Pick the price for the next child order, `None` when nothing usable
    pub fn select(&self, snapshot: &MarketSnapshot, security: &Security) -> Option<TargetPrice> {
        let last = snapshot.last_price().map(|px| security.round_price(px));

        let target = self
            .aggression
            .price_sources()
            .iter()
            .find_map(|source| self.resolve(*source, snapshot, security, last))?;

        Some(match target {
            TargetPrice::Limit(price) => TargetPrice::Limit(self.constrain(price, last)),
            TargetPrice::Market => TargetPrice::Market,
        })
    }

    fn resolve(
        &self,
        source: PriceSource,
        snapshot: &MarketSnapshot,
        security: &Security,
        last: Option<Price>,
    ) -> Option<TargetPrice> {
        let (near, far) = match self.side {
            Side::Buy => (snapshot.bid(), snapshot.ask()),
            Side::Sell => (snapshot.ask(), snapshot.bid()),
        };
        match source {
            PriceSource::Passive => near.or(last).map(TargetPrice::Limit),
            PriceSource::Midpoint => snapshot
                .mid_price()
                .map(|mid| TargetPrice::Limit(security.round_price(mid))),
            PriceSource::Aggressive => far.map(TargetPrice::Limit),
            PriceSource::Market => Some(TargetPrice::Market),
        }
    }

    fn constrain(&self, mut price: Price, last: Option<Price>) -> Price {
        if let Some(limit) = self.price_limit {
            let through = match self.side {
                Side::Buy => price > limit,
                Side::Sell => price < limit,
            };
            if through {
                price = limit;
            }
        }
        if self.not_below_last {
            if let Some(last) = last.filter(|last| price < *last) {
                price = last;
            }
        }
        price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempo_core::Exchange;

    fn security() -> Security {
        Security::new("600000", dec!(0.01), dec!(100), Exchange::new("SSE", "CN"))
    }

    fn quote() -> MarketSnapshot {
        MarketSnapshot::new()
            .with_bbo(dec!(10.00), dec!(10.03))
            .with_last(dec!(10.014), dec!(50000))
    }

    fn select(side: Side, aggression: Aggression, snapshot: &MarketSnapshot) -> Option<TargetPrice> {
        PriceSelector::new(side, aggression, None, false).select(snapshot, &security())
    }

    #[test]
    fn test_low_joins_near_touch() {
        let md = quote();
        assert_eq!(
            select(Side::Buy, Aggression::Low, &md),
            Some(TargetPrice::Limit(dec!(10.00)))
        );
        assert_eq!(
            select(Side::Sell, Aggression::Low, &md),
            Some(TargetPrice::Limit(dec!(10.03)))
        );
    }

    #[test]
    fn test_low_falls_back_to_rounded_last() {
        let md = MarketSnapshot::new().with_last(dec!(10.014), dec!(100));
        assert_eq!(
            select(Side::Buy, Aggression::Low, &md),
            Some(TargetPrice::Limit(dec!(10.01)))
        );
        // nothing at all: skip, never a market order
        assert_eq!(select(Side::Buy, Aggression::Low, &MarketSnapshot::new()), None);
    }

    #[test]
    fn test_medium_uses_rounded_mid() {
        // (10.00 + 10.03) / 2 = 10.015, rounded half away
        assert_eq!(
            select(Side::Buy, Aggression::Medium, &quote()),
            Some(TargetPrice::Limit(dec!(10.02)))
        );
    }

    #[test]
    fn test_medium_falls_through_tiers() {
        let one_sided = MarketSnapshot::new().with_bbo(dec!(0), dec!(10.05));
        assert_eq!(
            select(Side::Buy, Aggression::Medium, &one_sided),
            Some(TargetPrice::Limit(dec!(10.05)))
        );
        assert_eq!(
            select(Side::Sell, Aggression::Medium, &one_sided),
            Some(TargetPrice::Market)
        );
    }

    #[test]
    fn test_high_and_highest() {
        let md = quote();
        assert_eq!(
            select(Side::Buy, Aggression::High, &md),
            Some(TargetPrice::Limit(dec!(10.03)))
        );
        assert_eq!(
            select(Side::Sell, Aggression::High, &md),
            Some(TargetPrice::Limit(dec!(10.00)))
        );
        assert_eq!(
            select(Side::Buy, Aggression::Highest, &md),
            Some(TargetPrice::Market)
        );
    }

    #[test]
    fn test_price_limit_clamp() {
        let sec = security();
        let md = quote();
        let buy = PriceSelector::new(Side::Buy, Aggression::High, Some(dec!(10.01)), false);
        assert_eq!(buy.select(&md, &sec), Some(TargetPrice::Limit(dec!(10.01))));

        let sell = PriceSelector::new(Side::Sell, Aggression::High, Some(dec!(10.02)), false);
        assert_eq!(sell.select(&md, &sec), Some(TargetPrice::Limit(dec!(10.02))));

        // market orders are not clamped
        let market = PriceSelector::new(Side::Buy, Aggression::Highest, Some(dec!(9)), false);
        assert_eq!(market.select(&md, &sec), Some(TargetPrice::Market));
    }

    #[test]
    fn test_not_below_last_trade() {
        let sec = security();
        let md = quote();
        let floored = PriceSelector::new(Side::Sell, Aggression::High, None, true);
        // bid 10.00 lifted to last trade 10.01
        assert_eq!(floored.select(&md, &sec), Some(TargetPrice::Limit(dec!(10.01))));

        let unfloored = PriceSelector::new(Side::Sell, Aggression::High, None, false);
        assert_eq!(unfloored.select(&md, &sec), Some(TargetPrice::Limit(dec!(10.00))));
    }
}
