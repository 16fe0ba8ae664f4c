use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::Exchange;
use crate::values::{Price, Quantity, Symbol, Timestamp};

/// Security classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecurityType {
    #[default]
    Stock,
    Fund,
    Bond,
    Future,
    Other,
}

/// Resolved security reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub symbol: Symbol,
    #[serde(default)]
    pub security_type: SecurityType,
    /// Minimum price increment, zero if prices are not tick-constrained
    pub tick_size: Price,
    /// Minimum tradable increment, zero if the security has no lot size
    #[serde(default)]
    pub lot_size: Quantity,
    pub exchange: Exchange,
}

impl Security {
    pub fn new(
        symbol: impl Into<Symbol>,
        tick_size: Price,
        lot_size: Quantity,
        exchange: Exchange,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            security_type: SecurityType::Stock,
            tick_size,
            lot_size,
            exchange,
        }
    }

    pub fn with_type(mut self, security_type: SecurityType) -> Self {
        self.security_type = security_type;
        self
    }

    pub fn has_lot_size(&self) -> bool {
        self.lot_size > Decimal::ZERO
    }

    /// Odd lots are always allowed for securities without a lot size
    pub fn odd_lot_allowed(&self) -> bool {
        self.exchange.odd_lot_allowed || !self.has_lot_size()
    }

    /// Round a price to the nearest valid tick
    pub fn round_price(&self, price: Price) -> Price {
        let tick = self.tick_size;
        if tick <= Decimal::ZERO {
            return price;
        }
        round_half_up(price / tick) * tick
    }

    /// Round a quantity to the nearest lot multiple
    pub fn round_lot(&self, quantity: Quantity) -> Quantity {
        if !self.has_lot_size() {
            return quantity;
        }
        round_half_up(quantity / self.lot_size) * self.lot_size
    }

    /// Round a quantity down to a lot multiple
    pub fn floor_lot(&self, quantity: Quantity) -> Quantity {
        if !self.has_lot_size() {
            return quantity;
        }
        (quantity / self.lot_size).floor() * self.lot_size
    }

    pub fn is_in_trade_period(&self, now: Timestamp) -> bool {
        self.exchange.is_in_trade_period(now)
    }
}

fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
