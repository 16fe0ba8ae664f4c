use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderType, PositionEffect, Side};
use crate::values::{Price, Quantity, Symbol};

/// Unique identifier for a child order
pub type OrderId = Uuid;

/// Market-data subscription an order's fills are booked against
pub type SubscriptionId = u64;

/// A slice of the parent order sent to the market.
///
/// Owned by the order-management system once placed; the algorithm only keeps
/// references to it through the instrument's active order set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildOrder {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Required for limit orders, `None` for market orders
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub sub_account: String,
    pub position_effect: PositionEffect,
    /// Subscription whose order accounting includes this order
    #[serde(default)]
    pub owner: Option<SubscriptionId>,
}

impl ChildOrder {
    /// Create a limit child order
    pub fn limit(
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Quantity,
        price: Price,
        sub_account: impl Into<String>,
        position_effect: PositionEffect,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            price: Some(price),
            quantity,
            sub_account: sub_account.into(),
            position_effect,
            owner: None,
        }
    }

    /// Create a market child order
    pub fn market(
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Quantity,
        sub_account: impl Into<String>,
        position_effect: PositionEffect,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            price: None,
            quantity,
            sub_account: sub_account.into(),
            position_effect,
            owner: None,
        }
    }

    /// Book the order against a subscription
    pub fn with_owner(mut self, owner: SubscriptionId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Validate the order based on order type requirements
    pub fn validate(&self) -> bool {
        if self.quantity <= Decimal::ZERO {
            return false;
        }
        match self.order_type {
            OrderType::Market => self.price.is_none(),
            OrderType::Limit => self.price.is_some_and(|p| p > Decimal::ZERO),
        }
    }

    /// Determine if the order is marketable against the opposite touch
    pub fn is_marketable(&self, opposite_best: Option<Price>) -> bool {
        match (self.side, self.order_type, self.price, opposite_best) {
            (_, OrderType::Market, _, Some(_)) => true,
            (Side::Buy, OrderType::Limit, Some(limit), Some(ask)) => limit >= ask,
            (Side::Sell, OrderType::Limit, Some(limit), Some(bid)) => limit <= bid,
            _ => false,
        }
    }
}
