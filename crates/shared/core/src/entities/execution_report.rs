use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderStatus};
use crate::values::{Price, Quantity, Timestamp};

/// Execution report for a child order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Quantity filled by this report (zero for acks and cancels)
    pub last_qty: Quantity,
    pub last_price: Option<Price>,
    pub timestamp: Timestamp,
}

impl ExecutionReport {
    pub fn fill(
        order_id: OrderId,
        status: OrderStatus,
        qty: Quantity,
        price: Price,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            order_id,
            status,
            last_qty: qty,
            last_price: Some(price),
            timestamp,
        }
    }

    pub fn status_only(order_id: OrderId, status: OrderStatus, timestamp: Timestamp) -> Self {
        Self {
            order_id,
            status,
            last_qty: Decimal::ZERO,
            last_price: None,
            timestamp,
        }
    }

    pub fn is_fill(&self) -> bool {
        self.last_qty > Decimal::ZERO
    }
}
