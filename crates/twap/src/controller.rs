//! Order controller
//!
//! Pure decision helpers for one tick: which working child orders have fallen
//! behind the market, and how large the next clip may be. The tick loop in
//! [`crate::algo`] calls these and performs the resulting port calls.

use rust_decimal::Decimal;
use serde::Serialize;
use tempo_core::{ChildOrder, MarketSnapshot, ParentOrder, Quantity, Security, Side};

use crate::params::ParameterStore;
use crate::pricing::TargetPrice;

/// What a tick decided
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TickDecision {
    /// Horizon elapsed; the algorithm stopped
    Expired,
    /// Algorithm not running
    Inactive,
    OutsideTradingPeriod,
    /// No usable price this tick
    NoPrice,
    /// A child order is still working; `cancelled` were pulled
    Working { cancelled: usize },
    /// Participation cap reached
    Throttled,
    /// Already at or ahead of the release curve
    NothingDue,
    /// Remaining quantity does not make a whole lot
    NoLotsAvailable,
    Placed(ChildOrder),
    /// The order router refused the child order
    Rejected(String),
}

impl TickDecision {
    pub fn label(&self) -> &'static str {
        match self {
            TickDecision::Expired => "expired",
            TickDecision::Inactive => "inactive",
            TickDecision::OutsideTradingPeriod => "outside_trading_period",
            TickDecision::NoPrice => "no_price",
            TickDecision::Working { .. } => "working",
            TickDecision::Throttled => "throttled",
            TickDecision::NothingDue => "nothing_due",
            TickDecision::NoLotsAvailable => "no_lots_available",
            TickDecision::Placed(_) => "placed",
            TickDecision::Rejected(_) => "rejected",
        }
    }
}

/// Result of one timer callback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickOutcome {
    /// Whether the timer should fire again
    pub rearm: bool,
    pub decision: TickDecision,
}

impl TickOutcome {
    pub fn rearm(decision: TickDecision) -> Self {
        Self {
            rearm: true,
            decision,
        }
    }

    pub fn finished(decision: TickDecision) -> Self {
        Self {
            rearm: false,
            decision,
        }
    }
}

/// Working orders that should be pulled given the freshly resolved price.
///
/// Orders already at the target price are left alone. A buy is pulled once it
/// sits below the bid, a sell once it sits above the ask. Market targets never
/// pull anything.
pub fn uncompetitive_orders<'a>(
    side: Side,
    target: TargetPrice,
    active: &'a [ChildOrder],
    snapshot: &MarketSnapshot,
) -> Vec<&'a ChildOrder> {
    let Some(target_price) = target.limit_price() else {
        return Vec::new();
    };
    active
        .iter()
        .filter(|order| {
            let Some(price) = order.price else {
                return false;
            };
            if price == target_price {
                return false;
            }
            match side {
                Side::Buy => snapshot.bid().is_some_and(|bid| price < bid),
                Side::Sell => snapshot.ask().is_some_and(|ask| price > ask),
            }
        })
        .collect()
}

/// Clip-size rules for one security and parameter set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSizer {
    lot: Quantity,
    odd_lots: bool,
    min_clip: Quantity,
    max_floor: Option<Quantity>,
}

impl ClipSizer {
    pub fn new(security: &Security, params: &ParameterStore) -> Self {
        let min_clip = params.min_clip();
        let lot = if security.has_lot_size() {
            security.lot_size
        } else {
            min_clip.max(Decimal::ONE)
        };
        Self {
            lot,
            odd_lots: security.odd_lot_allowed(),
            min_clip,
            max_floor: params.effective_max_floor(),
        }
    }

    pub fn lot(&self) -> Quantity {
        self.lot
    }

    /// Largest quantity that may still be sent; whole lots unless odd lots trade
    pub fn max_placeable(&self, remaining: Quantity) -> Quantity {
        if self.odd_lots {
            remaining
        } else {
            (remaining / self.lot).floor() * self.lot
        }
    }

    /// Size of the next clip for `leaves` due now.
    ///
    /// Rounded up to whole lots, raised to the min clip, then capped by the max
    /// floor and by `max_placeable`.
    pub fn size(&self, leaves: Quantity, max_placeable: Quantity) -> Quantity {
        let mut qty = (leaves / self.lot).ceil() * self.lot;
        if qty < self.min_clip {
            qty = self.min_clip;
        }
        if let Some(max_floor) = self.max_floor {
            qty = qty.min(max_floor);
        }
        qty.min(max_placeable)
    }
}

/// Child order for `quantity` at `target` on behalf of `parent`
pub fn child_order(parent: &ParentOrder, target: TargetPrice, quantity: Quantity) -> ChildOrder {
    let symbol = parent.security.symbol.clone();
    match target {
        TargetPrice::Limit(price) => ChildOrder::limit(
            symbol,
            parent.side,
            quantity,
            price,
            parent.sub_account.clone(),
            parent.position_effect,
        ),
        TargetPrice::Market => ChildOrder::market(
            symbol,
            parent.side,
            quantity,
            parent.sub_account.clone(),
            parent.position_effect,
        ),
    }
}
