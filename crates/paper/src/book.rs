//! Per-security paper book: market state plus the working child orders and
//! their fill accounting.
//!
//! Book-wide counters cover every order. Orders stamped with an owner are also
//! booked against that subscription, so instances sharing a security each see
//! only their own fills, cancels and working orders.

use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tempo_core::{
    ChildOrder, ExecutionReport, MarketSnapshot, OrderId, OrderStatus, OrderType, Price,
    Quantity, Quote, Security, Side, SubscriptionId, Timestamp,
};
use uuid::Uuid;

use crate::error::{PaperError, Result};

/// A fill produced by the paper venue
#[derive(Debug, Clone, PartialEq)]
pub struct PaperFill {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: Timestamp,
    /// Internal cross rather than a market fill
    pub crossed: bool,
    pub owner: Option<SubscriptionId>,
}

/// Summary counters for one book
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookStats {
    pub placed: usize,
    pub canceled: usize,
    pub fills: usize,
    pub filled_qty: Quantity,
    pub canceled_qty: Quantity,
    pub crossed_qty: Quantity,
    /// Volume-weighted fill price, `None` before the first fill
    pub avg_fill_price: Option<Price>,
}

#[derive(Debug, Clone)]
struct WorkingOrder {
    order: ChildOrder,
    filled: Quantity,
}

impl WorkingOrder {
    fn leaves(&self) -> Quantity {
        self.order.quantity - self.filled
    }
}

/// Filled and canceled quantity of one subscription
#[derive(Debug, Clone, Copy, Default)]
struct Account {
    filled: Quantity,
    canceled: Quantity,
}

#[derive(Debug, Default)]
struct BookState {
    snapshot: MarketSnapshot,
    working: Vec<WorkingOrder>,
    cum_qty: Quantity,
    cum_cx_qty: Quantity,
    accounts: HashMap<SubscriptionId, Account>,
    fills: Vec<PaperFill>,
    reports: Vec<ExecutionReport>,
    placed: usize,
    canceled: usize,
}

impl BookState {
    fn book_fill(&mut self, owner: Option<SubscriptionId>, qty: Quantity) {
        self.cum_qty += qty;
        if let Some(id) = owner {
            self.accounts.entry(id).or_default().filled += qty;
        }
    }

    fn book_cancel(&mut self, owner: Option<SubscriptionId>, qty: Quantity) {
        self.cum_cx_qty += qty;
        self.canceled += 1;
        if let Some(id) = owner {
            self.accounts.entry(id).or_default().canceled += qty;
        }
    }

    fn account(&self, owner: SubscriptionId) -> Account {
        self.accounts.get(&owner).copied().unwrap_or_default()
    }

    fn owned(&self, owner: SubscriptionId) -> impl Iterator<Item = &WorkingOrder> {
        self.working
            .iter()
            .filter(move |w| w.order.owner == Some(owner))
    }

    /// Fill `qty` of the working order at `idx`; removes it once complete
    fn fill(&mut self, idx: usize, qty: Quantity, price: Price, now: Timestamp) {
        let working = &mut self.working[idx];
        working.filled += qty;
        let order_id = working.order.id;
        let side = working.order.side;
        let owner = working.order.owner;
        let done = working.leaves() <= Decimal::ZERO;

        self.book_fill(owner, qty);
        // Our own prints are part of the market's traded volume
        self.snapshot.trade.record(price, qty);
        self.fills.push(PaperFill {
            order_id,
            side,
            price,
            quantity: qty,
            timestamp: now,
            crossed: false,
            owner,
        });
        let status = if done {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.reports
            .push(ExecutionReport::fill(order_id, status, qty, price, now));
        if done {
            self.working.remove(idx);
        }
    }

    /// Fill every working order that is marketable against the current quote
    fn sweep(&mut self, now: Timestamp) {
        let mut idx = 0;
        while idx < self.working.len() {
            let working = &self.working[idx];
            let touch = match working.order.side {
                Side::Buy => self.snapshot.ask(),
                Side::Sell => self.snapshot.bid(),
            };
            match touch {
                Some(price) if working.order.is_marketable(Some(price)) => {
                    let qty = working.leaves();
                    let before = self.working.len();
                    self.fill(idx, qty, price, now);
                    if self.working.len() == before {
                        idx += 1;
                    }
                }
                _ => idx += 1,
            }
        }
    }
}

/// Paper book for one security
pub struct PaperBook {
    security: Arc<Security>,
    fill_on_touch: bool,
    state: Mutex<BookState>,
}

impl PaperBook {
    pub fn new(security: Arc<Security>, fill_on_touch: bool) -> Self {
        Self {
            security,
            fill_on_touch,
            state: Mutex::new(BookState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BookState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn security(&self) -> &Security {
        &self.security
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        self.lock().snapshot.clone()
    }

    /// Replace the top of book and fill anything that became marketable
    pub fn update_quote(&self, quote: Quote, now: Timestamp) {
        let mut state = self.lock();
        state.snapshot.quote = quote;
        state.snapshot.timestamp = Some(now);
        state.sweep(now);
    }

    /// Record a market trade print; resting orders priced through it fill
    /// against the printed quantity
    pub fn record_trade(&self, price: Price, qty: Quantity, now: Timestamp) {
        let mut state = self.lock();
        state.snapshot.trade.record(price, qty);
        state.snapshot.timestamp = Some(now);

        let mut remaining = qty;
        let mut idx = 0;
        while idx < state.working.len() && remaining > Decimal::ZERO {
            let working = &state.working[idx];
            let limit = match working.order.price {
                Some(limit) if working.order.order_type == OrderType::Limit => limit,
                _ => {
                    idx += 1;
                    continue;
                }
            };
            let through = match working.order.side {
                Side::Buy => limit > price || (self.fill_on_touch && limit == price),
                Side::Sell => limit < price || (self.fill_on_touch && limit == price),
            };
            if !through {
                idx += 1;
                continue;
            }
            let fill_qty = working.leaves().min(remaining);
            remaining -= fill_qty;
            let before = state.working.len();
            state.fill(idx, fill_qty, limit, now);
            if state.working.len() == before {
                idx += 1;
            }
        }
    }

    /// Accept a child order; marketable orders fill immediately at the touch,
    /// market orders without liquidity are canceled
    pub fn place(&self, order: &ChildOrder, now: Timestamp) -> Result<OrderId> {
        if order.symbol != self.security.symbol {
            return Err(PaperError::SymbolNotFound(order.symbol.clone()));
        }
        if !order.validate() {
            return Err(PaperError::InvalidOrder(format!(
                "{} {} {} @ {:?}",
                order.side,
                order.order_type.as_str(),
                order.quantity,
                order.price
            )));
        }

        let mut state = self.lock();
        state.placed += 1;
        state.working.push(WorkingOrder {
            order: order.clone(),
            filled: Decimal::ZERO,
        });
        state
            .reports
            .push(ExecutionReport::status_only(order.id, OrderStatus::New, now));
        debug!(
            "[PAPER] {} placed {} {} {} @ {:?}",
            self.security.symbol,
            order.side,
            order.order_type.as_str(),
            order.quantity,
            order.price
        );

        let idx = state.working.len() - 1;
        let touch = match order.side {
            Side::Buy => state.snapshot.ask(),
            Side::Sell => state.snapshot.bid(),
        };
        match (order.order_type, touch) {
            (_, Some(price)) if order.is_marketable(Some(price)) => {
                state.fill(idx, order.quantity, price, now);
            }
            (OrderType::Market, _) => {
                state.working.remove(idx);
                state.book_cancel(order.owner, order.quantity);
                state.reports.push(ExecutionReport::status_only(
                    order.id,
                    OrderStatus::Canceled,
                    now,
                ));
                info!(
                    "[PAPER] {} market order {} canceled: no liquidity",
                    self.security.symbol, order.id
                );
            }
            _ => {}
        }
        Ok(order.id)
    }

    pub fn cancel(&self, order_id: OrderId, now: Timestamp) -> Result<()> {
        let mut state = self.lock();
        let idx = state
            .working
            .iter()
            .position(|w| w.order.id == order_id)
            .ok_or_else(|| PaperError::OrderNotFound(order_id.to_string()))?;
        let working = state.working.remove(idx);
        state.book_cancel(working.order.owner, working.leaves());
        state.reports.push(ExecutionReport::status_only(
            order_id,
            OrderStatus::Canceled,
            now,
        ));
        debug!(
            "[PAPER] {} canceled {} ({} leaves)",
            self.security.symbol,
            order_id,
            working.leaves()
        );
        Ok(())
    }

    /// Internal cross: fills immediately without touching the market
    pub fn cross(
        &self,
        quantity: Quantity,
        price: Option<Price>,
        side: Side,
        owner: Option<SubscriptionId>,
        now: Timestamp,
    ) -> Result<OrderId> {
        if quantity <= Decimal::ZERO {
            return Err(PaperError::InvalidOrder(format!("cross quantity {quantity}")));
        }
        let mut state = self.lock();
        let price = price
            .or_else(|| state.snapshot.mid_price())
            .or_else(|| state.snapshot.last_price())
            .ok_or_else(|| PaperError::NoLiquidity(self.security.symbol.clone()))?;
        let order_id = Uuid::new_v4();
        state.book_fill(owner, quantity);
        state.fills.push(PaperFill {
            order_id,
            side,
            price,
            quantity,
            timestamp: now,
            crossed: true,
            owner,
        });
        state.reports.push(ExecutionReport::fill(
            order_id,
            OrderStatus::Filled,
            quantity,
            price,
            now,
        ));
        info!(
            "[PAPER] {} crossed {} {} @ {}",
            self.security.symbol, side, quantity, price
        );
        Ok(order_id)
    }

    pub fn cum_qty(&self) -> Quantity {
        self.lock().cum_qty
    }

    pub fn cum_cx_qty(&self) -> Quantity {
        self.lock().cum_cx_qty
    }

    pub fn total_exposure(&self) -> Quantity {
        let state = self.lock();
        state.cum_qty + state.working.iter().map(|w| w.leaves()).sum::<Quantity>()
    }

    pub fn active_orders(&self) -> Vec<ChildOrder> {
        self.lock()
            .working
            .iter()
            .map(|w| w.order.clone())
            .collect()
    }

    pub fn cum_qty_for(&self, owner: SubscriptionId) -> Quantity {
        self.lock().account(owner).filled
    }

    pub fn cum_cx_qty_for(&self, owner: SubscriptionId) -> Quantity {
        self.lock().account(owner).canceled
    }

    pub fn total_exposure_for(&self, owner: SubscriptionId) -> Quantity {
        let state = self.lock();
        state.account(owner).filled + state.owned(owner).map(|w| w.leaves()).sum::<Quantity>()
    }

    pub fn active_orders_for(&self, owner: SubscriptionId) -> Vec<ChildOrder> {
        self.lock()
            .owned(owner)
            .map(|w| w.order.clone())
            .collect()
    }

    /// Take the execution reports produced since the last drain
    pub fn drain_reports(&self) -> Vec<ExecutionReport> {
        std::mem::take(&mut self.lock().reports)
    }

    pub fn fills(&self) -> Vec<PaperFill> {
        self.lock().fills.clone()
    }

    pub fn stats(&self) -> BookStats {
        let state = self.lock();
        let filled_qty: Quantity = state.fills.iter().map(|f| f.quantity).sum();
        let notional: Decimal = state.fills.iter().map(|f| f.price * f.quantity).sum();
        BookStats {
            placed: state.placed,
            canceled: state.canceled,
            fills: state.fills.len(),
            filled_qty,
            canceled_qty: state.cum_cx_qty,
            crossed_qty: state
                .fills
                .iter()
                .filter(|f| f.crossed)
                .map(|f| f.quantity)
                .sum(),
            avg_fill_price: (filled_qty > Decimal::ZERO).then(|| notional / filled_qty),
        }
    }
}
