//! TWAP algorithm instance
//!
//! Owns the execution state of one parent order and exposes the callbacks
//! the host drives it with: start, modify, stop, the periodic timer, market
//! data and execution reports. All callbacks run on the host's single
//! serialization point, so nothing here locks.

use chrono::Duration;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempo_core::{
    ExecutionReport, MarketSnapshot, ParentOrder, PositionEffect, Quantity, Security,
    SecurityType, Side, Timestamp,
};
use tempo_ports::{Clock, Instrument, MarketDataSource, OrderRouter};

use crate::controller::{ClipSizer, TickDecision, TickOutcome, child_order, uncompetitive_orders};
use crate::curve::QuantityCurve;
use crate::error::{AlgoError, Result};
use crate::params::{ParamMap, ParameterStore, get_number, names};
use crate::participation::ParticipationGuard;
use crate::perturbation::RandomPerturbation;
use crate::pricing::PriceSelector;

/// Identifier the host assigns to an algorithm instance
pub type AlgoId = u64;

/// Shortest accepted horizon, in seconds
pub const MIN_VALID_SECONDS: i64 = 60;

/// Lifecycle of an algorithm instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgoState {
    Created,
    /// Inside `start`, before the first tick
    Validating,
    Running,
    Stopped,
    /// `start` was rejected
    Failed,
}

impl AlgoState {
    pub fn is_active(&self) -> bool {
        matches!(self, AlgoState::Validating | AlgoState::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, AlgoState::Stopped | AlgoState::Failed)
    }
}

/// Collaborators an instance talks to
#[derive(Clone)]
pub struct AlgoContext {
    pub clock: Arc<dyn Clock>,
    pub router: Arc<dyn OrderRouter>,
    pub market_data: Arc<dyn MarketDataSource>,
}

impl AlgoContext {
    pub fn new(
        clock: Arc<dyn Clock>,
        router: Arc<dyn OrderRouter>,
        market_data: Arc<dyn MarketDataSource>,
    ) -> Self {
        Self {
            clock,
            router,
            market_data,
        }
    }
}

/// State that only exists between start and stop
struct Execution {
    parent: ParentOrder,
    instrument: Arc<dyn Instrument>,
    start_time: Timestamp,
    end_time: Timestamp,
    baseline_volume: Quantity,
    /// Limit prices may not go below the last trade
    not_below_last: bool,
}

impl Execution {
    fn security(&self) -> &Security {
        &self.parent.security
    }
}

/// Short sales of CN stocks may not be priced below the last trade
fn must_not_price_below_last(parent: &ParentOrder) -> bool {
    let security = &parent.security;
    parent.position_effect == PositionEffect::Open
        && parent.side == Side::Sell
        && security.exchange.country == "CN"
        && security.security_type == SecurityType::Stock
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

pub struct TwapAlgo {
    id: AlgoId,
    ctx: AlgoContext,
    state: AlgoState,
    params: ParameterStore,
    perturbation: RandomPerturbation,
    execution: Option<Execution>,
}

impl TwapAlgo {
    pub const NAME: &'static str = "TWAP";

    pub fn new(id: AlgoId, ctx: AlgoContext, perturbation: RandomPerturbation) -> Self {
        Self {
            id,
            ctx,
            state: AlgoState::Created,
            params: ParameterStore::new(),
            perturbation,
            execution: None,
        }
    }

    pub fn id(&self) -> AlgoId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn state(&self) -> AlgoState {
        self.state
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn parent(&self) -> Option<&ParentOrder> {
        self.execution.as_ref().map(|e| &e.parent)
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.execution.as_ref().map(|e| e.start_time)
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.execution.as_ref().map(|e| e.end_time)
    }

    /// Validate the parent order and parameters, subscribe, and begin running.
    ///
    /// On error the instance ends up `Failed` with its subscription released.
    pub fn start(&mut self, parent: ParentOrder, params: &ParamMap) -> Result<()> {
        if self.state != AlgoState::Created {
            return Err(AlgoError::AlreadyStarted(self.state));
        }
        self.state = AlgoState::Validating;

        match self.validate_and_start(parent, params) {
            Ok(()) => {
                self.state = AlgoState::Running;
                debug!("[{} {}] started", self.name(), self.id);
                Ok(())
            }
            Err(e) => {
                if let Some(execution) = self.execution.take() {
                    execution.instrument.release();
                }
                self.state = AlgoState::Failed;
                error!("[{} {}] start rejected: {}", self.name(), self.id, e);
                Err(e)
            }
        }
    }

    fn validate_and_start(&mut self, parent: ParentOrder, params: &ParamMap) -> Result<()> {
        if parent.quantity <= Decimal::ZERO {
            return Err(AlgoError::InvalidQuantity(parent.quantity));
        }

        let valid_seconds = get_number(params, names::VALID_SECONDS)?
            .and_then(|s| s.trunc().to_i64())
            .unwrap_or(0);
        if valid_seconds < MIN_VALID_SECONDS {
            return Err(AlgoError::ShortHorizon {
                seconds: valid_seconds,
            });
        }
        let start_time = self.ctx.clock.now();
        let end_time = Duration::try_seconds(valid_seconds)
            .and_then(|horizon| start_time.checked_add_signed(horizon))
            .ok_or_else(|| AlgoError::invalid_param(names::VALID_SECONDS, "out of range"))?;

        let not_below_last = must_not_price_below_last(&parent);
        let instrument = self
            .ctx
            .market_data
            .subscribe(&parent.security, parent.source.as_deref())?;
        let baseline_volume = instrument.snapshot().trade.volume;
        self.execution = Some(Execution {
            parent,
            instrument,
            start_time,
            end_time,
            baseline_volume,
            not_below_last,
        });

        self.modify(params)?;

        let Some(execution) = self.execution.as_ref() else {
            return Err(AlgoError::NotRunning(self.state));
        };
        if self.params.min_size.is_none() && !execution.security().has_lot_size() {
            return Err(AlgoError::MinSizeRequired);
        }

        let internal_cross = params
            .get(names::INTERNAL_CROSS)
            .and_then(|v| v.as_flag())
            .unwrap_or(false);
        if internal_cross {
            let parent = &execution.parent;
            if let Err(e) = self.ctx.router.cross(
                parent.quantity,
                self.params.price_limit,
                parent.side,
                &parent.sub_account,
                execution.instrument.as_ref(),
            ) {
                warn!("[{} {}] internal cross failed: {}", self.name(), self.id, e);
            }
        }

        info!(
            "[{} {}] {} {} {} over {}s ({})",
            self.name(),
            self.id,
            execution.parent.side,
            execution.parent.quantity,
            execution.security().symbol,
            valid_seconds,
            self.params.aggression
        );
        Ok(())
    }

    /// Apply new parameter values while validating or running
    pub fn modify(&mut self, params: &ParamMap) -> Result<()> {
        if !self.state.is_active() {
            return Err(AlgoError::NotRunning(self.state));
        }
        let Some(execution) = self.execution.as_ref() else {
            return Err(AlgoError::NotRunning(self.state));
        };
        self.params.modify(params, execution.security())
    }

    /// Host callback for parameter changes; failures are only logged
    pub fn on_modify(&mut self, params: &ParamMap) {
        if let Err(e) = self.modify(params) {
            error!("[{} {}] {}", self.name(), self.id, e);
        }
    }

    /// Stop the algorithm and release the subscription. Safe to call twice.
    pub fn stop(&mut self) {
        if self.state.is_finished() {
            return;
        }
        if let Some(execution) = self.execution.as_ref() {
            execution.instrument.release();
        }
        self.state = AlgoState::Stopped;
        debug!("[{} {}] stopped", self.name(), self.id);
    }

    /// One pass of the decision loop
    pub fn on_timer(&mut self) -> TickOutcome {
        if self.state != AlgoState::Running {
            return TickOutcome::finished(TickDecision::Inactive);
        }
        let Some(execution) = self.execution.as_ref() else {
            return TickOutcome::finished(TickDecision::Inactive);
        };

        let now = self.ctx.clock.now();
        if now > execution.end_time {
            info!("[{} {}] horizon elapsed", self.name(), self.id);
            self.stop();
            return TickOutcome::finished(TickDecision::Expired);
        }

        let security = execution.security();
        if !security.is_in_trade_period(now) {
            return TickOutcome::rearm(TickDecision::OutsideTradingPeriod);
        }

        let parent = &execution.parent;
        let instrument = &execution.instrument;
        let snapshot = instrument.snapshot();
        let selector = PriceSelector::new(
            parent.side,
            self.params.aggression,
            self.params.price_limit,
            execution.not_below_last,
        );
        let Some(target) = selector.select(&snapshot, security) else {
            return TickOutcome::rearm(TickDecision::NoPrice);
        };

        let active = instrument.active_orders();
        if !active.is_empty() {
            let mut cancelled = 0;
            for order in uncompetitive_orders(parent.side, target, &active, &snapshot) {
                match self.ctx.router.cancel(order) {
                    Ok(()) => {
                        cancelled += 1;
                        debug!(
                            "[{} {}] cancel {} {:?} behind market",
                            Self::NAME,
                            self.id,
                            order.id,
                            order.price
                        );
                    }
                    Err(e) => {
                        warn!("[{} {}] cancel {} failed: {}", Self::NAME, self.id, order.id, e)
                    }
                }
            }
            return TickOutcome::rearm(TickDecision::Working { cancelled });
        }

        let guard = ParticipationGuard::new(execution.baseline_volume, self.params.max_pov);
        if guard.is_throttled(
            snapshot.trade.volume,
            instrument.cum_qty(),
            instrument.cum_cx_qty(),
        ) {
            return TickOutcome::rearm(TickDecision::Throttled);
        }

        let exposure = instrument.total_exposure();
        let curve = QuantityCurve::from_params(&self.params);
        let leaves = curve.leaves(
            parent.quantity,
            exposure,
            seconds(now - execution.start_time),
            seconds(execution.end_time - execution.start_time),
            &mut self.perturbation,
        );
        if leaves <= Decimal::ZERO {
            return TickOutcome::rearm(TickDecision::NothingDue);
        }

        let sizer = ClipSizer::new(security, &self.params);
        let max_qty = sizer.max_placeable(parent.quantity - exposure);
        if max_qty <= Decimal::ZERO {
            return TickOutcome::rearm(TickDecision::NoLotsAvailable);
        }
        let qty = sizer.size(leaves, max_qty);
        if qty <= Decimal::ZERO {
            return TickOutcome::rearm(TickDecision::NothingDue);
        }

        let order = child_order(parent, target, qty).with_owner(instrument.id());
        match self.ctx.router.place(&order) {
            Ok(_) => {
                debug!(
                    "[{} {}] placed {} {} {} @ {:?}",
                    Self::NAME,
                    self.id,
                    order.side,
                    order.quantity,
                    order.symbol,
                    order.price
                );
                TickOutcome::rearm(TickDecision::Placed(order))
            }
            Err(e) => {
                error!("[{} {}] place failed: {}", Self::NAME, self.id, e);
                TickOutcome::rearm(TickDecision::Rejected(e.to_string()))
            }
        }
    }

    pub fn on_market_trade(&self, snapshot: &MarketSnapshot) {
        let Some(execution) = self.execution.as_ref() else {
            return;
        };
        let t = &snapshot.trade;
        debug!(
            "{} trade: {} {} {} {} {} {} {}",
            execution.security().symbol,
            t.open,
            t.high,
            t.low,
            t.close,
            t.qty,
            t.vwap,
            t.volume
        );
    }

    pub fn on_market_quote(&self, snapshot: &MarketSnapshot) {
        let Some(execution) = self.execution.as_ref() else {
            return;
        };
        let q = &snapshot.quote;
        debug!(
            "{} quote: {:?} {} {:?} {}",
            execution.security().symbol,
            q.ask_price,
            q.ask_size,
            q.bid_price,
            q.bid_size
        );
    }

    /// Stops once cumulative fills reach the target
    pub fn on_execution(&mut self, report: &ExecutionReport) {
        if self.state != AlgoState::Running {
            return;
        }
        let Some(execution) = self.execution.as_ref() else {
            return;
        };
        let filled = execution.instrument.cum_qty();
        debug!(
            "[{} {}] {} {:?} filled {}/{}",
            Self::NAME,
            self.id,
            report.order_id,
            report.status,
            filled,
            execution.parent.quantity
        );
        if filled >= execution.parent.quantity {
            info!("[{} {}] target filled", Self::NAME, self.id);
            self.stop();
        }
    }
}
