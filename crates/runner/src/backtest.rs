//! Backtest driver
//!
//! Replays a market path against one TWAP instance on a simulated clock.
//! Each simulated second runs, in order: one timer callback, a one-second
//! clock advance, the next market step (quote, then print), and delivery of
//! any execution reports the paper venue produced. Nothing here depends on
//! wall-clock time, so a fixed seed reproduces a run exactly.

use chrono::Duration;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempo_clock::SimClock;
use tempo_core::{ParentOrder, Price, Quantity, Side, Timestamp};
use tempo_paper::{PaperBook, PaperConfig, PaperVenue};
use tempo_ports::Clock;
use tempo_twap::{AlgoContext, AlgoState, ParamMap, RandomPerturbation, TwapAlgo};

use crate::config::BacktestConfig;
use crate::error::Result;
use crate::market::{MarketPath, MarketStep, Print, RandomWalk};

/// Outcome of one backtest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub name: String,
    pub side: Side,
    pub target_qty: Quantity,
    pub filled_qty: Quantity,
    pub crossed_qty: Quantity,
    pub child_orders: usize,
    pub cancels: usize,
    pub avg_fill_price: Option<Price>,
    /// VWAP of the market prints over the run
    pub market_vwap: Option<Price>,
    pub market_volume: Quantity,
    pub steps: u64,
    pub elapsed_secs: i64,
    pub final_state: AlgoState,
    /// Timer decisions by label
    pub decisions: BTreeMap<String, u64>,
}

impl BacktestReport {
    pub fn fill_ratio(&self) -> Decimal {
        if self.target_qty > Decimal::ZERO {
            self.filled_qty / self.target_qty
        } else {
            Decimal::ZERO
        }
    }

    /// Cost against market VWAP in basis points; positive is worse than VWAP
    pub fn slippage_bps(&self) -> Option<Decimal> {
        let avg = self.avg_fill_price?;
        let vwap = self.market_vwap.filter(|v| *v > Decimal::ZERO)?;
        let diff = match self.side {
            Side::Buy => avg - vwap,
            Side::Sell => vwap - avg,
        };
        Some((diff / vwap * Decimal::from(10_000)).round_dp(2))
    }
}

#[derive(Debug, Default)]
struct Tape {
    volume: Quantity,
    notional: Decimal,
}

impl Tape {
    fn record(&mut self, print: Print) {
        self.volume += print.quantity;
        self.notional += print.price * print.quantity;
    }

    fn vwap(&self) -> Option<Price> {
        (self.volume > Decimal::ZERO).then(|| self.notional / self.volume)
    }
}

pub struct Backtest {
    name: String,
    clock: Arc<SimClock>,
    venue: Arc<PaperVenue>,
    book: Arc<PaperBook>,
    algo: TwapAlgo,
    parent: ParentOrder,
    params: ParamMap,
    path: Box<dyn MarketPath>,
    max_steps: u64,
    tape: Tape,
}

impl Backtest {
    pub fn new(config: &BacktestConfig, path: Box<dyn MarketPath>, seed: u64) -> Self {
        let clock = SimClock::new(config.start_time);
        let venue = Arc::new(PaperVenue::new(
            clock.clone(),
            PaperConfig {
                fill_on_touch: config.fill_on_touch,
                sources: Vec::new(),
            },
        ));
        let book = venue.add_security(config.security.clone());
        let ctx = AlgoContext::new(clock.clone(), venue.clone(), venue.clone());
        let algo = TwapAlgo::new(1, ctx, RandomPerturbation::seeded(seed));

        Self {
            name: config.name.clone(),
            clock,
            venue,
            book,
            algo,
            parent: config.parent_order(),
            params: config.params.clone(),
            path,
            max_steps: config.max_steps,
            tape: Tape::default(),
        }
    }

    /// Backtest over the configured random walk. The walk and the algorithm
    /// draw from different streams of the same seed.
    pub fn from_config(config: &BacktestConfig, seed: u64) -> Self {
        let walk = RandomWalk::new(
            config.market.clone(),
            config.security.tick_size,
            config.security.lot_size,
            Some(seed.wrapping_add(1)),
        );
        Self::new(config, Box::new(walk), seed)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Run to completion. Fails only if the algorithm refuses to start.
    pub fn run(mut self) -> Result<BacktestReport> {
        let start = self.clock.now();
        let first = self.path.next_step();
        self.apply_step(first)?;
        self.algo.start(self.parent.clone(), &self.params)?;
        info!(
            "[BACKTEST {}] started {} {} {}",
            self.name, self.parent.side, self.parent.quantity, self.parent.security.symbol
        );

        let mut decisions: BTreeMap<String, u64> = BTreeMap::new();
        let mut steps = 0;
        while steps < self.max_steps {
            let outcome = self.algo.on_timer();
            *decisions
                .entry(outcome.decision.label().to_string())
                .or_default() += 1;
            self.deliver_reports();
            if !outcome.rearm || self.algo.state().is_finished() {
                break;
            }

            self.clock.advance(Duration::seconds(1));
            steps += 1;
            let step = self.path.next_step();
            self.apply_step(step)?;
            self.deliver_reports();
        }
        self.algo.stop();

        let stats = self.book.stats();
        let report = BacktestReport {
            name: self.name,
            side: self.parent.side,
            target_qty: self.parent.quantity,
            filled_qty: stats.filled_qty,
            crossed_qty: stats.crossed_qty,
            child_orders: stats.placed,
            cancels: stats.canceled,
            avg_fill_price: stats.avg_fill_price,
            market_vwap: self.tape.vwap(),
            market_volume: self.tape.volume,
            steps,
            elapsed_secs: (self.clock.now() - start).num_seconds(),
            final_state: self.algo.state(),
            decisions,
        };
        info!(
            "[BACKTEST {}] done: filled {}/{} in {}s over {} child orders",
            report.name,
            report.filled_qty,
            report.target_qty,
            report.elapsed_secs,
            report.child_orders
        );
        Ok(report)
    }

    fn apply_step(&mut self, step: MarketStep) -> Result<()> {
        let symbol = self.parent.security.symbol.clone();
        self.venue.update_quote(&symbol, step.quote)?;
        self.algo.on_market_quote(&self.book.snapshot());
        if let Some(print) = step.trade {
            self.venue.record_trade(&symbol, print.price, print.quantity)?;
            self.tape.record(print);
            self.algo.on_market_trade(&self.book.snapshot());
        }
        Ok(())
    }

    fn deliver_reports(&mut self) {
        for report in self.venue.drain_reports() {
            debug!("[BACKTEST {}] {:?}", self.name, report);
            self.algo.on_execution(&report);
        }
    }
}
