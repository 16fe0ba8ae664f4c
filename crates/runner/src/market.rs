//! Market paths for backtests
//!
//! A path yields one market step per simulated second: the new top of book
//! and, optionally, a trade print. Seeded random walks keep backtests
//! reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tempo_core::{Price, Quantity, Quote};

/// A trade print
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Print {
    pub price: Price,
    pub quantity: Quantity,
}

/// Market state for one simulated second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStep {
    pub quote: Quote,
    #[serde(default)]
    pub trade: Option<Print>,
}

impl MarketStep {
    pub fn quote(bid: Price, ask: Price, size: Quantity) -> Self {
        Self {
            quote: Quote {
                bid_price: Some(bid),
                bid_size: size,
                ask_price: Some(ask),
                ask_size: size,
            },
            trade: None,
        }
    }

    pub fn with_trade(mut self, price: Price, quantity: Quantity) -> Self {
        self.trade = Some(Print { price, quantity });
        self
    }
}

/// Source of market steps
pub trait MarketPath: Send {
    fn next_step(&mut self) -> MarketStep;
}

fn default_spread_ticks() -> u32 {
    1
}

fn default_volatility_ticks() -> u32 {
    1
}

fn default_trade_probability() -> f64 {
    0.5
}

fn default_max_trade_qty() -> Quantity {
    dec!(1000)
}

fn default_quote_size() -> Quantity {
    dec!(1000)
}

/// Random-walk parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomWalkConfig {
    pub initial_price: Price,
    #[serde(default = "default_spread_ticks")]
    pub spread_ticks: u32,
    /// Largest bid move per step, in ticks
    #[serde(default = "default_volatility_ticks")]
    pub volatility_ticks: u32,
    /// Chance of a trade print each step
    #[serde(default = "default_trade_probability")]
    pub trade_probability: f64,
    #[serde(default = "default_max_trade_qty")]
    pub max_trade_qty: Quantity,
    #[serde(default = "default_quote_size")]
    pub quote_size: Quantity,
}

impl RandomWalkConfig {
    pub fn new(initial_price: Price) -> Self {
        Self {
            initial_price,
            spread_ticks: default_spread_ticks(),
            volatility_ticks: default_volatility_ticks(),
            trade_probability: default_trade_probability(),
            max_trade_qty: default_max_trade_qty(),
            quote_size: default_quote_size(),
        }
    }
}

/// Bid moves by whole ticks; trades print at either touch in whole lots
pub struct RandomWalk {
    config: RandomWalkConfig,
    tick: Price,
    lot: Quantity,
    bid: Price,
    rng: StdRng,
}

impl RandomWalk {
    pub fn new(config: RandomWalkConfig, tick: Price, lot: Quantity, seed: Option<u64>) -> Self {
        let tick = if tick > Decimal::ZERO { tick } else { dec!(0.01) };
        let lot = if lot > Decimal::ZERO { lot } else { Decimal::ONE };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            bid: config.initial_price.max(tick),
            config,
            tick,
            lot,
            rng,
        }
    }

    fn ask(&self) -> Price {
        self.bid + self.tick * Decimal::from(self.config.spread_ticks.max(1))
    }
}

impl MarketPath for RandomWalk {
    fn next_step(&mut self) -> MarketStep {
        let vol = i64::from(self.config.volatility_ticks);
        let moved = self.rng.gen_range(-vol..=vol);
        self.bid = (self.bid + self.tick * Decimal::from(moved)).max(self.tick);

        let mut step = MarketStep::quote(self.bid, self.ask(), self.config.quote_size);

        let p = self.config.trade_probability;
        if (0.0..=1.0).contains(&p) && self.rng.gen_bool(p) {
            let max_lots = (self.config.max_trade_qty / self.lot)
                .floor()
                .to_u64()
                .unwrap_or(1)
                .max(1);
            let lots = self.rng.gen_range(1..=max_lots);
            let price = if self.rng.gen_bool(0.5) {
                self.bid
            } else {
                self.ask()
            };
            step = step.with_trade(price, self.lot * Decimal::from(lots));
        }
        step
    }
}

/// Replays fixed steps, then holds the last quote with no further trades
pub struct ScriptedPath {
    steps: Vec<MarketStep>,
    next: usize,
}

impl ScriptedPath {
    pub fn new(steps: Vec<MarketStep>) -> Self {
        Self { steps, next: 0 }
    }
}

impl MarketPath for ScriptedPath {
    fn next_step(&mut self) -> MarketStep {
        if let Some(step) = self.steps.get(self.next) {
            self.next += 1;
            return step.clone();
        }
        match self.steps.last() {
            Some(last) => MarketStep {
                quote: last.quote.clone(),
                trade: None,
            },
            None => MarketStep {
                quote: Quote::default(),
                trade: None,
            },
        }
    }
}
