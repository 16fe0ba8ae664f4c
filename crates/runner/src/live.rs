//! Live paper session
//!
//! Runs every configured parent order at once on wall-clock time. Each
//! instance gets its own dispatcher task through the [`AlgoRegistry`], and a
//! random-walk feed per security drives the shared paper venue on the
//! session's tick interval. Instances on the same security share one book but
//! keep separate order accounting.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempo_clock::SystemClock;
use tempo_core::Symbol;
use tempo_paper::{BookStats, PaperConfig, PaperVenue};
use tempo_ports::Clock;
use tempo_twap::{AlgoContext, AlgoId, AlgoState};
use tokio::time::MissedTickBehavior;

use crate::config::{BacktestConfig, SessionConfig};
use crate::dispatcher::{AlgoHandle, MarketUpdate};
use crate::error::Result;
use crate::market::{MarketPath, RandomWalk};
use crate::registry::AlgoRegistry;

/// Final state of one instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceOutcome {
    pub name: String,
    pub id: AlgoId,
    pub symbol: Symbol,
    pub final_state: AlgoState,
}

/// Outcome of a live session
#[derive(Debug, Clone)]
pub struct LiveReport {
    pub instances: Vec<InstanceOutcome>,
    /// Book counters per security, across every instance trading it
    pub books: BTreeMap<Symbol, BookStats>,
}

struct Instance {
    name: String,
    symbol: Symbol,
    handle: AlgoHandle,
}

struct Feed {
    symbol: Symbol,
    walk: RandomWalk,
}

pub struct LiveSession {
    venue: Arc<PaperVenue>,
    registry: AlgoRegistry,
    tick_interval: Duration,
    max_duration: Duration,
    configs: Vec<BacktestConfig>,
    feeds: Vec<Feed>,
}

impl LiveSession {
    /// Session over `configs`, timed by `session`.
    ///
    /// The first configuration listing a security sets its market walk. The
    /// venue fills on touch only if every configuration asks for it.
    pub fn new(session: &SessionConfig, configs: Vec<BacktestConfig>) -> Self {
        let clock = Arc::new(SystemClock::new());
        let venue = Arc::new(PaperVenue::new(
            clock.clone(),
            PaperConfig {
                fill_on_touch: configs.iter().all(|c| c.fill_on_touch),
                sources: Vec::new(),
            },
        ));

        let mut feeds: Vec<Feed> = Vec::new();
        for config in &configs {
            venue.add_security(config.security.clone());
            if feeds.iter().any(|f| f.symbol == config.security.symbol) {
                continue;
            }
            feeds.push(Feed {
                symbol: config.security.symbol.clone(),
                walk: RandomWalk::new(
                    config.market.clone(),
                    config.security.tick_size,
                    config.security.lot_size,
                    Some(session.seed_for(config).wrapping_add(1)),
                ),
            });
        }

        let tick_interval = session.tick_interval();
        let ctx = AlgoContext::new(clock.clone(), venue.clone(), venue.clone());
        let mut registry = AlgoRegistry::new(ctx, tick_interval);
        if let Some(seed) = session.seed {
            registry = registry.with_seed(seed);
        }

        info!(
            "[LIVE] {} orders on {} securities, {} ticking every {:?}",
            configs.len(),
            feeds.len(),
            clock.name(),
            tick_interval
        );
        let max_steps = configs.iter().map(|c| c.max_steps).max().unwrap_or(0);
        let max_steps = u32::try_from(max_steps).unwrap_or(u32::MAX);
        Self {
            venue,
            registry,
            tick_interval,
            max_duration: tick_interval.saturating_mul(max_steps),
            configs,
            feeds,
        }
    }

    /// Stop every instance still running after `max_duration`
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Run until every instance has finished or the session times out.
    ///
    /// Must be called inside a tokio runtime. Start errors abort the session
    /// after stopping the instances already running.
    pub async fn run(mut self) -> Result<LiveReport> {
        self.step_markets(&[]).await?;

        let mut instances = Vec::with_capacity(self.configs.len());
        for config in &self.configs {
            match self.registry.start(config.parent_order(), &config.params) {
                Ok(handle) => {
                    info!("[LIVE] {} started as algo {}", config.name, handle.id());
                    instances.push(Instance {
                        name: config.name.clone(),
                        symbol: config.security.symbol.clone(),
                        handle,
                    });
                }
                Err(e) => {
                    warn!("[LIVE] {} refused to start: {e}", config.name);
                    self.stop_all(&instances).await;
                    return Err(e);
                }
            }
        }

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        let deadline = tokio::time::sleep(self.max_duration);
        tokio::pin!(deadline);

        while !instances.iter().all(|i| i.handle.state().is_finished()) {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut deadline => {
                    warn!("[LIVE] session timed out after {:?}", self.max_duration);
                    break;
                }
            }
            self.route_reports(&instances).await?;
            self.step_markets(&instances).await?;
            self.route_reports(&instances).await?;
        }
        self.stop_all(&instances).await;

        let mut outcomes = Vec::with_capacity(instances.len());
        for instance in instances {
            let final_state = instance.handle.finished().await;
            info!("[LIVE] {} finished {:?}", instance.name, final_state);
            outcomes.push(InstanceOutcome {
                name: instance.name,
                id: instance.handle.id(),
                symbol: instance.symbol,
                final_state,
            });
        }
        let mut books = BTreeMap::new();
        for feed in &self.feeds {
            books.insert(feed.symbol.clone(), self.venue.book(&feed.symbol)?.stats());
        }
        self.registry.prune();
        Ok(LiveReport {
            instances: outcomes,
            books,
        })
    }

    /// Advance every feed one step and forward the new market state
    async fn step_markets(&mut self, instances: &[Instance]) -> Result<()> {
        for feed in &mut self.feeds {
            let step = feed.walk.next_step();
            self.venue.update_quote(&feed.symbol, step.quote)?;
            let book = self.venue.book(&feed.symbol)?;
            broadcast(instances, &feed.symbol, MarketUpdate::Quote(book.snapshot())).await;
            if let Some(print) = step.trade {
                self.venue
                    .record_trade(&feed.symbol, print.price, print.quantity)?;
                broadcast(instances, &feed.symbol, MarketUpdate::Trade(book.snapshot())).await;
            }
        }
        Ok(())
    }

    /// Hand each book's reports to every instance trading that security
    async fn route_reports(&self, instances: &[Instance]) -> Result<()> {
        for feed in &self.feeds {
            for report in self.venue.book(&feed.symbol)?.drain_reports() {
                debug!("[LIVE] {} {:?}", feed.symbol, report);
                for instance in instances.iter().filter(|i| i.symbol == feed.symbol) {
                    // finished instances no longer listen
                    let _ = instance.handle.execution(report.clone()).await;
                }
            }
        }
        Ok(())
    }

    async fn stop_all(&self, instances: &[Instance]) {
        for instance in instances {
            if let Err(e) = self.registry.stop(instance.handle.id()).await {
                warn!("[LIVE] stop {} failed: {e}", instance.name);
            }
        }
    }
}

async fn broadcast(instances: &[Instance], symbol: &str, update: MarketUpdate) {
    for instance in instances.iter().filter(|i| i.symbol == symbol) {
        let _ = instance.handle.market_update(update.clone()).await;
    }
}
