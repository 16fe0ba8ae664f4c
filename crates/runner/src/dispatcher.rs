//! Per-instance dispatcher
//!
//! Each running algorithm lives inside one tokio task. The repeating timer,
//! parameter changes, market data, execution reports and stop requests all
//! reach it through that task, so callbacks never overlap and the algorithm
//! needs no locking.

use log::{debug, error, info};
use std::time::Duration;
use tempo_core::{ExecutionReport, MarketSnapshot};
use tempo_twap::{AlgoError, AlgoId, AlgoState, ParamMap, TwapAlgo};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

use crate::error::{Result, RunnerError};

/// Market data forwarded to an instance
#[derive(Debug, Clone)]
pub enum MarketUpdate {
    Trade(MarketSnapshot),
    Quote(MarketSnapshot),
}

/// Commands accepted by the dispatcher task
#[derive(Debug)]
pub enum AlgoCommand {
    Modify {
        params: ParamMap,
        reply: oneshot::Sender<std::result::Result<(), AlgoError>>,
    },
    Market(MarketUpdate),
    Execution(ExecutionReport),
    Stop,
}

/// Client side of a dispatcher task
#[derive(Debug, Clone)]
pub struct AlgoHandle {
    id: AlgoId,
    tx: mpsc::Sender<AlgoCommand>,
    state_rx: watch::Receiver<AlgoState>,
}

impl AlgoHandle {
    pub fn id(&self) -> AlgoId {
        self.id
    }

    /// Last state published by the task
    pub fn state(&self) -> AlgoState {
        *self.state_rx.borrow()
    }

    async fn send(&self, command: AlgoCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| RunnerError::AlgoGone(self.id))
    }

    /// Change parameters; the algorithm's validation error is returned as is
    pub async fn modify(&self, params: ParamMap) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(AlgoCommand::Modify { params, reply }).await?;
        rx.await.map_err(|_| RunnerError::AlgoGone(self.id))??;
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(AlgoCommand::Stop).await
    }

    pub async fn market_update(&self, update: MarketUpdate) -> Result<()> {
        self.send(AlgoCommand::Market(update)).await
    }

    pub async fn execution(&self, report: ExecutionReport) -> Result<()> {
        self.send(AlgoCommand::Execution(report)).await
    }

    /// Wait until the instance is stopped or failed
    pub async fn finished(&self) -> AlgoState {
        let mut rx = self.state_rx.clone();
        loop {
            let state = *rx.borrow_and_update();
            if state.is_finished() {
                return state;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }
}

pub struct AlgoDispatcher;

impl AlgoDispatcher {
    /// Move a started algorithm into its own task, ticking every `tick_interval`.
    ///
    /// The first tick fires immediately. Must be called inside a tokio runtime.
    pub fn spawn(algo: TwapAlgo, tick_interval: Duration) -> AlgoHandle {
        let id = algo.id();
        let (tx, rx) = mpsc::channel(256);
        let (state_tx, state_rx) = watch::channel(algo.state());
        tokio::spawn(run(algo, rx, state_tx, tick_interval));
        AlgoHandle { id, tx, state_rx }
    }
}

async fn run(
    mut algo: TwapAlgo,
    mut rx: mpsc::Receiver<AlgoCommand>,
    state_tx: watch::Sender<AlgoState>,
    tick_interval: Duration,
) {
    let tag = format!("{} {}", algo.name(), algo.id());
    info!("[{tag}] dispatcher started");

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !algo.state().is_finished() {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = algo.on_timer();
                debug!("[{tag}] tick: {}", outcome.decision.label());
                if !outcome.rearm {
                    algo.stop();
                }
            }
            command = rx.recv() => match command {
                Some(AlgoCommand::Modify { params, reply }) => {
                    let result = algo.modify(&params);
                    if let Err(e) = &result {
                        error!("[{tag}] {e}");
                    }
                    let _ = reply.send(result);
                }
                Some(AlgoCommand::Market(MarketUpdate::Trade(md))) => algo.on_market_trade(&md),
                Some(AlgoCommand::Market(MarketUpdate::Quote(md))) => algo.on_market_quote(&md),
                Some(AlgoCommand::Execution(report)) => algo.on_execution(&report),
                Some(AlgoCommand::Stop) | None => algo.stop(),
            }
        }
        state_tx.send_replace(algo.state());
    }

    info!("[{tag}] dispatcher finished ({:?})", algo.state());
}
