use dashmap::DashMap;
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tempo_core::ParentOrder;
use tempo_twap::{AlgoContext, AlgoId, ParamMap, RandomPerturbation, TwapAlgo};

use crate::dispatcher::{AlgoDispatcher, AlgoHandle};
use crate::error::{Result, RunnerError};

/// Live algorithm instances, each on its own dispatcher task
pub struct AlgoRegistry {
    ctx: AlgoContext,
    tick_interval: Duration,
    /// Base seed for reproducible runs; entropy when unset
    seed: Option<u64>,
    next_id: AtomicU64,
    algos: DashMap<AlgoId, AlgoHandle>,
}

impl AlgoRegistry {
    pub fn new(ctx: AlgoContext, tick_interval: Duration) -> Self {
        Self {
            ctx,
            tick_interval,
            seed: None,
            next_id: AtomicU64::new(1),
            algos: DashMap::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate and start a new instance, then hand it to a dispatcher.
    ///
    /// Start errors are returned and nothing is registered.
    pub fn start(&self, parent: ParentOrder, params: &ParamMap) -> Result<AlgoHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let perturbation = RandomPerturbation::new(self.seed.map(|s| s.wrapping_add(id)));
        let mut algo = TwapAlgo::new(id, self.ctx.clone(), perturbation);
        algo.start(parent, params)?;

        let handle = AlgoDispatcher::spawn(algo, self.tick_interval);
        self.algos.insert(id, handle.clone());
        info!("[REGISTRY] algo {id} started ({} live)", self.algos.len());
        Ok(handle)
    }

    pub fn get(&self, id: AlgoId) -> Option<AlgoHandle> {
        self.algos.get(&id).map(|h| h.clone())
    }

    pub async fn modify(&self, id: AlgoId, params: ParamMap) -> Result<()> {
        let handle = self.get(id).ok_or(RunnerError::UnknownAlgo(id))?;
        handle.modify(params).await
    }

    /// Request a stop; an instance that already finished counts as stopped
    pub async fn stop(&self, id: AlgoId) -> Result<()> {
        let handle = self.get(id).ok_or(RunnerError::UnknownAlgo(id))?;
        match handle.stop().await {
            Ok(()) | Err(RunnerError::AlgoGone(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn len(&self) -> usize {
        self.algos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algos.is_empty()
    }

    /// Drop handles of instances that have finished; returns how many
    pub fn prune(&self) -> usize {
        let before = self.algos.len();
        self.algos.retain(|_, handle| !handle.state().is_finished());
        before - self.algos.len()
    }
}
