use chrono::{Duration, Utc};
use std::sync::{Arc, RwLock};
use tempo_core::Timestamp;
use tempo_ports::Clock;

/// Simulation clock - only advances when explicitly moved
///
/// Shared between the backtest driver (which advances it) and every component
/// that reads time (algorithm, paper venue), so all of them agree on "now".
pub struct SimClock {
    current_time: RwLock<Timestamp>,
}

impl SimClock {
    /// Create a new simulation clock
    ///
    /// # Arguments
    /// * `initial_time` - Starting time
    pub fn new(initial_time: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            current_time: RwLock::new(initial_time),
        })
    }

    /// Create a simulation clock starting at the current wall time
    pub fn starting_now() -> Arc<Self> {
        Self::new(Utc::now())
    }

    /// Advance the simulated time by a specified duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current += duration;
    }

    /// Explicitly set the simulation time
    ///
    /// Warning: moving time backwards confuses elapsed-time calculations.
    pub fn set_time(&self, time: Timestamp) {
        let mut current = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = time;
    }
}

impl Clock for SimClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn name(&self) -> &str {
        "SimClock"
    }
}
