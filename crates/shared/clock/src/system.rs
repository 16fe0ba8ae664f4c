use chrono::Utc;
use tempo_core::Timestamp;
use tempo_ports::Clock;

/// Wall-clock time in UTC, used by live paper sessions.
///
/// Algorithm horizons and trading periods are then judged against real time,
/// while the dispatchers' tick cadence stays with the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
