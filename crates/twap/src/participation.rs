//! Participation cap
//!
//! Holds back new child orders while the instance's fills, net of cancels,
//! exceed `MaxPov` times the market volume printed since it started.

use rust_decimal::Decimal;
use tempo_core::Quantity;

/// Caps net fills at a fraction of the market volume traded since start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipationGuard {
    baseline_volume: Quantity,
    max_pov: Decimal,
}

impl ParticipationGuard {
    pub fn new(baseline_volume: Quantity, max_pov: Decimal) -> Self {
        Self {
            baseline_volume,
            max_pov,
        }
    }

    /// Market volume traded since the baseline was captured
    pub fn volume_since_start(&self, current_volume: Quantity) -> Quantity {
        current_volume - self.baseline_volume
    }

    /// True when fills net of cancels exceed the allowed share of volume.
    ///
    /// No volume yet, or a zero cap, never throttles.
    pub fn is_throttled(
        &self,
        current_volume: Quantity,
        cum_qty: Quantity,
        cum_cx_qty: Quantity,
    ) -> bool {
        let volume = self.volume_since_start(current_volume);
        if volume <= Decimal::ZERO || self.max_pov <= Decimal::ZERO {
            return false;
        }
        cum_qty - cum_cx_qty > self.max_pov * volume
    }
}
