//! Quantity release curve
//!
//! Maps elapsed time to the fraction of the parent order that should be
//! filled (or working) by now. The base ratio grows linearly with time, is
//! bent by the steepness exponent derived from tilt, and optionally jittered
//! so child-order timing is harder to detect.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tempo_core::Quantity;

use crate::params::ParameterStore;
use crate::perturbation::RandomPerturbation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityCurve {
    steepness: f64,
    randomize: f64,
}

impl QuantityCurve {
    pub fn new(steepness: f64, randomize: f64) -> Self {
        Self {
            steepness,
            randomize,
        }
    }

    pub fn from_params(params: &ParameterStore) -> Self {
        Self::new(params.steepness, params.randomize)
    }

    /// Deterministic part of the curve for a fraction `x` of the horizon
    pub fn shape(&self, x: f64) -> f64 {
        if self.steepness == 1.0 {
            x
        } else {
            x.powf(self.steepness)
        }
    }

    /// Release ratio after `elapsed` of `duration` seconds.
    ///
    /// Both are shifted by one second so the first tick already releases a
    /// slice.
    pub fn ratio(
        &self,
        elapsed: f64,
        duration: f64,
        perturbation: &mut RandomPerturbation,
    ) -> f64 {
        let base = (elapsed + 1.0) / (duration + 1.0);
        let mut ratio = self.shape(base);
        if self.randomize != 0.0 {
            ratio += self.randomize * perturbation.sample();
        }
        ratio
    }

    /// Cumulative quantity that should be exposed at `ratio`
    pub fn expected(target: Quantity, ratio: f64) -> Quantity {
        let ratio = Decimal::from_f64(ratio)
            .unwrap_or(Decimal::ZERO)
            .round_dp(6);
        target * ratio
    }

    /// Quantity still to release now: expected minus current exposure
    pub fn leaves(
        &self,
        target: Quantity,
        exposure: Quantity,
        elapsed: f64,
        duration: f64,
        perturbation: &mut RandomPerturbation,
    ) -> Quantity {
        let ratio = self.ratio(elapsed, duration, perturbation);
        Self::expected(target, ratio) - exposure
    }
}

impl Default for QuantityCurve {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::tilt_to_steepness;
    use approx::assert_abs_diff_eq;
    use rust_decimal_macros::dec;

    fn curve(tilt: f64) -> QuantityCurve {
        QuantityCurve::new(tilt_to_steepness(tilt), 0.0)
    }

    #[test]
    fn test_linear_at_zero_tilt() {
        let c = curve(0.0);
        let mut p = RandomPerturbation::seeded(1);
        assert_abs_diff_eq!(c.ratio(299.0, 599.0, &mut p), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(c.shape(0.25), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_front_loaded_tilt() {
        // about half the order within the first 1% of the horizon
        assert_abs_diff_eq!(curve(10.0).shape(0.01), 0.5, epsilon = 0.05);
    }

    #[test]
    fn test_back_loaded_tilt() {
        let c = curve(-10.0);
        assert!(c.shape(0.5) < 0.01);
        assert_abs_diff_eq!(c.shape(0.8), 0.2, epsilon = 0.02);
    }

    #[test]
    fn test_monotonic_for_all_tilts() {
        for tilt in -10..=10 {
            let c = curve(f64::from(tilt));
            let mut prev = c.shape(0.0);
            for step in 1..=100 {
                let next = c.shape(f64::from(step) / 100.0);
                assert!(next > prev, "tilt {tilt} not increasing at step {step}");
                prev = next;
            }
            assert_abs_diff_eq!(prev, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_randomization_bounded() {
        let c = QuantityCurve::new(1.0, 10.0);
        let mut p = RandomPerturbation::seeded(7);
        for _ in 0..500 {
            let r = c.ratio(299.0, 599.0, &mut p);
            // magnitude 10 jitters by at most 0.1
            assert!((0.4..=0.6).contains(&r));
        }
    }

    #[test]
    fn test_leaves_subtract_exposure() {
        let c = QuantityCurve::default();
        let mut p = RandomPerturbation::seeded(1);
        // 300s into a 600s horizon
        let leaves = c.leaves(dec!(10000), dec!(4000), 300.0, 600.0, &mut p);
        let expected = QuantityCurve::expected(dec!(10000), 301.0 / 601.0);
        assert_eq!(leaves, expected - dec!(4000));
        assert!(leaves > dec!(1000) && leaves < dec!(1020));
    }
}
