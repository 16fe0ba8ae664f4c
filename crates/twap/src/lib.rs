//! Tempo TWAP
//!
//! Adaptive time-sliced execution of one parent order: a tilted, optionally
//! jittered release curve decides how much should be out by now, an
//! aggression tier picks the price, a participation cap throttles against
//! market volume, and lot rules shape each child order.
//!
//! The algorithm talks to the outside world only through the ports in
//! `tempo-ports`; scheduling is the host's job.

pub mod algo;
pub mod controller;
pub mod curve;
pub mod error;
pub mod params;
pub mod participation;
pub mod perturbation;
pub mod pricing;

pub use algo::{AlgoContext, AlgoId, AlgoState, MIN_VALID_SECONDS, TwapAlgo};
pub use controller::{ClipSizer, TickDecision, TickOutcome};
pub use curve::QuantityCurve;
pub use error::{AlgoError, Result};
pub use params::{
    Aggression, ParamDef, ParamMap, ParamValue, ParameterStore, names, param_map,
    tilt_to_steepness,
};
pub use participation::ParticipationGuard;
pub use perturbation::RandomPerturbation;
pub use pricing::{PriceSelector, PriceSource, TargetPrice};
