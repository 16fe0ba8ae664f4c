//! Parameter Store
//!
//! Holds the runtime-modifiable configuration of one algorithm instance and
//! the validation/normalization applied when the host changes it:
//! - Price limit rounded to the security's tick
//! - Min/max clip sizes rounded to lot multiples
//! - Participation fraction clamped to 1
//! - Aggression parsed from four tiers
//! - Tilt converted into the release-curve steepness

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tempo_core::{Price, Quantity, Security};

use crate::error::{AlgoError, Result};

/// Parameter names understood by the algorithm
pub mod names {
    pub const SECURITY: &str = "Security";
    pub const VALID_SECONDS: &str = "ValidSeconds";
    pub const PRICE: &str = "Price";
    pub const MIN_SIZE: &str = "MinSize";
    pub const MAX_FLOOR: &str = "MaxFloor";
    pub const MAX_POV: &str = "MaxPov";
    pub const AGGRESSION: &str = "Aggression";
    pub const RANDOMIZE: &str = "Randomize";
    pub const TILT: &str = "Tilt";
    pub const INTERNAL_CROSS: &str = "InternalCross";
}

/// A single parameter value as delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(Decimal),
    Text(String),
}

impl ParamValue {
    /// Numeric view; numeric text is accepted
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ParamValue::Number(d) => Some(*d),
            ParamValue::Text(s) => s.trim().parse().ok(),
            ParamValue::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Yes/No flags; booleans are accepted as well
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Text(s) if s.eq_ignore_ascii_case("yes") => Some(true),
            ParamValue::Text(s) if s.eq_ignore_ascii_case("no") => Some(false),
            _ => None,
        }
    }
}

impl From<Decimal> for ParamValue {
    fn from(d: Decimal) -> Self {
        ParamValue::Number(d)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Number(Decimal::from(v))
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Number(Decimal::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

/// Named parameters, partially populated on modify
pub type ParamMap = HashMap<String, ParamValue>;

/// Build a [`ParamMap`] from name/value pairs
pub fn param_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> ParamMap
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Read a numeric parameter; `Ok(None)` when absent
pub fn get_number(params: &ParamMap, name: &str) -> Result<Option<Decimal>> {
    match params.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_decimal()
            .map(Some)
            .ok_or_else(|| AlgoError::invalid_param(name, "expected a number")),
    }
}

/// Read a text parameter; `Ok(None)` when absent
pub fn get_text<'a>(params: &'a ParamMap, name: &str) -> Result<Option<&'a str>> {
    match params.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_text()
            .map(Some)
            .ok_or_else(|| AlgoError::invalid_param(name, "expected text")),
    }
}

/// Declared bounds of an optional numeric parameter
#[derive(Debug, Clone, Copy)]
pub struct ParamDef {
    pub name: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Numeric parameters with declared bounds
pub const PARAM_DEFS: &[ParamDef] = &[
    ParamDef {
        name: names::MAX_POV,
        min: Some(0.0),
        max: None,
    },
    ParamDef {
        name: names::RANDOMIZE,
        min: Some(0.0),
        max: Some(10.0),
    },
    ParamDef {
        name: names::TILT,
        min: Some(-10.0),
        max: Some(10.0),
    },
];

pub fn param_def(name: &str) -> Option<&'static ParamDef> {
    PARAM_DEFS.iter().find(|d| d.name == name)
}

fn check_bounds(name: &str, value: f64) -> Result<f64> {
    if let Some(def) = param_def(name) {
        if let Some(min) = def.min.filter(|min| value < *min) {
            return Err(AlgoError::invalid_param(name, format!("{value} is below {min}")));
        }
        if let Some(max) = def.max.filter(|max| value > *max) {
            return Err(AlgoError::invalid_param(name, format!("{value} is above {max}")));
        }
    }
    Ok(value)
}

fn to_f64(name: &str, value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| AlgoError::invalid_param(name, "not representable"))
}

/// Price-selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Aggression {
    /// Join the near touch
    #[default]
    Low,
    /// Midpoint
    Medium,
    /// Cross to the far touch
    High,
    /// Market order
    Highest,
}

impl Aggression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggression::Low => "Low",
            Aggression::Medium => "Medium",
            Aggression::High => "High",
            Aggression::Highest => "Highest",
        }
    }
}

impl fmt::Display for Aggression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggression {
    type Err = AlgoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Low" => Ok(Aggression::Low),
            "Medium" => Ok(Aggression::Medium),
            "High" => Ok(Aggression::High),
            "Highest" => Ok(Aggression::Highest),
            other => Err(AlgoError::InvalidAggression(other.to_string())),
        }
    }
}

/// Convert a tilt level into the release-curve exponent.
///
/// Tilt 10 front-loads (about half the order in the first 1% of the time),
/// tilt -10 back-loads (under 1% by half time, about 20% by 80% of the time),
/// tilt 0 is linear.
pub fn tilt_to_steepness(tilt: f64) -> f64 {
    (-tilt / 5.0).exp()
}

/// Runtime-mutable algorithm parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStore {
    /// Limit price; buys never above, sells never below
    pub price_limit: Option<Price>,
    pub min_size: Option<Quantity>,
    /// Largest clip ("max floor")
    pub max_floor: Option<Quantity>,
    /// Max fraction of market volume since start, zero for no cap
    pub max_pov: Decimal,
    pub aggression: Aggression,
    /// Randomization magnitude in [0, 10]
    pub randomize: f64,
    pub tilt: f64,
    /// Exponent applied to the elapsed-time ratio
    pub steepness: f64,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            price_limit: None,
            min_size: None,
            max_floor: None,
            max_pov: Decimal::ZERO,
            aggression: Aggression::Low,
            randomize: 0.0,
            tilt: 0.0,
            steepness: 1.0,
        }
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the fields present in `params`, normalized against `security`.
    ///
    /// Fields are applied one at a time and the first invalid field aborts the
    /// call; fields applied before it stay applied. Absent fields are left
    /// untouched, so an empty map is a no-op.
    pub fn modify(&mut self, params: &ParamMap, security: &Security) -> Result<()> {
        if let Some(price) = get_number(params, names::PRICE)? {
            self.price_limit = (price > Decimal::ZERO).then(|| security.round_price(price));
        }

        if let Some(min_size) = get_number(params, names::MIN_SIZE)? {
            self.min_size = (min_size > Decimal::ZERO).then(|| security.round_lot(min_size));
        }

        if let Some(max_floor) = get_number(params, names::MAX_FLOOR)? {
            let max_floor = (max_floor > Decimal::ZERO).then(|| security.floor_lot(max_floor));
            self.max_floor = match (max_floor, self.min_size) {
                (Some(max), Some(min)) if max < min => None,
                (max, _) => max,
            };
        }

        if let Some(max_pov) = get_number(params, names::MAX_POV)? {
            check_bounds(names::MAX_POV, to_f64(names::MAX_POV, max_pov)?)?;
            self.max_pov = max_pov.min(Decimal::ONE);
        }

        if let Some(aggression) = get_text(params, names::AGGRESSION)? {
            self.aggression = aggression.parse()?;
        }

        if let Some(randomize) = get_number(params, names::RANDOMIZE)? {
            self.randomize = check_bounds(names::RANDOMIZE, to_f64(names::RANDOMIZE, randomize)?)?;
        }

        if let Some(tilt) = get_number(params, names::TILT)? {
            self.tilt = check_bounds(names::TILT, to_f64(names::TILT, tilt)?)?;
            self.steepness = tilt_to_steepness(self.tilt);
        }

        Ok(())
    }

    /// Configured min clip, zero when unset
    pub fn min_clip(&self) -> Quantity {
        self.min_size.unwrap_or(Decimal::ZERO)
    }

    /// Max floor, ignored when it would undercut the min clip
    pub fn effective_max_floor(&self) -> Option<Quantity> {
        self.max_floor
            .filter(|max| self.min_size.is_none_or(|min| *max >= min))
    }
}
