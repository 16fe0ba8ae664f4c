use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempo_core::{ParentOrder, PositionEffect, Quantity, Security, Side, Timestamp};
use tempo_twap::ParamMap;

use crate::market::RandomWalkConfig;

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_sub_account() -> String {
    "default".to_string()
}

fn default_fill_on_touch() -> bool {
    true
}

fn default_max_steps() -> u64 {
    86_400
}

/// 2024-01-02T09:30:00Z
fn default_start_time() -> Timestamp {
    DateTime::from_timestamp(1_704_187_800, 0).unwrap_or_default()
}

/// A session file: shared settings plus the backtests to run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Timer period for live dispatchers
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Seed used by backtests that do not set their own
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub backtests: Vec<BacktestConfig>,
}

/// One parent order replayed against a simulated market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub name: String,
    pub security: Security,
    pub side: Side,
    pub quantity: Quantity,
    #[serde(default = "default_sub_account")]
    pub sub_account: String,
    #[serde(default)]
    pub position_effect: PositionEffect,
    /// Algorithm parameters, as the host would send them
    #[serde(default)]
    pub params: ParamMap,
    pub market: RandomWalkConfig,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_fill_on_touch")]
    pub fill_on_touch: bool,
    #[serde(default = "default_start_time")]
    pub start_time: Timestamp,
    /// Hard stop for the simulation loop
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
}

impl BacktestConfig {
    pub fn new(
        name: impl Into<String>,
        security: Security,
        side: Side,
        quantity: Quantity,
        market: RandomWalkConfig,
    ) -> Self {
        Self {
            name: name.into(),
            security,
            side,
            quantity,
            sub_account: default_sub_account(),
            position_effect: PositionEffect::Open,
            params: ParamMap::new(),
            market,
            seed: None,
            fill_on_touch: default_fill_on_touch(),
            start_time: default_start_time(),
            max_steps: default_max_steps(),
        }
    }

    pub fn with_params(mut self, params: ParamMap) -> Self {
        self.params = params;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn parent_order(&self) -> ParentOrder {
        ParentOrder::new(
            Arc::new(self.security.clone()),
            self.sub_account.clone(),
            self.side,
            self.quantity,
        )
        .with_position_effect(self.position_effect)
    }
}
