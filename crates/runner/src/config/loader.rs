use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tempo_twap::{MIN_VALID_SECONDS, names};
use thiserror::Error;

use super::types::{BacktestConfig, SessionConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("No backtests in config")]
    NoBacktests,
    #[error("Tick interval must be > 0")]
    ZeroTickInterval,
    #[error("Duplicate backtest name: {0}")]
    DuplicateName(String),
    #[error("Invalid backtest {name}: {reason}")]
    InvalidBacktest { name: String, reason: String },
}

/// Load a session configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SessionConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: SessionConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load a session configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<SessionConfig, ConfigError> {
    let config: SessionConfig = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded session
pub fn load_default_config() -> Result<SessionConfig, ConfigError> {
    let default_config = include_str!("session.json");
    load_config_from_str(default_config)
}

impl SessionConfig {
    pub fn get_backtest(&self, name: &str) -> Option<&BacktestConfig> {
        self.backtests.iter().find(|b| b.name == name)
    }

    /// Seed for a backtest: its own, else the session's, else zero
    pub fn seed_for(&self, backtest: &BacktestConfig) -> u64 {
        backtest.seed.or(self.seed).unwrap_or(0)
    }

    /// Timer period shared by live dispatchers and the live market feed
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtests.is_empty() {
            return Err(ConfigError::NoBacktests);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        let mut seen = HashSet::new();
        for backtest in &self.backtests {
            if !seen.insert(backtest.name.as_str()) {
                return Err(ConfigError::DuplicateName(backtest.name.clone()));
            }
            backtest.validate()?;
        }
        Ok(())
    }
}

impl BacktestConfig {
    /// Checks that need no running algorithm; parameter validation proper
    /// happens when the algorithm starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBacktest {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.quantity <= Decimal::ZERO {
            return Err(invalid("quantity must be > 0"));
        }
        if self.security.tick_size < Decimal::ZERO || self.security.lot_size < Decimal::ZERO {
            return Err(invalid("tick and lot sizes must not be negative"));
        }
        if self.market.initial_price <= Decimal::ZERO {
            return Err(invalid("initial price must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.market.trade_probability) {
            return Err(invalid("trade probability must be in [0, 1]"));
        }
        let valid_seconds = self
            .params
            .get(names::VALID_SECONDS)
            .and_then(|v| v.as_decimal())
            .unwrap_or(Decimal::ZERO);
        if valid_seconds < Decimal::from(MIN_VALID_SECONDS) {
            return Err(invalid("ValidSeconds must be >= 60"));
        }
        Ok(())
    }
}
