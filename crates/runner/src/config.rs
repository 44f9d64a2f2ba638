//! Engine configuration
//!
//! One JSON document covers the whole engine:
//!
//! ```json
//! {
//!   "execution": { "mode": "batch", "batch_time": "09:30", "default_size_pct": "5" },
//!   "risk": { "max_position_pct": "10", "max_daily_loss_pct": "5", "max_open_positions": 20 },
//!   "broker": { "initial_cash": "100000", "fill_delay_ms": 100 }
//! }
//! ```
//!
//! Every section and field is optional and falls back to its default.

use meridian_broker_sim::SimulatorConfig;
use meridian_order_manager::ExecutionConfig;
use meridian_risk_manager::RiskConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration for the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub execution: ExecutionConfig,
    pub risk: RiskConfig,
    pub broker: SimulatorConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.execution
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.risk
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.broker.initial_cash.is_sign_negative() {
            return Err(ConfigError::Invalid(format!(
                "broker initial_cash must not be negative, got {}",
                self.broker.initial_cash
            )));
        }
        Ok(())
    }
}
