//! Execution configuration

use crate::error::{Error, Result};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an actionable signal reaches the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Place immediately
    Auto,
    /// Queue until an operator confirms
    #[default]
    Confirm,
    /// Queue and confirm everything at the daily batch time
    Batch,
}

impl ExecutionMode {
    /// Whether orders are parked as pending instead of placed
    pub fn queues_orders(&self) -> bool {
        !matches!(self, ExecutionMode::Auto)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Auto => "auto",
            ExecutionMode::Confirm => "confirm",
            ExecutionMode::Batch => "batch",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Daily batch confirmation time, "HH:MM" (UTC)
    pub batch_time: String,
    /// Order size as % of total account value
    pub default_size_pct: Decimal,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Confirm,
            batch_time: "09:30".to_string(),
            default_size_pct: dec!(5),
        }
    }
}

impl ExecutionConfig {
    /// Config with the given mode and default sizing
    pub fn with_mode(mode: ExecutionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Parsed batch time
    pub fn batch_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.batch_time, "%H:%M").map_err(|e| {
            Error::Config(format!("invalid batch_time '{}': {}", self.batch_time, e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_size_pct <= Decimal::ZERO || self.default_size_pct > dec!(100) {
            return Err(Error::Config(format!(
                "default_size_pct must be in (0, 100], got {}",
                self.default_size_pct
            )));
        }
        self.batch_time()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutionConfig::default();
        assert_eq!(config.mode, ExecutionMode::Confirm);
        assert_eq!(
            config.batch_time().unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(config.default_size_pct, dec!(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_serialization() {
        let config: ExecutionConfig =
            serde_json::from_str(r#"{"mode": "batch", "batch_time": "15:45"}"#).unwrap();
        assert_eq!(config.mode, ExecutionMode::Batch);
        assert!(config.mode.queues_orders());
        assert!(!ExecutionMode::Auto.queues_orders());
        assert_eq!(config.default_size_pct, dec!(5));

        assert!(serde_json::from_str::<ExecutionConfig>(r#"{"mode": "manual"}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ExecutionConfig {
            batch_time: "25:00".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ExecutionConfig {
            default_size_pct: dec!(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ExecutionConfig {
            default_size_pct: dec!(100),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
