//! Risk Limits
//!
//! Account-level limits applied to every order before submission.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid risk configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskConfigError {
    #[error("{field} must be in (0, 100], got {value}")]
    PercentOutOfRange { field: &'static str, value: Decimal },

    #[error("max_open_positions must be at least 1")]
    NoOpenPositions,
}

/// Configured risk limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Max value of a single order as % of total account value
    pub max_position_pct: Decimal,
    /// Daily loss (as % of total value) at which trading stops
    pub max_daily_loss_pct: Decimal,
    /// Max concurrently held positions (checked for buys)
    pub max_open_positions: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_pct: dec!(10),
            max_daily_loss_pct: dec!(5),
            max_open_positions: 20,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), RiskConfigError> {
        check_percent("max_position_pct", self.max_position_pct)?;
        check_percent("max_daily_loss_pct", self.max_daily_loss_pct)?;
        if self.max_open_positions == 0 {
            return Err(RiskConfigError::NoOpenPositions);
        }
        Ok(())
    }
}

fn check_percent(field: &'static str, value: Decimal) -> Result<(), RiskConfigError> {
    if value <= Decimal::ZERO || value > dec!(100) {
        return Err(RiskConfigError::PercentOutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RiskConfig::default();
        assert_eq!(config.max_position_pct, dec!(10));
        assert_eq!(config.max_daily_loss_pct, dec!(5));
        assert_eq!(config.max_open_positions, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: RiskConfig = serde_json::from_str(r#"{"max_open_positions": 3}"#).unwrap();
        assert_eq!(config.max_open_positions, 3);
        assert_eq!(config.max_position_pct, dec!(10));
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let config = RiskConfig {
            max_daily_loss_pct: dec!(0),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(RiskConfigError::PercentOutOfRange {
                field: "max_daily_loss_pct",
                value: dec!(0),
            })
        );

        let config = RiskConfig {
            max_position_pct: dec!(150),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RiskConfig {
            max_open_positions: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(RiskConfigError::NoOpenPositions));
    }
}
