//! Signal - What strategies hand to the execution engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// Recommended action carried by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalAction {
    /// Order side for this action, `None` for Hold
    pub fn side(&self) -> Option<Side> {
        match self {
            SignalAction::Buy | SignalAction::StrongBuy => Some(Side::Buy),
            SignalAction::Sell | SignalAction::StrongSell => Some(Side::Sell),
            SignalAction::Hold => None,
        }
    }
}

/// Trading signal from a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub action: SignalAction,
    /// Confidence in the signal (0.0 - 1.0)
    pub confidence: Decimal,
    pub generated_at: DateTime<Utc>,
}

impl Signal {
    /// Create a new signal with full confidence
    pub fn new(symbol: impl Into<String>, action: SignalAction) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            confidence: Decimal::ONE,
            generated_at: Utc::now(),
        }
    }

    /// Builder: Set confidence
    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = confidence.clamp(Decimal::ZERO, Decimal::ONE);
        self
    }
}
