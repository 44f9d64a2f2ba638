use serde::{Deserialize, Serialize};

/// Order types accepted by a broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Execute at current market price
    Market,
    /// Execute at specified price or better
    Limit,
    /// Market order triggered when price reaches stop price
    Stop,
}
