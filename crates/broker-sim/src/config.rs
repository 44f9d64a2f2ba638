//! Simulator configuration
//!
//! Supports JSON configuration for:
//! - Account seed (currency, starting cash)
//! - Fill latency
//! - Reference prices used to fill market orders

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for [`SimulatedBroker`](crate::SimulatedBroker)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Broker name/identifier
    pub name: String,
    /// Account currency
    pub currency: String,
    /// Starting cash balance
    pub initial_cash: Decimal,
    /// Delay between acceptance and fill
    pub fill_delay_ms: u64,
    /// Fill price for market orders on symbols without a reference price
    pub default_market_price: Decimal,
    /// Per-symbol reference prices
    pub market_prices: HashMap<String, Decimal>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            name: "simulated".to_string(),
            currency: "USD".to_string(),
            initial_cash: dec!(100_000),
            fill_delay_ms: 100,
            default_market_price: dec!(100),
            market_prices: HashMap::new(),
        }
    }
}

impl SimulatorConfig {
    pub fn fill_delay(&self) -> Duration {
        Duration::from_millis(self.fill_delay_ms)
    }

    /// Builder: Set the fill delay
    pub fn with_fill_delay(mut self, delay: Duration) -> Self {
        self.fill_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Builder: Set starting cash
    pub fn with_initial_cash(mut self, cash: Decimal) -> Self {
        self.initial_cash = cash;
        self
    }

    /// Builder: Set a reference price for a symbol
    pub fn with_market_price(mut self, symbol: impl Into<String>, price: Decimal) -> Self {
        self.market_prices.insert(symbol.into(), price);
        self
    }
}

/// Failure injection for exercising error propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    #[default]
    None,
    /// Order placement and cancellation fail
    Orders,
    /// Order, position and balance queries fail
    Queries,
    /// Everything fails
    All,
}

impl FailureMode {
    pub fn fails_orders(&self) -> bool {
        matches!(self, FailureMode::Orders | FailureMode::All)
    }

    pub fn fails_queries(&self) -> bool {
        matches!(self, FailureMode::Queries | FailureMode::All)
    }
}
