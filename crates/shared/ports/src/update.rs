use chrono::{DateTime, Utc};
use meridian_core::Order;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What happened to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

/// Notification pushed to a broker subscriber
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Order state after the event was applied
    pub order: Order,
    pub event: OrderEvent,
    pub timestamp: DateTime<Utc>,
}

impl OrderUpdate {
    pub fn new(order: Order, event: OrderEvent) -> Self {
        Self {
            order,
            event,
            timestamp: Utc::now(),
        }
    }
}

/// Callback receiving order updates
///
/// Brokers invoke it off their state-mutation path, so a slow handler only
/// delays its own delivery.
pub type OrderUpdateHandler = Arc<dyn Fn(OrderUpdate) + Send + Sync>;
