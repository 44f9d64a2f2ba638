use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order has been accepted by the broker but not yet filled
    Pending,
    /// Order has been partially filled
    Partial,
    /// Order has been completely filled
    Filled,
    /// Order has been cancelled by the user
    Cancelled,
    /// Order was rejected by the broker
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Returns true if the order can still fill or be cancelled
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_terminal_are_disjoint() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Partial,
            OrderStatus::Filled,
            OrderStatus::Cancelled,
            OrderStatus::Rejected,
        ] {
            assert_ne!(status.is_open(), status.is_terminal(), "{:?}", status);
        }
    }
}
