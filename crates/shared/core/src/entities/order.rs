use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Market, OrderRequest, OrderStatus, OrderType, Side};

/// Unique identifier for an order
pub type OrderId = Uuid;

/// Full order details, as held by a broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Broker-assigned identifier
    pub id: OrderId,
    pub symbol: String,
    pub market: Market,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Required for Limit orders
    pub price: Option<Decimal>,
    /// Required for Stop orders
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    /// Never exceeds `quantity`
    pub filled_quantity: Decimal,
    pub average_fill_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a pending order from a request with explicit timestamp
    pub fn from_request_with_time(request: &OrderRequest, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: request.symbol.clone(),
            market: request.market,
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            stop_price: request.stop_price,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            average_fill_price: Decimal::ZERO,
            created_at: timestamp,
            updated_at: timestamp,
            filled_at: None,
        }
    }

    /// Create a pending order from a request using current system time
    pub fn from_request(request: &OrderRequest) -> Self {
        Self::from_request_with_time(request, Utc::now())
    }

    /// Echo the request this order was created from
    pub fn request(&self) -> OrderRequest {
        OrderRequest {
            symbol: self.symbol.clone(),
            market: self.market,
            side: self.side,
            order_type: self.order_type,
            quantity: self.quantity,
            price: self.price,
            stop_price: self.stop_price,
        }
    }

    /// Returns remaining quantity to be filled
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    /// Returns true if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Fill the remaining quantity at `price`
    pub fn mark_filled(&mut self, price: Decimal, at: DateTime<Utc>) {
        self.filled_quantity = self.quantity;
        self.average_fill_price = price;
        self.status = OrderStatus::Filled;
        self.updated_at = at;
        self.filled_at = Some(at);
    }

    pub fn mark_cancelled(&mut self, at: DateTime<Utc>) {
        self.status = OrderStatus::Cancelled;
        self.updated_at = at;
    }

    pub fn mark_rejected(&mut self, at: DateTime<Utc>) {
        self.status = OrderStatus::Rejected;
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_echoes_request() {
        let request = OrderRequest::limit("MSFT", Side::Buy, dec!(3), dec!(410));
        let order = Order::from_request(&request);

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.filled_quantity, Decimal::ZERO);
        assert_eq!(order.remaining_quantity(), dec!(3));
        assert_eq!(order.request(), request);
    }

    #[test]
    fn test_mark_filled() {
        let request = OrderRequest::market("MSFT", Side::Sell, dec!(2));
        let mut order = Order::from_request(&request);
        let now = Utc::now();

        order.mark_filled(dec!(400), now);

        assert!(order.is_filled());
        assert_eq!(order.filled_quantity, dec!(2));
        assert_eq!(order.average_fill_price, dec!(400));
        assert_eq!(order.filled_at, Some(now));
        assert!(order.status.is_terminal());
    }
}
