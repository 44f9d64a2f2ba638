use meridian_core::{OrderId, OrderStatus, OrderValidationError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by a broker
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Broker is not connected")]
    NotConnected,

    #[error(transparent)]
    InvalidOrder(#[from] OrderValidationError),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Order {order_id} cannot be cancelled in status {status:?}")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Insufficient funds: required={required}, available={available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Simulated broker failure: {0}")]
    Simulated(String),
}

pub type BrokerResult<T> = std::result::Result<T, BrokerError>;
