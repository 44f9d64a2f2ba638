use async_trait::async_trait;
use meridian_core::{Balance, Order, OrderId, OrderRequest, Position};

use crate::error::BrokerResult;
use crate::update::OrderUpdateHandler;

/// Port for brokerage connectivity
///
/// Implementations own the authoritative order, position and balance state.
/// Orders are mutated only by the broker (or its background fill work) until
/// they reach a terminal status.
///
/// Different implementations back this port:
/// - Simulated broker (asynchronous fills after a delay)
/// - Real brokerage adapters translating to a wire protocol
#[async_trait]
pub trait Broker: Send + Sync {
    /// Name of the broker, for logging
    fn name(&self) -> &str;

    /// Open the session. Connecting an already connected broker is a no-op.
    async fn connect(&self) -> BrokerResult<()>;

    /// Close the session, waiting for any background work to stop
    async fn disconnect(&self) -> BrokerResult<()>;

    fn is_connected(&self) -> bool;

    /// Submit an order
    ///
    /// The request is validated before any state is touched; invalid requests
    /// fail with [`BrokerError::InvalidOrder`](crate::BrokerError::InvalidOrder).
    async fn place_order(&self, request: &OrderRequest) -> BrokerResult<Order>;

    /// Cancel an open (pending or partially filled) order
    async fn cancel_order(&self, order_id: OrderId) -> BrokerResult<()>;

    async fn get_order(&self, order_id: OrderId) -> BrokerResult<Order>;

    /// Orders that can still fill
    async fn get_open_orders(&self) -> BrokerResult<Vec<Order>>;

    /// All non-flat positions
    async fn get_positions(&self) -> BrokerResult<Vec<Position>>;

    /// Position for a symbol; fails with `PositionNotFound` when flat
    async fn get_position(&self, symbol: &str) -> BrokerResult<Position>;

    async fn get_balance(&self) -> BrokerResult<Balance>;

    /// Register the order update handler, replacing any previous one
    fn subscribe(&self, handler: OrderUpdateHandler);

    /// Drop the registered handler
    fn unsubscribe(&self);
}
