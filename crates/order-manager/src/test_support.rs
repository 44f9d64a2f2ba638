//! Broker double for unit tests

use async_trait::async_trait;
use meridian_core::{Balance, Order, OrderId, OrderRequest, Position};
use meridian_ports::{Broker, BrokerError, BrokerResult, OrderUpdateHandler};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Broker with scripted account state that records placements
pub(crate) struct ScriptedBroker {
    pub balance: Mutex<Balance>,
    pub positions: Mutex<Vec<Position>>,
    pub placed: Mutex<Vec<OrderRequest>>,
    pub place_calls: AtomicUsize,
    pub fail_orders: AtomicBool,
    pub place_delay: Duration,
    pub subscriber: Mutex<Option<OrderUpdateHandler>>,
}

impl ScriptedBroker {
    pub fn with_total_value(total_value: Decimal) -> Self {
        Self {
            balance: Mutex::new(Balance::with_cash("USD", total_value)),
            positions: Mutex::new(Vec::new()),
            placed: Mutex::new(Vec::new()),
            place_calls: AtomicUsize::new(0),
            fail_orders: AtomicBool::new(false),
            place_delay: Duration::ZERO,
            subscriber: Mutex::new(None),
        }
    }

    pub fn with_place_delay(mut self, delay: Duration) -> Self {
        self.place_delay = delay;
        self
    }

    pub fn place_calls(&self) -> usize {
        self.place_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Broker for ScriptedBroker {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn connect(&self) -> BrokerResult<()> {
        Ok(())
    }

    async fn disconnect(&self) -> BrokerResult<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn place_order(&self, request: &OrderRequest) -> BrokerResult<Order> {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        if !self.place_delay.is_zero() {
            tokio::time::sleep(self.place_delay).await;
        }
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(BrokerError::Simulated("order rejected".to_string()));
        }
        request.validate()?;
        self.placed.lock().push(request.clone());
        Ok(Order::from_request(request))
    }

    async fn cancel_order(&self, order_id: OrderId) -> BrokerResult<()> {
        Err(BrokerError::OrderNotFound(order_id))
    }

    async fn get_order(&self, order_id: OrderId) -> BrokerResult<Order> {
        Err(BrokerError::OrderNotFound(order_id))
    }

    async fn get_open_orders(&self) -> BrokerResult<Vec<Order>> {
        Ok(Vec::new())
    }

    async fn get_positions(&self) -> BrokerResult<Vec<Position>> {
        Ok(self.positions.lock().clone())
    }

    async fn get_position(&self, symbol: &str) -> BrokerResult<Position> {
        self.positions
            .lock()
            .iter()
            .find(|p| p.symbol == symbol)
            .cloned()
            .ok_or_else(|| BrokerError::PositionNotFound(symbol.to_string()))
    }

    async fn get_balance(&self) -> BrokerResult<Balance> {
        Ok(self.balance.lock().clone())
    }

    fn subscribe(&self, handler: OrderUpdateHandler) {
        *self.subscriber.lock() = Some(handler);
    }

    fn unsubscribe(&self) {
        *self.subscriber.lock() = None;
    }
}
