use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use meridian_core::{Balance, Order, OrderId, OrderRequest, Position, Side};
use meridian_ports::{Broker, BrokerError, BrokerResult, OrderEvent, OrderUpdate, OrderUpdateHandler};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{FailureMode, SimulatorConfig};
use crate::state::BrokerState;

type Subscriber = Arc<parking_lot::RwLock<Option<OrderUpdateHandler>>>;

/// Shutdown signal, fill tasks and update queue for one connected session
struct Session {
    shutdown: CancellationToken,
    tasks: TaskTracker,
    /// Queue drained by the session's dispatcher; `None` while disconnected
    updates: Option<UnboundedSender<OrderUpdate>>,
}

impl Session {
    fn idle() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
            updates: None,
        }
    }

    /// Fresh session whose dispatcher delivers updates to `subscriber`
    fn start(subscriber: Subscriber) -> Self {
        let mut session = Self::idle();
        let (tx, rx) = unbounded_channel();
        session.tasks.spawn(dispatch_updates(rx, subscriber));
        session.updates = Some(tx);
        session
    }
}

/// In-process broker with delayed, asynchronous fills
///
/// Orders are accepted immediately as `Pending`, then a background task per
/// order fills them after the configured delay. The fill updates the order,
/// the position and the balance under one write lock before the subscriber
/// is notified, so a `get_order` issued after the notification (or racing
/// it) never sees a stale status.
///
/// Updates are queued while the state lock is still held and delivered by a
/// single dispatcher task, so the subscriber sees them in commit order and a
/// slow subscriber never blocks order processing.
///
/// `disconnect` cancels the session and waits for every fill task to exit;
/// no fill is applied once the shutdown signal has fired.
pub struct SimulatedBroker {
    config: SimulatorConfig,
    state: Arc<RwLock<BrokerState>>,
    connected: AtomicBool,
    session: Mutex<Session>,
    subscriber: Subscriber,
    failure_mode: parking_lot::RwLock<FailureMode>,
}

impl SimulatedBroker {
    pub fn new(config: SimulatorConfig) -> Self {
        info!(
            "[BROKER] Simulated broker '{}' created: cash={} {}, fill_delay={}ms",
            config.name, config.initial_cash, config.currency, config.fill_delay_ms
        );
        Self {
            state: Arc::new(RwLock::new(BrokerState::new(&config))),
            config,
            connected: AtomicBool::new(false),
            session: Mutex::new(Session::idle()),
            subscriber: Arc::new(parking_lot::RwLock::new(None)),
            failure_mode: parking_lot::RwLock::new(FailureMode::None),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Inject failures into subsequent calls
    pub fn set_failure_mode(&self, mode: FailureMode) {
        info!("[BROKER] Failure mode set to {:?}", mode);
        *self.failure_mode.write() = mode;
    }

    /// Set the reference price for a symbol and re-mark its position
    pub async fn set_market_price(&self, symbol: &str, price: Decimal) {
        self.state.write().await.set_market_price(symbol, price);
        debug!("[BROKER] {} reference price -> {}", symbol, price);
    }

    /// Replace the account balance
    pub async fn set_balance(&self, balance: Balance) {
        info!(
            "[BROKER] Balance seeded: cash={}, total={}, daily_pl={}",
            balance.cash, balance.total_value, balance.daily_pl
        );
        self.state.write().await.seed_balance(balance);
    }

    /// Start a new trading day for daily P&L
    pub async fn reset_daily(&self) {
        self.state.write().await.reset_daily();
        info!("[BROKER] Daily P&L reset");
    }

    fn ensure_connected(&self) -> BrokerResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }

    fn ensure_orders_enabled(&self, operation: &str) -> BrokerResult<()> {
        let mode = *self.failure_mode.read();
        if mode.fails_orders() {
            return Err(BrokerError::Simulated(format!("{} failed", operation)));
        }
        Ok(())
    }

    fn ensure_queries_enabled(&self, operation: &str) -> BrokerResult<()> {
        let mode = *self.failure_mode.read();
        if mode.fails_queries() {
            return Err(BrokerError::Simulated(format!("{} failed", operation)));
        }
        Ok(())
    }

    fn update_queue(&self) -> Option<UnboundedSender<OrderUpdate>> {
        self.session.lock().updates.clone()
    }

    /// Spawn the background fill for an accepted order
    fn schedule_fill(&self, order_id: OrderId) {
        let (shutdown, tasks, updates) = {
            let session = self.session.lock();
            (
                session.shutdown.clone(),
                session.tasks.clone(),
                session.updates.clone(),
            )
        };
        let state = self.state.clone();
        let delay = self.config.fill_delay();

        tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("[BROKER] Fill for {} abandoned on disconnect", order_id);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let order = {
                let mut state = state.write().await;
                if shutdown.is_cancelled() {
                    debug!("[BROKER] Fill for {} abandoned on disconnect", order_id);
                    return;
                }
                let Some(order) = state.fill_order(order_id, Utc::now()) else {
                    debug!("[BROKER] Order {} no longer open, skipping fill", order_id);
                    return;
                };
                let event = if order.is_filled() {
                    OrderEvent::Filled
                } else {
                    OrderEvent::Rejected
                };
                enqueue(updates.as_ref(), OrderUpdate::new(order.clone(), event));
                order
            };

            if order.is_filled() {
                info!(
                    "[BROKER] Filled {} {} {} @ {}",
                    order.side, order.quantity, order.symbol, order.average_fill_price
                );
            } else {
                warn!(
                    "[BROKER] Rejected {} {} {}: cash movement out of range",
                    order.side, order.quantity, order.symbol
                );
            }
        });
    }
}

impl Default for SimulatedBroker {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

/// Queue an update for the dispatcher; call with the state lock held
fn enqueue(updates: Option<&UnboundedSender<OrderUpdate>>, update: OrderUpdate) {
    if let Some(updates) = updates {
        if updates.send(update).is_err() {
            debug!("[BROKER] Dispatcher gone, update dropped");
        }
    }
}

/// Deliver queued updates to the current subscriber, one at a time
async fn dispatch_updates(mut rx: UnboundedReceiver<OrderUpdate>, subscriber: Subscriber) {
    while let Some(update) = rx.recv().await {
        let handler = subscriber.read().clone();
        if let Some(handler) = handler {
            handler(update);
        }
    }
    debug!("[BROKER] Update dispatcher stopped");
}

#[async_trait]
impl Broker for SimulatedBroker {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn connect(&self) -> BrokerResult<()> {
        {
            let mut session = self.session.lock();
            if self.connected.load(Ordering::SeqCst) {
                return Ok(());
            }
            *session = Session::start(self.subscriber.clone());
            self.connected.store(true, Ordering::SeqCst);
        }
        info!("[BROKER] {} connected", self.config.name);
        Ok(())
    }

    async fn disconnect(&self) -> BrokerResult<()> {
        let (shutdown, tasks) = {
            let mut session = self.session.lock();
            if !self.connected.swap(false, Ordering::SeqCst) {
                return Ok(());
            }
            // The dispatcher exits once every sender is gone
            session.updates = None;
            (session.shutdown.clone(), session.tasks.clone())
        };

        shutdown.cancel();
        tasks.close();
        debug!("[BROKER] Waiting for {} session task(s) to stop", tasks.len());
        tasks.wait().await;

        info!("[BROKER] {} disconnected", self.config.name);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn place_order(&self, request: &OrderRequest) -> BrokerResult<Order> {
        self.ensure_connected()?;
        self.ensure_orders_enabled("place_order")?;
        request.validate()?;

        let order = {
            let mut state = self.state.write().await;
            let required = request.notional(state.fill_price(request))?;
            if request.side == Side::Buy {
                let available = state.balance.cash;
                if required > available {
                    return Err(BrokerError::InsufficientFunds {
                        required,
                        available,
                    });
                }
            }
            let order = Order::from_request(request);
            state.orders.insert(order.id, order.clone());
            order
        };

        info!(
            "[BROKER] Accepted {} {:?} {} {} (id={})",
            order.side, order.order_type, order.quantity, order.symbol, order.id
        );
        self.schedule_fill(order.id);

        Ok(order)
    }

    async fn cancel_order(&self, order_id: OrderId) -> BrokerResult<()> {
        self.ensure_connected()?;
        self.ensure_orders_enabled("cancel_order")?;

        let updates = self.update_queue();
        {
            let mut state = self.state.write().await;
            let order = state.cancel_order(order_id, Utc::now())?;
            enqueue(updates.as_ref(), OrderUpdate::new(order, OrderEvent::Cancelled));
        }

        info!("[BROKER] Cancelled order {}", order_id);
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> BrokerResult<Order> {
        self.ensure_connected()?;
        self.ensure_queries_enabled("get_order")?;

        self.state
            .read()
            .await
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(BrokerError::OrderNotFound(order_id))
    }

    async fn get_open_orders(&self) -> BrokerResult<Vec<Order>> {
        self.ensure_connected()?;
        self.ensure_queries_enabled("get_open_orders")?;

        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.status.is_open())
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn get_positions(&self) -> BrokerResult<Vec<Position>> {
        self.ensure_connected()?;
        self.ensure_queries_enabled("get_positions")?;

        let state = self.state.read().await;
        let mut positions: Vec<Position> = state.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn get_position(&self, symbol: &str) -> BrokerResult<Position> {
        self.ensure_connected()?;
        self.ensure_queries_enabled("get_position")?;

        self.state
            .read()
            .await
            .positions
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::PositionNotFound(symbol.to_string()))
    }

    async fn get_balance(&self) -> BrokerResult<Balance> {
        self.ensure_connected()?;
        self.ensure_queries_enabled("get_balance")?;

        Ok(self.state.read().await.balance.clone())
    }

    fn subscribe(&self, handler: OrderUpdateHandler) {
        *self.subscriber.write() = Some(handler);
        debug!("[BROKER] Subscriber registered");
    }

    fn unsubscribe(&self) {
        *self.subscriber.write() = None;
        debug!("[BROKER] Subscriber removed");
    }
}
