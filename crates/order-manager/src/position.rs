//! Position Tracking
//!
//! In-process cache of positions keyed by symbol. The cache is either
//! replaced wholesale from the broker (`sync`) or updated incrementally from
//! fills the engine learns about (`update_on_fill`, `on_order_update`).
//!
//! Reads are synchronous so reporting code and broker callbacks can use the
//! tracker without an async context.
//!
//! A fill committed before a sync is already part of the synced snapshot.
//! Its notification may still be in flight, so fills stamped before the sync
//! started, or before the snapshot's last update of the symbol, are recorded
//! as applied without touching the position.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use meridian_core::{Order, OrderId, Position};
use meridian_ports::{Broker, BrokerResult, OrderEvent, OrderUpdate, OrderUpdateHandler};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Fully filled orders remembered to recognise duplicate updates
const RECENT_COMPLETED: usize = 1024;

/// Fill quantity and notional already applied for an order
#[derive(Debug, Clone, Copy, Default)]
struct AppliedFill {
    quantity: Decimal,
    notional: Decimal,
}

#[derive(Debug, Default)]
struct TrackerState {
    positions: HashMap<String, Position>,
    /// Realized P&L from positions that have since been closed
    closed_realized_pl: Decimal,
    /// Partially filled orders only
    applied: HashMap<OrderId, AppliedFill>,
    completed: HashSet<OrderId>,
    completed_order: VecDeque<OrderId>,
    /// When the last sync started
    synced_at: Option<DateTime<Utc>>,
    /// Last update time of each symbol in the synced snapshot
    snapshot_marks: HashMap<String, DateTime<Utc>>,
}

impl TrackerState {
    fn in_snapshot(&self, order: &Order) -> bool {
        let at = order.updated_at;
        self.synced_at.is_some_and(|synced| at < synced)
            || self
                .snapshot_marks
                .get(&order.symbol)
                .is_some_and(|marked| at <= *marked)
    }

    /// Record how much of `order` the cache reflects
    fn record(&mut self, order: &Order, applied: AppliedFill) {
        if order.filled_quantity < order.quantity {
            self.applied.insert(order.id, applied);
            return;
        }

        self.applied.remove(&order.id);
        if self.completed.insert(order.id) {
            self.completed_order.push_back(order.id);
        }
        while self.completed_order.len() > RECENT_COMPLETED {
            if let Some(oldest) = self.completed_order.pop_front() {
                self.completed.remove(&oldest);
            }
        }
    }
}

/// Tracks positions and P&L for the engine
pub struct PositionTracker {
    broker: Arc<dyn Broker>,
    state: RwLock<TrackerState>,
}

impl PositionTracker {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self {
            broker,
            state: RwLock::new(TrackerState::default()),
        }
    }

    /// Replace the cache with the broker's positions
    pub async fn sync(&self) -> BrokerResult<()> {
        let started = Utc::now();
        let positions = self.broker.get_positions().await?;
        let count = positions.len();

        let mut state = self.state.write();
        state.synced_at = Some(started);
        state.snapshot_marks = positions
            .iter()
            .map(|p| (p.symbol.clone(), p.updated_at))
            .collect();
        state.positions = positions
            .into_iter()
            .filter(|p| !p.is_flat())
            .map(|p| (p.symbol.clone(), p))
            .collect();
        drop(state);

        info!("[POSITIONS] Synced {} position(s) from {}", count, self.broker.name());
        Ok(())
    }

    /// Apply an order's fills to the cache, returning the P&L realized
    ///
    /// Only the quantity filled since the last update for this order is
    /// applied, so repeated or cumulative updates for one order are safe.
    pub fn update_on_fill(&self, order: &Order) -> Decimal {
        let mut state = self.state.write();

        if state.completed.contains(&order.id) {
            debug!("[POSITIONS] Order {} already fully applied", order.id);
            return Decimal::ZERO;
        }

        let previous = state.applied.get(&order.id).copied().unwrap_or_default();
        let fill_quantity = order.filled_quantity - previous.quantity;
        if fill_quantity <= Decimal::ZERO {
            debug!("[POSITIONS] No new fill quantity for order {}", order.id);
            return Decimal::ZERO;
        }

        let Some((notional, fill_price)) = order
            .filled_quantity
            .checked_mul(order.average_fill_price)
            .and_then(|notional| {
                let price = notional
                    .checked_sub(previous.notional)?
                    .checked_div(fill_quantity)?;
                Some((notional, price))
            })
        else {
            warn!(
                "[POSITIONS] Fill for order {} out of range ({} @ {}), ignored",
                order.id, order.filled_quantity, order.average_fill_price
            );
            return Decimal::ZERO;
        };
        let applied = AppliedFill {
            quantity: order.filled_quantity,
            notional,
        };
        if state.in_snapshot(order) {
            debug!("[POSITIONS] Order {} already in synced snapshot", order.id);
            state.record(order, applied);
            return Decimal::ZERO;
        }

        state.record(order, applied);

        let position = state
            .positions
            .entry(order.symbol.clone())
            .or_insert_with(|| Position::flat(order.symbol.clone()));
        let realized = position.apply_fill(order.side, fill_quantity, fill_price);

        debug!(
            "[POSITIONS] {} {} {} @ {} -> qty={}, avg={}, realized={}",
            order.symbol,
            order.side,
            fill_quantity,
            fill_price,
            position.quantity,
            position.average_cost,
            realized
        );

        if position.is_flat() {
            let closed_pl = position.realized_pl;
            state.positions.remove(&order.symbol);
            state.closed_realized_pl += closed_pl;
            info!("[POSITIONS] Closed {} (realized {})", order.symbol, closed_pl);
        }

        realized
    }

    /// Apply a broker order update (fills only)
    pub fn on_order_update(&self, update: &OrderUpdate) {
        match update.event {
            OrderEvent::Filled | OrderEvent::PartiallyFilled => {
                self.update_on_fill(&update.order);
            }
            OrderEvent::Cancelled | OrderEvent::Rejected => {}
        }
    }

    /// Broker subscription handler feeding this tracker
    ///
    /// Holds a weak reference so the broker does not keep the tracker alive.
    pub fn handler(self: &Arc<Self>) -> OrderUpdateHandler {
        let tracker = Arc::downgrade(self);
        Arc::new(move |update: OrderUpdate| {
            if let Some(tracker) = tracker.upgrade() {
                tracker.on_order_update(&update);
            }
        })
    }

    /// Mark positions to new prices
    pub fn update_prices(&self, prices: &HashMap<String, Decimal>) {
        let mut state = self.state.write();
        for (symbol, price) in prices {
            if let Some(position) = state.positions.get_mut(symbol) {
                position.mark(*price);
            }
        }
    }

    /// Position for a symbol; a flat snapshot when none is held
    pub fn get_position(&self, symbol: &str) -> Position {
        self.state
            .read()
            .positions
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Position::flat(symbol))
    }

    /// All held positions, ordered by symbol
    pub fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.state.read().positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }

    pub fn total_unrealized_pl(&self) -> Decimal {
        self.state
            .read()
            .positions
            .values()
            .map(|p| p.unrealized_pl)
            .sum()
    }

    /// Realized P&L across open and closed positions
    pub fn total_realized_pl(&self) -> Decimal {
        let state = self.state.read();
        state.closed_realized_pl + state.positions.values().map(|p| p.realized_pl).sum::<Decimal>()
    }
}
