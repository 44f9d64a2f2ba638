//! Account state held by the simulated broker
//!
//! Orders, positions and balance live together so a fill can update all three
//! under one exclusive lock.

use chrono::{DateTime, Utc};
use meridian_core::{Balance, Order, OrderId, OrderRequest, OrderType, Position, Side};
use meridian_ports::{BrokerError, BrokerResult};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::SimulatorConfig;

#[derive(Debug)]
pub(crate) struct BrokerState {
    pub(crate) orders: HashMap<OrderId, Order>,
    pub(crate) positions: HashMap<String, Position>,
    pub(crate) balance: Balance,
    /// Total value at the start of the trading day (for daily P&L)
    day_start_value: Decimal,
    market_prices: HashMap<String, Decimal>,
    default_market_price: Decimal,
}

impl BrokerState {
    pub(crate) fn new(config: &SimulatorConfig) -> Self {
        Self {
            orders: HashMap::new(),
            positions: HashMap::new(),
            balance: Balance::with_cash(config.currency.clone(), config.initial_cash),
            day_start_value: config.initial_cash,
            market_prices: config.market_prices.clone(),
            default_market_price: config.default_market_price,
        }
    }

    /// Reference price for market orders on a symbol
    pub(crate) fn market_price(&self, symbol: &str) -> Decimal {
        self.market_prices
            .get(symbol)
            .copied()
            .unwrap_or(self.default_market_price)
    }

    /// Price the request will fill at
    pub(crate) fn fill_price(&self, request: &OrderRequest) -> Decimal {
        match request.order_type {
            OrderType::Limit => request.price.unwrap_or_else(|| self.market_price(&request.symbol)),
            OrderType::Stop => request
                .stop_price
                .unwrap_or_else(|| self.market_price(&request.symbol)),
            OrderType::Market => self.market_price(&request.symbol),
        }
    }

    /// Fill an open order in full, updating position and balance
    ///
    /// Returns `None` when the order is unknown or no longer open (e.g. it was
    /// cancelled while the fill was scheduled). An order whose cash movement
    /// does not fit at the fill price is rejected instead of filled.
    pub(crate) fn fill_order(&mut self, order_id: OrderId, at: DateTime<Utc>) -> Option<Order> {
        let request = match self.orders.get(&order_id) {
            Some(order) if order.status.is_open() => order.request(),
            _ => return None,
        };
        let price = self.fill_price(&request);
        let quantity = request.quantity;

        let cash = request.notional(price).ok().and_then(|notional| match request.side {
            Side::Buy => self.balance.cash.checked_sub(notional),
            Side::Sell => self.balance.cash.checked_add(notional),
        });

        let order = self.orders.get_mut(&order_id)?;
        let Some(cash) = cash else {
            order.mark_rejected(at);
            return Some(order.clone());
        };
        order.mark_filled(price, at);
        let filled = order.clone();

        let position = self
            .positions
            .entry(request.symbol.clone())
            .or_insert_with(|| Position::flat(request.symbol.clone()));
        position.apply_fill(request.side, quantity, price);
        if position.is_flat() {
            self.positions.remove(&request.symbol);
        }

        self.balance.cash = cash;
        self.refresh_balance();

        Some(filled)
    }

    /// Cancel an open order
    pub(crate) fn cancel_order(&mut self, order_id: OrderId, at: DateTime<Utc>) -> BrokerResult<Order> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(BrokerError::OrderNotFound(order_id))?;
        if !order.status.is_open() {
            return Err(BrokerError::NotCancellable {
                order_id,
                status: order.status,
            });
        }
        order.mark_cancelled(at);
        Ok(order.clone())
    }

    /// Update the reference price and re-mark any position in the symbol
    pub(crate) fn set_market_price(&mut self, symbol: &str, price: Decimal) {
        self.market_prices.insert(symbol.to_string(), price);
        if let Some(position) = self.positions.get_mut(symbol) {
            position.mark(price);
        }
        self.refresh_balance();
    }

    /// Replace the account balance, keeping its daily P&L
    pub(crate) fn seed_balance(&mut self, balance: Balance) {
        self.day_start_value = balance.total_value - balance.daily_pl;
        self.balance = balance;
    }

    /// Start a new trading day at the current total value
    pub(crate) fn reset_daily(&mut self) {
        self.day_start_value = self.balance.total_value;
        self.balance.daily_pl = Decimal::ZERO;
    }

    /// Recompute derived balance fields from cash and positions
    fn refresh_balance(&mut self) {
        let positions_value: Decimal = self.positions.values().map(|p| p.market_value).sum();
        self.balance.total_value = self.balance.cash + positions_value;
        self.balance.buying_power = self.balance.cash;
        self.balance.margin_used = Decimal::ZERO;
        self.balance.margin_available = self.balance.cash;
        self.balance.daily_pl = self.balance.total_value - self.day_start_value;
    }
}
