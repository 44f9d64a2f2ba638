//! Execution Manager
//!
//! Turns signals into broker orders:
//! - Sizes the order from account value and the configured percentage
//! - Runs the pre-trade risk check
//! - Places immediately (auto) or parks a pending order (confirm/batch)
//!
//! ## Pending orders
//!
//! A pending order is claimed by flipping its state to `Processing` under
//! the exclusive map lock before the broker is called. Concurrent confirms
//! of the same id therefore see `Processing` and fail fast with
//! [`Error::AlreadyProcessing`]; exactly one reaches the broker. When the
//! broker call fails the order goes back to `Queued` so it can be retried.

use crate::config::{ExecutionConfig, ExecutionMode};
use crate::error::{Error, Result};
use crate::position::PositionTracker;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use meridian_core::{Order, OrderRequest, Signal};
use meridian_ports::Broker;
use meridian_risk_manager::RiskChecker;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lifecycle of a pending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingState {
    /// Waiting for confirmation
    Queued,
    /// A confirm is submitting it to the broker
    Processing,
}

/// An order awaiting confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: Uuid,
    pub request: OrderRequest,
    /// Price the order was sized and risk-checked at
    pub reference_price: Decimal,
    pub state: PendingState,
    pub created_at: DateTime<Utc>,
}

/// Outcome of executing a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Set when the order was placed
    pub order: Option<Order>,
    /// Set when the order was queued instead of placed
    pub pending_id: Option<Uuid>,
    pub message: String,
}

impl ExecutionResult {
    pub fn placed(order: Order) -> Self {
        let message = format!("order {} placed", order.id);
        Self {
            success: true,
            order: Some(order),
            pending_id: None,
            message,
        }
    }

    pub fn queued(pending_id: Uuid, mode: ExecutionMode) -> Self {
        Self {
            success: true,
            order: None,
            pending_id: Some(pending_id),
            message: format!("order queued for {} ({})", mode, pending_id),
        }
    }

    /// Nothing was placed or queued; not an error
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: false,
            order: None,
            pending_id: None,
            message: message.into(),
        }
    }
}

/// Outcome of confirming every queued order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub placed: Vec<Order>,
    /// Orders left queued after a failed confirm
    pub failed: Vec<(Uuid, Error)>,
}

/// Orchestrates sizing, risk and submission of signals
pub struct ExecutionManager {
    broker: Arc<dyn Broker>,
    risk: Arc<RiskChecker>,
    positions: Arc<PositionTracker>,
    config: ExecutionConfig,
    pending: RwLock<HashMap<Uuid, PendingOrder>>,
}

impl ExecutionManager {
    pub fn new(
        broker: Arc<dyn Broker>,
        risk: Arc<RiskChecker>,
        positions: Arc<PositionTracker>,
        config: ExecutionConfig,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "[EXEC] Execution manager ready: mode={}, size={}%",
            config.mode, config.default_size_pct
        );
        Ok(Self {
            broker,
            risk,
            positions,
            config,
            pending: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn positions(&self) -> &Arc<PositionTracker> {
        &self.positions
    }

    /// Execute a signal at `reference_price`
    ///
    /// Risk rejections and `Hold` signals are reported through the result
    /// (`success == false`), not as errors. `cancel` is checked between
    /// steps; a broker call already in flight runs to completion.
    pub async fn execute(
        &self,
        signal: &Signal,
        reference_price: Decimal,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult> {
        validate_signal(signal)?;
        if reference_price <= Decimal::ZERO {
            return Err(Error::InvalidPrice(reference_price));
        }

        let Some(side) = signal.action.side() else {
            debug!("[EXEC] {} {:?} ignored", signal.symbol, signal.action);
            return Ok(ExecutionResult::skipped(format!(
                "{:?} signal for {} does not require execution",
                signal.action, signal.symbol
            )));
        };

        check_cancelled(cancel)?;
        let balance = self.broker.get_balance().await?;
        let quantity = self
            .order_size(balance.total_value, reference_price)
            .ok_or(Error::InvalidPrice(reference_price))?;
        if quantity <= Decimal::ZERO {
            info!(
                "[EXEC] {} {} sized to zero (total value {}, price {})",
                side, signal.symbol, balance.total_value, reference_price
            );
            return Ok(ExecutionResult::skipped(format!(
                "order size for {} rounds to zero at price {}",
                signal.symbol, reference_price
            )));
        }

        let request = OrderRequest::market(signal.symbol.clone(), side, quantity);

        check_cancelled(cancel)?;
        let risk = self.risk.check(&request, reference_price).await;
        check_cancelled(cancel)?;
        if !risk.allowed {
            return Ok(ExecutionResult::skipped(format!(
                "risk check failed: {}",
                risk.reason
            )));
        }

        if self.config.mode.queues_orders() {
            let pending = PendingOrder {
                id: Uuid::new_v4(),
                request,
                reference_price,
                state: PendingState::Queued,
                created_at: Utc::now(),
            };
            let id = pending.id;
            info!(
                "[EXEC] Queued {} {} {} for {} (pending={})",
                pending.request.side,
                pending.request.quantity,
                pending.request.symbol,
                self.config.mode,
                id
            );
            self.pending.write().await.insert(id, pending);
            return Ok(ExecutionResult::queued(id, self.config.mode));
        }

        let order = self.broker.place_order(&request).await?;
        info!(
            "[EXEC] Placed {} {} {} (order={})",
            order.side, order.quantity, order.symbol, order.id
        );
        Ok(ExecutionResult::placed(order))
    }

    /// Submit a pending order to the broker
    pub async fn confirm(&self, pending_id: Uuid, cancel: &CancellationToken) -> Result<Order> {
        check_cancelled(cancel)?;

        let request = {
            let mut pending = self.pending.write().await;
            let entry = pending
                .get_mut(&pending_id)
                .ok_or(Error::PendingNotFound(pending_id))?;
            if entry.state == PendingState::Processing {
                debug!("[EXEC] Pending {} already being processed", pending_id);
                return Err(Error::AlreadyProcessing(pending_id));
            }
            entry.state = PendingState::Processing;
            entry.request.clone()
        };

        match self.broker.place_order(&request).await {
            Ok(order) => {
                self.pending.write().await.remove(&pending_id);
                info!(
                    "[EXEC] Confirmed {}: placed {} {} {} (order={})",
                    pending_id, order.side, order.quantity, order.symbol, order.id
                );
                Ok(order)
            }
            Err(e) => {
                if let Some(entry) = self.pending.write().await.get_mut(&pending_id) {
                    entry.state = PendingState::Queued;
                }
                warn!("[EXEC] Confirm {} failed, order requeued: {}", pending_id, e);
                Err(e.into())
            }
        }
    }

    /// Drop a pending order without contacting the broker
    pub async fn reject(&self, pending_id: Uuid) -> Result<PendingOrder> {
        let mut pending = self.pending.write().await;
        let state = pending
            .get(&pending_id)
            .map(|p| p.state)
            .ok_or(Error::PendingNotFound(pending_id))?;
        if state == PendingState::Processing {
            return Err(Error::AlreadyProcessing(pending_id));
        }

        let removed = pending
            .remove(&pending_id)
            .ok_or(Error::PendingNotFound(pending_id))?;
        info!(
            "[EXEC] Rejected pending {} ({} {} {})",
            pending_id, removed.request.side, removed.request.quantity, removed.request.symbol
        );
        Ok(removed)
    }

    /// Snapshot of pending orders, oldest first
    pub async fn get_pending_orders(&self) -> Vec<PendingOrder> {
        let mut orders: Vec<PendingOrder> = self.pending.read().await.values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
    }

    /// Confirm every queued order, oldest first
    ///
    /// Orders whose confirm fails stay queued. Orders claimed or removed by
    /// a concurrent caller are skipped.
    pub async fn confirm_all(&self, cancel: &CancellationToken) -> BatchReport {
        let queued: Vec<Uuid> = self
            .get_pending_orders()
            .await
            .into_iter()
            .filter(|p| p.state == PendingState::Queued)
            .map(|p| p.id)
            .collect();

        info!("[BATCH] Confirming {} queued order(s)", queued.len());

        let mut report = BatchReport::default();
        for id in queued {
            match self.confirm(id, cancel).await {
                Ok(order) => report.placed.push(order),
                Err(Error::AlreadyProcessing(_)) | Err(Error::PendingNotFound(_)) => {
                    debug!("[BATCH] Pending {} handled elsewhere", id);
                }
                Err(Error::Cancelled) => {
                    info!("[BATCH] Cancelled, remaining orders stay queued");
                    break;
                }
                Err(e) => report.failed.push((id, e)),
            }
        }

        info!(
            "[BATCH] Done: {} placed, {} failed",
            report.placed.len(),
            report.failed.len()
        );
        report
    }

    /// Feed the broker's fill notifications into the position tracker
    pub fn track_fills(&self) {
        self.broker.subscribe(self.positions.handler());
        info!("[EXEC] Tracking fills from {}", self.broker.name());
    }

    /// Refresh tracked positions from the broker
    pub async fn sync_positions(&self) -> Result<()> {
        self.positions.sync().await?;
        Ok(())
    }

    /// floor(size% × total value / price), `None` when it does not fit
    fn order_size(&self, total_value: Decimal, reference_price: Decimal) -> Option<Decimal> {
        let budget = (self.config.default_size_pct / dec!(100)).checked_mul(total_value)?;
        Some(budget.checked_div(reference_price)?.floor())
    }
}

fn validate_signal(signal: &Signal) -> Result<()> {
    if signal.symbol.trim().is_empty() {
        return Err(Error::InvalidSignal("empty symbol".to_string()));
    }
    if signal.confidence < Decimal::ZERO || signal.confidence > Decimal::ONE {
        return Err(Error::InvalidSignal(format!(
            "confidence {} outside [0, 1]",
            signal.confidence
        )));
    }
    Ok(())
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}
