//! Meridian Order Manager
//!
//! The Order Manager sits between signal producers and the broker, responsible for:
//! - **Execution**: Sizes signals into orders and dispatches them by mode
//! - **Pending Orders**: Holds confirm/batch orders until confirmed or rejected
//! - **Risk Gate**: Every order passes the pre-trade [`RiskChecker`](meridian_risk_manager::RiskChecker)
//! - **Position Tracking**: Applies fills and derives P&L
//!
//! ## Architecture
//!
//! ```text
//! Signal + price ──► ┌────────────────────────────────────────┐
//!                    │          Execution Manager             │
//!                    │  ┌─────────────────────────────────┐   │
//!                    │  │   Sizing                        │   │
//!                    │  │   - size% × total value / price │   │
//!                    │  └───────────────┬─────────────────┘   │
//!                    │  ┌───────────────▼─────────────────┐   │
//!                    │  │   Risk Checker                  │   │
//!                    │  │   - Daily loss                  │   │
//!                    │  │   - Open positions              │   │
//!                    │  │   - Position size               │   │
//!                    │  └───────────────┬─────────────────┘   │
//!                    │        auto      │    confirm / batch  │
//!                    │          ┌───────┴────────┐            │
//!                    │          │                ▼            │
//!                    │          │     Pending Orders ◄── confirm / reject
//!                    │          │                │            │
//!                    └──────────┼────────────────┼────────────┘
//!                               ▼                ▼
//!                           Broker.place_order
//!
//! Broker ──► Order updates ──► Position Tracker ──► P&L
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meridian_order_manager::{ExecutionConfig, ExecutionManager, PositionTracker};
//!
//! let manager = ExecutionManager::new(broker, risk, positions, ExecutionConfig::default())?;
//!
//! let result = manager.execute(&signal, dec!(150), &cancel).await?;
//! if let Some(id) = result.pending_id {
//!     let order = manager.confirm(id, &cancel).await?;
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod execution;
pub mod position;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use batch::BatchScheduler;
pub use config::{ExecutionConfig, ExecutionMode};
pub use error::{Error, Result};
pub use execution::{BatchReport, ExecutionManager, ExecutionResult, PendingOrder, PendingState};
pub use position::PositionTracker;
