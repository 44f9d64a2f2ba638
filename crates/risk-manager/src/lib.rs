//! Meridian Pre-Trade Risk
//!
//! Gate every order must pass before it reaches the broker. The checker is
//! stateless: each check queries the broker for the current account state
//! and compares it against configured limits.
//!
//! ## Checks (in order, first failure wins)
//!
//! ```text
//!   OrderRequest + reference price
//!              │
//!              ▼
//!   Balance ──► account has value? ──► daily loss < limit?
//!              │
//!              ▼ (buys only)
//!   Positions ─► open positions < limit?
//!              │
//!              ▼
//!   Order value as % of account ≤ limit?
//!              │
//!              ▼
//!        RiskCheckResult
//! ```
//!
//! Any broker query failure rejects the order: the checker fails closed.

pub mod checker;
pub mod limits;

// Re-export main types
pub use checker::{RiskCheckResult, RiskCheckType, RiskChecker};
pub use limits::{RiskConfig, RiskConfigError};
