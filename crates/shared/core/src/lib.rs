//! Meridian Core Domain
//!
//! Pure domain types for the Meridian order execution engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;

// Re-export commonly used types at crate root
pub use entities::{
    // Account state
    Balance,
    // Order entry
    Market,
    // Order lifecycle
    Order,
    OrderId,
    OrderRequest,
    OrderStatus,
    OrderType,
    OrderValidationError,
    // Holdings
    Position,
    Side,
    // Strategy input
    Signal,
    SignalAction,
};
