//! Simulated broker for the Meridian execution engine
//!
//! Implements [`meridian_ports::Broker`] in-process: orders are accepted as
//! pending and filled by background tasks after a configurable delay, with
//! positions and balance updated atomically on each fill.

// Application layer
pub mod application;

// Account state shared by the fill tasks
mod state;

pub mod config;

// Re-export main types for convenience
pub use application::SimulatedBroker;
pub use config::{FailureMode, SimulatorConfig};
