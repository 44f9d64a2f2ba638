//! Meridian Ports
//!
//! Port definitions (traits) for the Meridian order execution engine.
//! These define the boundary between the engine and brokerage
//! infrastructure: the engine only ever talks to a [`Broker`].

mod broker;
mod error;
mod update;

pub use broker::Broker;
pub use error::{BrokerError, BrokerResult};
pub use update::{OrderEvent, OrderUpdate, OrderUpdateHandler};
