mod broker;

pub use broker::SimulatedBroker;
