//! Meridian Runner - Engine bootstrap
//!
//! Loads configuration, initialises logging, and wires the execution engine:
//!
//! - **Config**: One JSON document for execution, risk and broker settings
//! - **Logging**: `env_logger` backend for the `log` facade
//! - **Bootstrap**: Connects the broker and starts the engine components
//!
//! ## Architecture
//!
//! ```text
//!               ┌───────────────────────┐
//!               │     EngineConfig      │
//!               └───────────┬───────────┘
//!                           ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                         Engine                          │
//! │                                                         │
//! │   ┌──────────────────┐        ┌──────────────────┐      │
//! │   │ Batch Scheduler  │──────► │ Execution Manager│      │
//! │   └──────────────────┘        └────────┬─────────┘      │
//! │                                        │                │
//! │               ┌────────────────┬───────┴───────┐        │
//! │               ▼                ▼               ▼        │
//! │        ┌────────────┐  ┌──────────────┐  ┌──────────┐   │
//! │        │Risk Checker│  │Position Track│  │  Broker  │   │
//! │        └────────────┘  └──────────────┘  └──────────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod bootstrap;
pub mod config;
pub mod logging;

// Re-export main types
pub use bootstrap::{Engine, EngineError};
pub use config::{ConfigError, EngineConfig};
pub use logging::init_logging;
