//! Bootstrap - Engine wiring and lifecycle
//!
//! Builds the engine from an [`EngineConfig`]:
//! - Connects the simulated broker
//! - Wires risk checker, position tracker and execution manager
//! - Syncs positions and subscribes fill tracking
//! - Starts the batch scheduler in batch mode

use crate::config::{ConfigError, EngineConfig};
use log::{info, warn};
use meridian_broker_sim::SimulatedBroker;
use meridian_order_manager::{
    BatchScheduler, ExecutionManager, ExecutionMode, PositionTracker,
};
use meridian_ports::{Broker, BrokerError};
use meridian_risk_manager::RiskChecker;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Execution(#[from] meridian_order_manager::Error),
}

/// Background batch confirmation task
struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// A running execution engine
pub struct Engine {
    config: EngineConfig,
    broker: Arc<SimulatedBroker>,
    manager: Arc<ExecutionManager>,
    scheduler: Option<SchedulerHandle>,
}

impl Engine {
    /// Build, connect and start an engine
    pub async fn start(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let broker = Arc::new(SimulatedBroker::new(config.broker.clone()));
        broker.connect().await?;
        let port: Arc<dyn Broker> = broker.clone();

        let risk = Arc::new(RiskChecker::new(port.clone(), config.risk.clone()));
        let positions = Arc::new(PositionTracker::new(port.clone()));
        let manager = Arc::new(ExecutionManager::new(
            port,
            risk,
            positions,
            config.execution.clone(),
        )?);

        manager.sync_positions().await?;
        manager.track_fills();

        let scheduler = if config.execution.mode == ExecutionMode::Batch {
            let cancel = CancellationToken::new();
            let task = BatchScheduler::new(manager.clone())?.spawn(cancel.clone());
            Some(SchedulerHandle { cancel, task })
        } else {
            None
        };

        info!(
            "[ENGINE] Started: broker={}, mode={}",
            broker.name(),
            config.execution.mode
        );

        Ok(Self {
            config,
            broker,
            manager,
            scheduler,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn broker(&self) -> &Arc<SimulatedBroker> {
        &self.broker
    }

    pub fn manager(&self) -> &Arc<ExecutionManager> {
        &self.manager
    }

    pub fn positions(&self) -> &Arc<PositionTracker> {
        self.manager.positions()
    }

    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Stop the scheduler and disconnect the broker
    ///
    /// Returns once every background fill task has stopped.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        if let Some(scheduler) = self.scheduler {
            scheduler.cancel.cancel();
            if let Err(e) = scheduler.task.await {
                warn!("[ENGINE] Batch scheduler ended abnormally: {}", e);
            }
        }

        self.broker.unsubscribe();
        self.broker.disconnect().await?;

        info!("[ENGINE] Shut down");
        Ok(())
    }
}
