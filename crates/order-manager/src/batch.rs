//! Batch Scheduler
//!
//! In batch mode pending orders accumulate during the day and are confirmed
//! together at the configured `batch_time` (UTC).

use crate::error::Result;
use crate::execution::ExecutionManager;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use log::{info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs `confirm_all` once a day at the batch time
pub struct BatchScheduler {
    manager: Arc<ExecutionManager>,
    batch_time: NaiveTime,
}

/// Time left until `at`, zero once it has passed
fn wait_until(at: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    (at - now).to_std().unwrap_or(std::time::Duration::ZERO)
}

impl BatchScheduler {
    pub fn new(manager: Arc<ExecutionManager>) -> Result<Self> {
        let batch_time = manager.config().batch_time()?;
        Ok(Self {
            manager,
            batch_time,
        })
    }

    pub fn batch_time(&self) -> NaiveTime {
        self.batch_time
    }

    /// Next batch instant strictly after `now`
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.batch_time).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Run until `cancel` fires
    ///
    /// Each run is scheduled one day after the previous one, so a timer that
    /// wakes marginally early cannot trigger the same batch twice.
    pub async fn run(self, cancel: CancellationToken) {
        info!("[BATCH] Scheduler started, batch time {} UTC", self.batch_time);

        let mut next = self.next_run_after(Utc::now());
        loop {
            info!("[BATCH] Next batch at {}", next);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait_until(next, Utc::now())) => {}
            }

            let report = self.manager.confirm_all(&cancel).await;
            for (id, error) in &report.failed {
                warn!("[BATCH] Pending {} left queued: {}", id, error);
            }

            next = self.following_run(next, Utc::now());
        }

        info!("[BATCH] Scheduler stopped");
    }

    /// Run after `previous`: the next day, or later if that is already past
    pub fn following_run(&self, previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let next = previous + Duration::days(1);
        if next > now {
            next
        } else {
            self.next_run_after(now)
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
