//! Periodic sync driver.
//!
//! At most one sync pass runs at a time. Scheduled ticks that find a pass in
//! flight are skipped; manual triggers wait for it and then run their own.

use crate::db::Pool;
use crate::sync::{run_sync, SyncError, SyncReport};
use crate::upstream::CatalogSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another pass was already running.
    Skipped,
}

pub struct SyncRunner {
    pool: Pool,
    source: Arc<dyn CatalogSource>,
    concurrency: usize,
    in_flight: Mutex<()>,
}

impl SyncRunner {
    pub fn new(pool: Pool, source: Arc<dyn CatalogSource>, concurrency: usize) -> Self {
        Self {
            pool,
            source,
            concurrency,
            in_flight: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Run a pass now, queueing behind any pass already in flight.
    pub async fn run_now(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.in_flight.lock().await;
        run_sync(&self.pool, self.source.as_ref(), self.concurrency).await
    }

    /// Run a pass unless one is already in flight.
    pub async fn run_scheduled(&self) -> Result<SyncOutcome, SyncError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("previous sync pass still running; skipping tick");
            return Ok(SyncOutcome::Skipped);
        };
        run_sync(&self.pool, self.source.as_ref(), self.concurrency)
            .await
            .map(SyncOutcome::Completed)
    }
}

/// Spawn the timer loop: one pass immediately, then one every `period` until
/// the returned task is aborted.
pub fn spawn_scheduler(runner: Arc<SyncRunner>, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "starting sync scheduler");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = runner.run_scheduled().await {
                error!(%err, "scheduled sync pass failed");
            }
        }
    })
}
