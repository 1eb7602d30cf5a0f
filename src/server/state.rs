use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::Pool;
use crate::scheduler::SyncRunner;

pub type GuardedSyncRunner = Arc<SyncRunner>;

/// Static facts reported by the home route.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub sync_interval: Duration,
    pub author: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub pool: Pool,
    pub runner: GuardedSyncRunner,
    pub info: Arc<ServiceInfo>,
}

impl ServerState {
    pub fn new(runner: GuardedSyncRunner, cfg: &Config) -> Self {
        Self {
            pool: runner.pool().clone(),
            runner,
            info: Arc::new(ServiceInfo {
                sync_interval: cfg.sync_interval(),
                author: cfg.server.author.clone(),
            }),
        }
    }
}

impl FromRef<ServerState> for Pool {
    fn from_ref(input: &ServerState) -> Self {
        input.pool.clone()
    }
}

impl FromRef<ServerState> for GuardedSyncRunner {
    fn from_ref(input: &ServerState) -> Self {
        input.runner.clone()
    }
}

impl FromRef<ServerState> for Arc<ServiceInfo> {
    fn from_ref(input: &ServerState) -> Self {
        input.info.clone()
    }
}
