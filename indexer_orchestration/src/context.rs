use crate::config::OrchestrationConfig;
use beacon_time::BeaconTime;
use indexer_http::{BeaconApiClient, ExecutionClient};
use indexer_store::Store;
use slog::Logger;
use std::sync::Arc;
use task_executor::TaskExecutor;

/// Everything every level of the orchestration tree needs: the typed
/// beacon-API facade, the execution-layer client, storage, pure time math,
/// configuration, and the shutdown-aware task spawner. Cheap to clone —
/// every field is already `Arc`-backed or `Copy`.
#[derive(Clone)]
pub struct Context {
    pub beacon_api: Arc<BeaconApiClient>,
    pub execution: Arc<ExecutionClient>,
    pub store: Store,
    pub beacon_time: BeaconTime,
    pub config: OrchestrationConfig,
    pub executor: TaskExecutor,
    pub log: Logger,
}

impl Context {
    pub fn current_slot(&self) -> beacon_time::Slot {
        crate::clock::current_slot(&self.beacon_time)
    }
}
