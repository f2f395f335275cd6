use crate::config::Config;
use sqlx::SqlitePool;
use std::sync::atomic::AtomicI64;
use tokio::sync::RwLock;

/// Last observed tip of each upstream node plus the monitor's verdict.
/// Published by the failover monitor, read by the status endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncHistory {
    pub last_index_main: i64,
    pub last_index_backup: i64,
    pub is_synced: bool,
}

pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub sync_history: RwLock<SyncHistory>,
    /// Tip index seen by the most recent ingestion iteration.
    pub last_iteration_index: AtomicI64,
}

impl AppState {
    pub fn new(config: Config, db_pool: SqlitePool) -> Self {
        Self {
            config,
            db_pool,
            sync_history: RwLock::new(SyncHistory::default()),
            last_iteration_index: AtomicI64::new(0),
        }
    }
}
