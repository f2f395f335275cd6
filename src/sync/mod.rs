pub mod balances;
pub mod consensus;
pub mod failover;
pub mod ingestion;
pub mod monitor;
pub mod reaper;

use crate::upstream::ClientError;
use thiserror::Error;

/// Everything that can fail a sync-task iteration. Transport, decode
/// and storage failures all roll back the iteration's storage
/// transaction and feed the retry/failover policy.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("upstream client error: {0}")]
    Client(#[from] ClientError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
