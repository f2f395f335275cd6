use crate::state::{AppState, SyncHistory};
use crate::upstream::NodeClient;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A node is considered caught up while the local ingestion tip is
/// within this many indexes of the primary's tip.
const SYNC_TOLERANCE: i64 = 100;

pub async fn run(state: Arc<AppState>, client: NodeClient, shutdown: CancellationToken) {
    info!("Starting sync status monitor");
    let interval = state.config.status_interval;

    loop {
        status_iteration(&state, &client).await;

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.cancelled() => {
                info!("Shutting down sync status monitor");
                break;
            }
        }
    }
}

/// Polls both endpoints' tips concurrently and publishes the verdict.
/// Only updates in-memory state; the status endpoint reads it.
async fn status_iteration(state: &Arc<AppState>, client: &NodeClient) {
    let primary = &state.config.fullnode_url;
    let backup = &state.config.backup_fullnode_url;

    let (main_res, backup_res) = tokio::join!(
        client.get_last_index(primary),
        client.get_last_index(backup)
    );

    match (&main_res, &backup_res) {
        (Err(main_err), Err(backup_err)) => {
            error!("main and backup fullnode could not get last index: {main_err}; {backup_err}");
        }
        (Err(main_err), Ok(_)) => {
            error!("main fullnode could not get last index: {main_err}");
        }
        (Ok(_), Err(backup_err)) => {
            debug!("backup fullnode could not get last index: {backup_err}");
        }
        (Ok(_), Ok(_)) => {}
    }

    let local_index = state.last_iteration_index.load(Ordering::Relaxed);
    let mut history = *state.sync_history.read().await;
    evaluate_status(main_res.ok(), backup_res.ok(), local_index, &mut history);

    debug!(
        last_index_main = history.last_index_main,
        last_index_backup = history.last_index_backup,
        is_synced = history.is_synced,
        "sync status updated"
    );
    *state.sync_history.write().await = history;
}

/// The verdict table. The primary is authoritative for liveness: if it
/// cannot answer, the mirror reports not synced regardless of the
/// backup. While only the backup is dark, local progress against the
/// primary's tip decides.
pub(crate) fn evaluate_status(
    main_tip: Option<i64>,
    backup_tip: Option<i64>,
    local_index: i64,
    history: &mut SyncHistory,
) {
    let Some(main_tip) = main_tip else {
        history.is_synced = false;
        return;
    };

    match backup_tip {
        Some(backup_tip) => {
            if main_tip >= backup_tip && local_index >= main_tip - SYNC_TOLERANCE {
                history.is_synced = true;
            } else {
                // A primary falling behind a tip the backup already
                // reported, while the two stay close, means the primary
                // regressed rather than the backup racing ahead.
                let primary_regressed = main_tip < history.last_index_backup
                    && (backup_tip - history.last_index_backup) as f64 * 0.2
                        > (backup_tip - main_tip) as f64;
                if primary_regressed || local_index < main_tip - SYNC_TOLERANCE {
                    history.is_synced = false;
                }
            }
            history.last_index_backup = backup_tip;
        }
        None => {
            if local_index >= main_tip - SYNC_TOLERANCE {
                history.is_synced = true;
            }
        }
    }
    history.last_index_main = main_tip;
}
