use crate::db::app_state::{self, DELETE_UNINDEXED_TRANSACTIONS};
use crate::db::{base_transaction, registry, transaction};
use crate::state::AppState;
use crate::sync::SyncError;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Deletes transactions that never received a ledger index within the
/// pending window, unwinding their sub-records, associations and
/// address reference counts in one storage transaction.
pub async fn run(state: Arc<AppState>, shutdown: CancellationToken) {
    info!("Starting stale transaction reaper");

    // Warm-up: give freshly ingested pending transactions a chance to be
    // indexed before the first sweep.
    tokio::select! {
        _ = sleep(state.config.reaper_delay) => {}
        _ = shutdown.cancelled() => {
            info!("Shutting down stale transaction reaper");
            return;
        }
    }

    let interval = state.config.sync_interval;
    loop {
        match reap_iteration(&state).await {
            Ok(reaped) if reaped > 0 => {
                info!(reaped, "deleted stale unindexed transactions");
            }
            Ok(_) => {}
            Err(e) => error!("stale transaction sweep failed: {e}"),
        }

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.cancelled() => {
                info!("Shutting down stale transaction reaper");
                break;
            }
        }
    }
}

pub async fn reap_iteration(state: &AppState) -> Result<usize, SyncError> {
    let mut dbtx = state.db_pool.begin().await?;
    app_state::acquire_lease(&mut dbtx, DELETE_UNINDEXED_TRANSACTIONS).await?;

    let cutoff = Utc::now().timestamp() - state.config.reaper_pending_window.as_secs() as i64;
    let ids = transaction::select_stale_ids(&mut dbtx, cutoff).await?;
    if ids.is_empty() {
        dbtx.commit().await?;
        return Ok(0);
    }

    // Reverse the reference counts from the association rows recorded at
    // ingestion, one decrement per unique (transaction, address).
    for (_, address) in registry::addresses_for_transactions(&mut dbtx, &ids).await? {
        registry::decrement_transaction_count(&mut dbtx, &address).await?;
    }

    // Children before parents.
    base_transaction::delete_for_transactions(&mut dbtx, &ids).await?;
    registry::delete_associations_for_transactions(&mut dbtx, &ids).await?;
    transaction::delete_by_ids(&mut dbtx, &ids).await?;

    dbtx.commit().await?;
    Ok(ids.len())
}
