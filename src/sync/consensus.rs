use crate::db::app_state::{self, MONITOR_TRANSACTION};
use crate::db::transaction;
use crate::state::AppState;
use crate::sync::failover::NodeSelector;
use crate::sync::{ingestion, SyncError};
use crate::upstream::models::TransactionData;
use crate::upstream::NodeClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Re-polls indexed transactions that are still missing their consensus
/// timestamp and writes back whatever the node has settled since.
pub async fn run(state: Arc<AppState>, client: NodeClient, shutdown: CancellationToken) {
    info!("Starting consensus refresh task");
    let mut selector = NodeSelector::new(
        state.config.fullnode_url.clone(),
        state.config.backup_fullnode_url.clone(),
        state.config.max_retries,
    );
    let interval = state.config.monitor_interval;

    loop {
        loop {
            let url = selector.current_url().to_string();
            match refresh_iteration(&state, &client, &url).await {
                Ok(refreshed) => {
                    selector.record_success();
                    if refreshed > 0 {
                        debug!(refreshed, "consensus fields refreshed");
                    }
                    break;
                }
                Err(e) => {
                    error!("consensus refresh failed: {e}");
                    if selector.record_failure() || shutdown.is_cancelled() {
                        break;
                    }
                }
            }
        }

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.cancelled() => {
                info!("Shutting down consensus refresh task");
                break;
            }
        }
    }
}

pub async fn refresh_iteration(
    state: &AppState,
    client: &NodeClient,
    base_url: &str,
) -> Result<usize, SyncError> {
    let mut dbtx = state.db_pool.begin().await?;
    app_state::acquire_lease(&mut dbtx, MONITOR_TRANSACTION).await?;

    let awaiting = transaction::select_awaiting_consensus(&mut dbtx).await?;
    if awaiting.is_empty() {
        dbtx.commit().await?;
        return Ok(0);
    }

    let hashes: Vec<String> = awaiting.iter().map(|row| row.hash.clone()).collect();
    let fresh = client.get_transactions_by_hash(base_url, hashes).await?;
    let fresh_by_hash: HashMap<&str, &TransactionData> =
        fresh.iter().map(|r| (r.hash.as_str(), r)).collect();

    let mut refreshed = 0;
    for row in &awaiting {
        if let Some(record) = fresh_by_hash.get(row.hash.as_str()).copied() {
            // any changed field counts, the timestamp may settle later
            if ingestion::merge_consensus(&mut dbtx, row, record).await? {
                refreshed += 1;
            }
        }
    }

    dbtx.commit().await?;
    Ok(refreshed)
}
