use crate::db::app_state::{self, LAST_MONITORED_TRANSACTION_INDEX};
use crate::db::{base_transaction, registry, transaction};
use crate::models::{BaseTransactionKind, TransactionRow};
use crate::state::AppState;
use crate::sync::failover::NodeSelector;
use crate::sync::SyncError;
use crate::upstream::models::TransactionData;
use crate::upstream::NodeClient;
use sqlx::SqliteConnection;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub async fn run(state: Arc<AppState>, client: NodeClient, shutdown: CancellationToken) {
    info!("Starting transaction ingestion task");
    let mut selector = NodeSelector::new(
        state.config.fullnode_url.clone(),
        state.config.backup_fullnode_url.clone(),
        state.config.max_retries,
    );
    // Sticky: once an iteration has caught up to the tip we keep pulling
    // the pending set on every later pass.
    let mut include_unindexed = false;
    let interval = state.config.sync_interval;
    let mut iteration: u64 = 0;

    loop {
        iteration += 1;
        let started = Instant::now();
        debug!(iteration, "ingestion iteration start");

        let mut succeeded = false;
        loop {
            let url = selector.current_url().to_string();
            match sync_iteration(&state, &client, &url, &mut include_unindexed).await {
                Ok(()) => {
                    selector.record_success();
                    succeeded = true;
                    break;
                }
                Err(e) => {
                    error!("ingestion iteration failed: {e}");
                    if selector.record_failure() || shutdown.is_cancelled() {
                        break;
                    }
                }
            }
        }

        debug!(iteration, "ingestion iteration end");
        let elapsed = started.elapsed();
        // Backlog catch-up mode loops immediately; once caught up, and
        // after a failed-over iteration, we pace.
        if (include_unindexed || !succeeded) && elapsed < interval {
            tokio::select! {
                _ = sleep(interval - elapsed) => {}
                _ = shutdown.cancelled() => {}
            }
        }
        if shutdown.is_cancelled() {
            info!("Shutting down transaction ingestion task");
            break;
        }
    }
}

/// The ingestion window for one iteration. Returns (start, end,
/// reached_tip); `start > end` means there is nothing indexed to fetch.
pub fn compute_window(cursor: i64, tip: i64, max_batch: i64) -> (i64, i64, bool) {
    let start = cursor + 1;
    if tip > start + max_batch {
        (start, start + max_batch - 1, false)
    } else {
        (start, tip, true)
    }
}

/// One ingestion pass, wrapped in a single storage transaction: lease
/// the cursor row, fetch the next window (plus the pending set once
/// caught up), upsert what came back and advance the cursor. Any error
/// rolls the whole pass back.
pub async fn sync_iteration(
    state: &AppState,
    client: &NodeClient,
    base_url: &str,
    include_unindexed: &mut bool,
) -> Result<(), SyncError> {
    let mut dbtx = state.db_pool.begin().await?;
    app_state::acquire_lease(&mut dbtx, LAST_MONITORED_TRANSACTION_INDEX).await?;
    let cursor = app_state::get_cursor(&mut dbtx, LAST_MONITORED_TRANSACTION_INDEX).await?;

    let tip = client.get_last_index(base_url).await?;
    state.last_iteration_index.store(tip, Ordering::Relaxed);

    let (start, end, reached_tip) = compute_window(cursor, tip, state.config.max_transactions_per_sync);
    if reached_tip {
        *include_unindexed = true;
    }

    let mut records = Vec::new();
    if start <= end {
        records.extend(client.get_transaction_batch(base_url, start, end).await?);
    }
    if *include_unindexed {
        records.extend(client.get_unindexed_batch(base_url).await?);
    }

    if !records.is_empty() {
        let max_seen = ingest_batch(&mut dbtx, &records).await?;
        // Monotonic: never regress on a partial or empty result.
        if max_seen > cursor {
            app_state::set_value(
                &mut dbtx,
                LAST_MONITORED_TRANSACTION_INDEX,
                &max_seen.to_string(),
            )
            .await?;
        }
    }

    dbtx.commit().await?;
    Ok(())
}

/// Upsert a batch of upstream records: merge consensus fields into rows
/// we already hold while they are still pending, insert everything
/// unseen together with its typed sub-records and registry entries.
/// Returns the largest ledger index observed.
pub async fn ingest_batch(
    conn: &mut SqliteConnection,
    records: &[TransactionData],
) -> Result<i64, SyncError> {
    let hashes: Vec<String> = records.iter().map(|r| r.hash.clone()).collect();
    let existing = transaction::find_by_hashes(conn, &hashes).await?;
    let existing_by_hash: HashMap<&str, &TransactionRow> =
        existing.iter().map(|row| (row.hash.as_str(), row)).collect();

    let mut max_index = -1;
    let mut inserted_hashes: HashSet<&str> = HashSet::new();

    for record in records {
        if let Some(index) = record.ledger_index() {
            max_index = max_index.max(index);
        }
        match existing_by_hash.get(record.hash.as_str()).copied() {
            Some(row) => {
                // Update in place only while the stored row is still
                // pending; finalized rows are settled history.
                if row.ledger_index.is_none() {
                    merge_consensus(conn, row, record).await?;
                }
            }
            None => {
                // The indexed window and the pending set can both carry
                // the same hash within one batch.
                if !inserted_hashes.insert(record.hash.as_str()) {
                    continue;
                }
                insert_transaction_graph(conn, record).await?;
            }
        }
    }
    Ok(max_index)
}

/// Writes the record's consensus fields over the stored row when any of
/// them differ; returns whether an update happened.
pub(crate) async fn merge_consensus(
    conn: &mut SqliteConnection,
    row: &TransactionRow,
    record: &TransactionData,
) -> Result<bool, SyncError> {
    let new_index = record.ledger_index().or(row.ledger_index);
    let new_consensus = record.consensus_update_time().or(row.consensus_update_time);
    // trust score only ever rises
    let new_score = if record.trust_chain_trust_score > row.trust_chain_trust_score {
        record.trust_chain_trust_score
    } else {
        row.trust_chain_trust_score
    };

    let changed = new_index != row.ledger_index
        || new_consensus != row.consensus_update_time
        || record.trust_chain_consensus != row.trust_chain_consensus
        || new_score != row.trust_chain_trust_score;
    if changed {
        transaction::update_consensus_fields(
            conn,
            row.id,
            new_index,
            new_consensus,
            record.trust_chain_consensus,
            new_score,
        )
        .await?;
    }
    Ok(changed)
}

async fn insert_transaction_graph(
    conn: &mut SqliteConnection,
    record: &TransactionData,
) -> Result<(), SyncError> {
    let tx_id = transaction::insert(conn, record).await?;

    let mut addresses: BTreeSet<&str> = BTreeSet::new();
    let mut currencies: BTreeSet<&str> = BTreeSet::new();
    for bt in &record.base_transactions {
        let Some(kind) = BaseTransactionKind::from_tag(&bt.name) else {
            warn!(
                "unknown base transaction name {} on transaction {}, skipping record",
                bt.name, record.hash
            );
            continue;
        };
        base_transaction::insert(conn, kind, tx_id, bt).await?;
        addresses.insert(bt.address_hash.as_str());
        if let Some(currency) = bt.currency_hash.as_deref() {
            if !currency.is_empty() {
                currencies.insert(currency);
            }
        }
    }

    for address in &addresses {
        registry::register_address(conn, address).await?;
        let first_touch =
            registry::insert_transaction_address(conn, tx_id, address, record.attachment_time)
                .await?;
        // once per unique (transaction, address), however many
        // sub-records share the address
        if first_touch {
            registry::increment_transaction_count(conn, address).await?;
        }
    }
    for currency in &currencies {
        registry::register_currency(conn, currency).await?;
        registry::insert_transaction_currency(conn, tx_id, currency, record.attachment_time)
            .await?;
    }
    Ok(())
}
