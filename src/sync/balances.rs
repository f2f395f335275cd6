use crate::currency::{currency_hash_for_symbol, CurrencyNormalizer};
use crate::db::app_state::{self, UPDATE_BALANCES};
use crate::db::{base_transaction, registry, transaction};
use crate::state::AppState;
use crate::sync::SyncError;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Folds confirmed transactions into per-(address, currency) balances.
/// Exactly-once: a transaction's sub-records are applied in the same
/// storage transaction that flips its `is_processed` flag.
pub async fn run(state: Arc<AppState>, shutdown: CancellationToken) {
    info!("Starting balance aggregation task");
    let normalizer = CurrencyNormalizer::new(&state.config.native_symbol);
    let interval = state.config.sync_interval;

    loop {
        match aggregate_iteration(&state, &normalizer).await {
            Ok(processed) if processed > 0 => {
                debug!(processed, "balance batch aggregated");
            }
            Ok(_) => {}
            Err(e) => error!("balance aggregation failed: {e}"),
        }

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown.cancelled() => {
                info!("Shutting down balance aggregation task");
                break;
            }
        }
    }
}

pub async fn aggregate_iteration(
    state: &AppState,
    normalizer: &CurrencyNormalizer,
) -> Result<usize, SyncError> {
    let mut dbtx = state.db_pool.begin().await?;
    app_state::acquire_lease(&mut dbtx, UPDATE_BALANCES).await?;

    let batch = transaction::select_unprocessed(&mut dbtx, state.config.aggregation_batch).await?;
    if batch.is_empty() {
        dbtx.commit().await?;
        return Ok(0);
    }
    let ids: Vec<i64> = batch.iter().map(|row| row.id).collect();

    // Sum every sub-record's signed amount per (address, currency).
    // Debits arrive negative from the node, so plain addition conserves
    // value across a transfer.
    let sub_rows = base_transaction::load_for_transactions(&mut dbtx, &ids).await?;
    let mut deltas: BTreeMap<(String, String), Decimal> = BTreeMap::new();
    for row in sub_rows {
        let currency = normalizer.normalize(row.currency_hash.as_deref());
        *deltas.entry((row.address_hash, currency)).or_default() += row.amount;
    }

    // Token generation introduces a brand-new currency; record it under
    // the transaction that created it.
    for (tx_id, symbol) in base_transaction::generation_symbols(&mut dbtx, &ids).await? {
        let hash = currency_hash_for_symbol(&symbol);
        registry::insert_currency_for_transaction(&mut dbtx, &hash, tx_id).await?;
    }

    let touched: Vec<String> = deltas
        .keys()
        .map(|(address, _)| address.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let current: HashMap<(String, String), Decimal> =
        registry::load_balances_for_addresses(&mut dbtx, &touched)
            .await?
            .into_iter()
            .map(|row| ((row.address_hash, row.currency_hash), row.amount))
            .collect();

    for ((address, currency), delta) in deltas {
        if delta.is_zero() {
            continue;
        }
        match current.get(&(address.clone(), currency.clone())) {
            Some(balance) => {
                registry::set_balance(&mut dbtx, &address, &currency, *balance + delta).await?;
            }
            None => {
                registry::insert_balance(&mut dbtx, &address, &currency, delta).await?;
            }
        }
    }

    transaction::mark_processed(&mut dbtx, &ids).await?;
    dbtx.commit().await?;
    Ok(ids.len())
}
