use crate::db::{decimal_column, in_placeholders};
use crate::models::TransactionRow;
use crate::upstream::models::TransactionData;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn map_row(row: &SqliteRow) -> Result<TransactionRow, sqlx::Error> {
    Ok(TransactionRow {
        id: row.try_get("id")?,
        hash: row.try_get("hash")?,
        ledger_index: row.try_get("ledger_index")?,
        amount: decimal_column(row, "amount")?,
        attachment_time: row.try_get("attachment_time")?,
        consensus_update_time: row.try_get("consensus_update_time")?,
        trust_chain_consensus: row.try_get::<i64, _>("trust_chain_consensus")? != 0,
        trust_chain_trust_score: row.try_get("trust_chain_trust_score")?,
        transaction_type: row.try_get("type")?,
        is_processed: row.try_get::<i64, _>("is_processed")? != 0,
    })
}

const SELECT_COLUMNS: &str = "id, hash, ledger_index, amount, attachment_time, \
     consensus_update_time, trust_chain_consensus, trust_chain_trust_score, type, is_processed";

pub async fn find_by_hashes(
    conn: &mut SqliteConnection,
    hashes: &[String],
) -> Result<Vec<TransactionRow>, sqlx::Error> {
    if hashes.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM transactions WHERE hash IN ({})",
        in_placeholders(hashes.len())
    );
    let mut query = sqlx::query(&sql);
    for hash in hashes {
        query = query.bind(hash);
    }
    let rows = query.fetch_all(conn).await?;
    rows.iter().map(map_row).collect()
}

/// Insert a newly seen transaction; returns the new row id.
pub async fn insert(
    conn: &mut SqliteConnection,
    tx: &TransactionData,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO transactions
         (hash, ledger_index, amount, attachment_time, is_valid, transaction_create_time,
          left_parent_hash, right_parent_hash, sender_hash, sender_trust_score,
          consensus_update_time, transaction_description, trust_chain_consensus,
          trust_chain_trust_score, type)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&tx.hash)
    .bind(tx.ledger_index())
    .bind(tx.amount.to_string())
    .bind(tx.attachment_time)
    .bind(tx.is_valid)
    .bind(tx.transaction_create_time)
    .bind(&tx.left_parent_hash)
    .bind(&tx.right_parent_hash)
    .bind(&tx.sender_hash)
    .bind(tx.sender_trust_score)
    .bind(tx.consensus_update_time())
    .bind(&tx.transaction_description)
    .bind(tx.trust_chain_consensus)
    .bind(tx.trust_chain_trust_score)
    .bind(&tx.transaction_type)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update_consensus_fields(
    conn: &mut SqliteConnection,
    id: i64,
    ledger_index: Option<i64>,
    consensus_update_time: Option<f64>,
    trust_chain_consensus: bool,
    trust_chain_trust_score: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE transactions
         SET ledger_index = ?, consensus_update_time = ?, trust_chain_consensus = ?,
             trust_chain_trust_score = ?
         WHERE id = ?",
    )
    .bind(ledger_index)
    .bind(consensus_update_time)
    .bind(trust_chain_consensus)
    .bind(trust_chain_trust_score)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Transactions that got a ledger index but whose consensus timestamp
/// has not arrived yet; the consensus refresh task re-polls these.
pub async fn select_awaiting_consensus(
    conn: &mut SqliteConnection,
) -> Result<Vec<TransactionRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM transactions
         WHERE ledger_index IS NOT NULL AND consensus_update_time IS NULL"
    );
    let rows = sqlx::query(&sql).fetch_all(conn).await?;
    rows.iter().map(map_row).collect()
}

/// Confirmed transactions the balance aggregator has not folded yet.
/// ZeroSpend transactions move no value and are skipped outright.
pub async fn select_unprocessed(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<TransactionRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM transactions
         WHERE is_processed = 0 AND consensus_update_time IS NOT NULL AND type <> 'ZeroSpend'
         LIMIT ?"
    );
    let rows = sqlx::query(&sql).bind(limit).fetch_all(conn).await?;
    rows.iter().map(map_row).collect()
}

pub async fn mark_processed(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "UPDATE transactions SET is_processed = 1 WHERE id IN ({})",
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }
    query.execute(conn).await?;
    Ok(())
}

/// Ids of transactions that never received a ledger index within the
/// pending window (`create_time` older than the cutoff, epoch seconds).
pub async fn select_stale_ids(
    conn: &mut SqliteConnection,
    cutoff_epoch: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id FROM transactions
         WHERE ledger_index IS NULL AND consensus_update_time IS NULL AND create_time < ?",
    )
    .bind(cutoff_epoch)
    .fetch_all(conn)
    .await?;
    Ok(rows.iter().map(|r| r.get("id")).collect())
}

pub async fn delete_by_ids(conn: &mut SqliteConnection, ids: &[i64]) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "DELETE FROM transactions WHERE id IN ({})",
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }
    query.execute(conn).await?;
    Ok(())
}
