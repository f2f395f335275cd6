use crate::db::{decimal_column, in_placeholders};
use crate::models::{BaseTransactionKind, BaseTransactionRow};
use crate::upstream::models::BaseTransactionData;
use sqlx::{Row, SqliteConnection};

/// Persist one typed sub-record under its parent transaction. The
/// token fee variants also persist their owned service-data row.
pub async fn insert(
    conn: &mut SqliteConnection,
    kind: BaseTransactionKind,
    transaction_id: i64,
    bt: &BaseTransactionData,
) -> Result<(), sqlx::Error> {
    let base_id = match kind {
        BaseTransactionKind::Input => {
            let result = sqlx::query(
                "INSERT INTO input_base_transactions
                 (transaction_id, hash, name, address_hash, currency_hash, amount, input_create_time)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(transaction_id)
            .bind(&bt.hash)
            .bind(&bt.name)
            .bind(&bt.address_hash)
            .bind(&bt.currency_hash)
            .bind(bt.amount.to_string())
            .bind(bt.create_time)
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        }
        BaseTransactionKind::Receiver => {
            let result = sqlx::query(
                "INSERT INTO receiver_base_transactions
                 (transaction_id, hash, name, address_hash, currency_hash, amount,
                  receiver_create_time, original_amount, receiver_description)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(transaction_id)
            .bind(&bt.hash)
            .bind(&bt.name)
            .bind(&bt.address_hash)
            .bind(&bt.currency_hash)
            .bind(bt.amount.to_string())
            .bind(bt.create_time)
            .bind(bt.original_amount.map(|a| a.to_string()))
            .bind(&bt.receiver_description)
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        }
        BaseTransactionKind::FullnodeFee => {
            let result = sqlx::query(
                "INSERT INTO fullnode_fee_base_transactions
                 (transaction_id, hash, name, address_hash, currency_hash, amount,
                  fullnode_fee_create_time, original_amount)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(transaction_id)
            .bind(&bt.hash)
            .bind(&bt.name)
            .bind(&bt.address_hash)
            .bind(&bt.currency_hash)
            .bind(bt.amount.to_string())
            .bind(bt.create_time)
            .bind(bt.original_amount.map(|a| a.to_string()))
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        }
        BaseTransactionKind::NetworkFee => {
            let result = sqlx::query(
                "INSERT INTO network_fee_base_transactions
                 (transaction_id, hash, name, address_hash, currency_hash, amount,
                  network_fee_create_time, original_amount, reduced_amount)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(transaction_id)
            .bind(&bt.hash)
            .bind(&bt.name)
            .bind(&bt.address_hash)
            .bind(&bt.currency_hash)
            .bind(bt.amount.to_string())
            .bind(bt.create_time)
            .bind(bt.original_amount.map(|a| a.to_string()))
            .bind(bt.reduced_amount.map(|a| a.to_string()))
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        }
        BaseTransactionKind::TokenGenerationFee => {
            let result = sqlx::query(
                "INSERT INTO token_generation_fee_base_transactions
                 (transaction_id, hash, name, address_hash, currency_hash, amount,
                  token_generation_fee_create_time, original_amount, original_currency_hash,
                  signer_hash)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(transaction_id)
            .bind(&bt.hash)
            .bind(&bt.name)
            .bind(&bt.address_hash)
            .bind(&bt.currency_hash)
            .bind(bt.amount.to_string())
            .bind(bt.create_time)
            .bind(bt.original_amount.map(|a| a.to_string()))
            .bind(&bt.original_currency_hash)
            .bind(&bt.signer_hash)
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        }
        BaseTransactionKind::TokenMintingFee => {
            let result = sqlx::query(
                "INSERT INTO token_minting_fee_base_transactions
                 (transaction_id, hash, name, address_hash, currency_hash, amount,
                  token_minting_fee_create_time, original_amount, original_currency_hash,
                  signer_hash)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(transaction_id)
            .bind(&bt.hash)
            .bind(&bt.name)
            .bind(&bt.address_hash)
            .bind(&bt.currency_hash)
            .bind(bt.amount.to_string())
            .bind(bt.create_time)
            .bind(bt.original_amount.map(|a| a.to_string()))
            .bind(&bt.original_currency_hash)
            .bind(&bt.signer_hash)
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        }
        BaseTransactionKind::EventInput => {
            let result = sqlx::query(
                "INSERT INTO event_input_base_transactions
                 (transaction_id, hash, name, address_hash, currency_hash, amount,
                  event_input_create_time, event, hard_fork)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(transaction_id)
            .bind(&bt.hash)
            .bind(&bt.name)
            .bind(&bt.address_hash)
            .bind(&bt.currency_hash)
            .bind(bt.amount.to_string())
            .bind(bt.create_time)
            .bind(&bt.event)
            .bind(bt.hard_fork)
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        }
    };

    if kind == BaseTransactionKind::TokenGenerationFee {
        if let Some(sd) = &bt.token_generation_service_data {
            let originator = sd.originator_currency_data.as_ref();
            sqlx::query(
                "INSERT INTO token_generation_service_data
                 (base_transaction_id, fee_amount, symbol, currency_name, description,
                  originator_hash, total_supply, scale)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(base_id)
            .bind(sd.fee_amount.to_string())
            .bind(originator.map(|o| o.symbol.clone()).unwrap_or_default())
            .bind(originator.and_then(|o| o.name.clone()))
            .bind(originator.and_then(|o| o.description.clone()))
            .bind(originator.and_then(|o| o.originator_hash.clone()))
            .bind(
                originator
                    .map(|o| o.total_supply.to_string())
                    .unwrap_or_else(|| "0".to_string()),
            )
            .bind(originator.map(|o| o.scale).unwrap_or(0))
            .execute(&mut *conn)
            .await?;
        }
    }
    if kind == BaseTransactionKind::TokenMintingFee {
        if let Some(sd) = &bt.token_minting_service_data {
            sqlx::query(
                "INSERT INTO token_minting_service_data
                 (base_transaction_id, minting_currency_hash, minting_amount,
                  service_data_create_time, receiver_address, fee_amount, signer_hash)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(base_id)
            .bind(&sd.minting_currency_hash)
            .bind(sd.minting_amount.to_string())
            .bind(sd.create_time)
            .bind(&sd.receiver_address)
            .bind(sd.fee_amount.to_string())
            .bind(&sd.signer_hash)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

/// Load every sub-record across all seven tables for a batch of
/// transactions, projected down to what aggregation needs.
pub async fn load_for_transactions(
    conn: &mut SqliteConnection,
    transaction_ids: &[i64],
) -> Result<Vec<BaseTransactionRow>, sqlx::Error> {
    if transaction_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut all = Vec::new();
    let placeholders = in_placeholders(transaction_ids.len());
    for kind in BaseTransactionKind::ALL {
        let sql = format!(
            "SELECT transaction_id, address_hash, currency_hash, amount
             FROM {} WHERE transaction_id IN ({placeholders})",
            kind.table()
        );
        let mut query = sqlx::query(&sql);
        for id in transaction_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&mut *conn).await?;
        for row in &rows {
            all.push(BaseTransactionRow {
                transaction_id: row.try_get("transaction_id")?,
                kind,
                address_hash: row.try_get("address_hash")?,
                currency_hash: row.try_get("currency_hash")?,
                amount: decimal_column(row, "amount")?,
            });
        }
    }
    Ok(all)
}

/// Declared currency symbols of the batch's token-generation rows,
/// keyed by owning transaction; drives currency creation during
/// aggregation.
pub async fn generation_symbols(
    conn: &mut SqliteConnection,
    transaction_ids: &[i64],
) -> Result<Vec<(i64, String)>, sqlx::Error> {
    if transaction_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT b.transaction_id AS transaction_id, s.symbol AS symbol
         FROM token_generation_fee_base_transactions b
         JOIN token_generation_service_data s ON s.base_transaction_id = b.id
         WHERE b.transaction_id IN ({}) AND s.symbol <> ''",
        in_placeholders(transaction_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in transaction_ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(conn).await?;
    rows.iter()
        .map(|r| Ok((r.try_get("transaction_id")?, r.try_get("symbol")?)))
        .collect()
}

/// Delete every sub-record owned by the given transactions, service
/// data first so nothing is orphaned mid-transaction.
pub async fn delete_for_transactions(
    conn: &mut SqliteConnection,
    transaction_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if transaction_ids.is_empty() {
        return Ok(());
    }
    let placeholders = in_placeholders(transaction_ids.len());

    for (service_table, base_table) in [
        (
            "token_generation_service_data",
            "token_generation_fee_base_transactions",
        ),
        (
            "token_minting_service_data",
            "token_minting_fee_base_transactions",
        ),
    ] {
        let sql = format!(
            "DELETE FROM {service_table} WHERE base_transaction_id IN
             (SELECT id FROM {base_table} WHERE transaction_id IN ({placeholders}))"
        );
        let mut query = sqlx::query(&sql);
        for id in transaction_ids {
            query = query.bind(id);
        }
        query.execute(&mut *conn).await?;
    }

    for kind in BaseTransactionKind::ALL {
        let sql = format!(
            "DELETE FROM {} WHERE transaction_id IN ({placeholders})",
            kind.table()
        );
        let mut query = sqlx::query(&sql);
        for id in transaction_ids {
            query = query.bind(id);
        }
        query.execute(&mut *conn).await?;
    }
    Ok(())
}
