use crate::db::{decimal_column, in_placeholders};
use crate::models::AddressBalanceRow;
use rust_decimal::Decimal;
use sqlx::{Row, SqliteConnection};

/// Lazy dedup registry: every address hash ever referenced gets one row.
pub async fn register_address(
    conn: &mut SqliteConnection,
    address_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO addresses (address_hash) VALUES (?)")
        .bind(address_hash)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn register_currency(
    conn: &mut SqliteConnection,
    currency_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO currencies (hash) VALUES (?)")
        .bind(currency_hash)
        .execute(conn)
        .await?;
    Ok(())
}

/// Currency introduced by a token-generation transaction; ties the
/// currency to the transaction that created it.
pub async fn insert_currency_for_transaction(
    conn: &mut SqliteConnection,
    currency_hash: &str,
    transaction_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO currencies (hash, transaction_id) VALUES (?, ?)")
        .bind(currency_hash)
        .bind(transaction_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn increment_transaction_count(
    conn: &mut SqliteConnection,
    address_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO address_transaction_counts (address_hash, count) VALUES (?, 1)
         ON CONFLICT(address_hash) DO UPDATE SET count = count + 1",
    )
    .bind(address_hash)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn decrement_transaction_count(
    conn: &mut SqliteConnection,
    address_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE address_transaction_counts SET count = count - 1 WHERE address_hash = ?")
        .bind(address_hash)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn get_transaction_count(
    conn: &mut SqliteConnection,
    address_hash: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT count FROM address_transaction_counts WHERE address_hash = ?")
        .bind(address_hash)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|r| r.get("count")).unwrap_or(0))
}

/// One association row per unique (transaction, address); the UNIQUE
/// constraint keeps repeat sub-record addresses from counting twice.
pub async fn insert_transaction_address(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    address_hash: &str,
    attachment_time: f64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO transaction_addresses (transaction_id, address_hash, attachment_time)
         VALUES (?, ?, ?)",
    )
    .bind(transaction_id)
    .bind(address_hash)
    .bind(attachment_time)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_transaction_currency(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    currency_hash: &str,
    attachment_time: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO transaction_currencies (transaction_id, currency_hash, attachment_time)
         VALUES (?, ?, ?)",
    )
    .bind(transaction_id)
    .bind(currency_hash)
    .bind(attachment_time)
    .execute(conn)
    .await?;
    Ok(())
}

/// Unique (transaction, address) pairs for a batch, as recorded at
/// ingestion time; the reaper reverses reference counts from these.
pub async fn addresses_for_transactions(
    conn: &mut SqliteConnection,
    transaction_ids: &[i64],
) -> Result<Vec<(i64, String)>, sqlx::Error> {
    if transaction_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT transaction_id, address_hash FROM transaction_addresses
         WHERE transaction_id IN ({})",
        in_placeholders(transaction_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in transaction_ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(conn).await?;
    rows.iter()
        .map(|r| Ok((r.try_get("transaction_id")?, r.try_get("address_hash")?)))
        .collect()
}

pub async fn delete_associations_for_transactions(
    conn: &mut SqliteConnection,
    transaction_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if transaction_ids.is_empty() {
        return Ok(());
    }
    let placeholders = in_placeholders(transaction_ids.len());
    for table in ["transaction_addresses", "transaction_currencies"] {
        let sql = format!("DELETE FROM {table} WHERE transaction_id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in transaction_ids {
            query = query.bind(id);
        }
        query.execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn load_balances_for_addresses(
    conn: &mut SqliteConnection,
    address_hashes: &[String],
) -> Result<Vec<AddressBalanceRow>, sqlx::Error> {
    if address_hashes.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT address_hash, currency_hash, amount FROM address_balances
         WHERE address_hash IN ({})",
        in_placeholders(address_hashes.len())
    );
    let mut query = sqlx::query(&sql);
    for hash in address_hashes {
        query = query.bind(hash);
    }
    let rows = query.fetch_all(conn).await?;
    rows.iter()
        .map(|row| {
            Ok(AddressBalanceRow {
                address_hash: row.try_get("address_hash")?,
                currency_hash: row.try_get("currency_hash")?,
                amount: decimal_column(row, "amount")?,
            })
        })
        .collect()
}

/// Balances are only ever advanced by addition; the stored total is
/// replaced with old + delta computed in `Decimal`, never overwritten
/// from scratch.
pub async fn set_balance(
    conn: &mut SqliteConnection,
    address_hash: &str,
    currency_hash: &str,
    amount: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE address_balances SET amount = ? WHERE address_hash = ? AND currency_hash = ?")
        .bind(amount.to_string())
        .bind(address_hash)
        .bind(currency_hash)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn insert_balance(
    conn: &mut SqliteConnection,
    address_hash: &str,
    currency_hash: &str,
    amount: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO address_balances (address_hash, currency_hash, amount) VALUES (?, ?, ?)")
        .bind(address_hash)
        .bind(currency_hash)
        .bind(amount.to_string())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn get_balance(
    conn: &mut SqliteConnection,
    address_hash: &str,
    currency_hash: &str,
) -> Result<Option<Decimal>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT amount FROM address_balances WHERE address_hash = ? AND currency_hash = ?",
    )
    .bind(address_hash)
    .bind(currency_hash)
    .fetch_optional(conn)
    .await?;
    match row {
        Some(row) => Ok(Some(decimal_column(&row, "amount")?)),
        None => Ok(None),
    }
}
