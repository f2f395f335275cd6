use sqlx::{Row, SqliteConnection};

pub const LAST_MONITORED_TRANSACTION_INDEX: &str = "lastMonitoredTransactionIndex";
pub const UPDATE_BALANCES: &str = "updateBalances";
pub const DELETE_UNINDEXED_TRANSACTIONS: &str = "deleteUnindexedTransactions";
pub const MONITOR_TRANSACTION: &str = "monitorTransaction";

pub const ALL_STATES: [&str; 4] = [
    LAST_MONITORED_TRANSACTION_INDEX,
    UPDATE_BALANCES,
    DELETE_UNINDEXED_TRANSACTIONS,
    MONITOR_TRANSACTION,
];

/// Named exclusive lease: touching the state row inside the enclosing
/// storage transaction takes a write lock on it, serializing the owning
/// task's iterations within this process and across process instances
/// sharing the store. The portable equivalent of `SELECT ... FOR UPDATE`.
pub async fn acquire_lease(conn: &mut SqliteConnection, name: &str) -> Result<(), sqlx::Error> {
    let result = sqlx::query("UPDATE app_state SET update_time = strftime('%s', 'now') WHERE name = ?")
        .bind(name)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn get_value(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT value FROM app_state WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|r| r.get("value")))
}

pub async fn set_value(
    conn: &mut SqliteConnection,
    name: &str,
    value: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE app_state SET value = ?, update_time = strftime('%s', 'now') WHERE name = ?")
        .bind(value)
        .bind(name)
        .execute(conn)
        .await?;
    Ok(())
}

/// Cursor helper: absent or empty value means "nothing ingested yet" (-1).
pub async fn get_cursor(conn: &mut SqliteConnection, name: &str) -> Result<i64, sqlx::Error> {
    let value = get_value(conn, name).await?;
    match value.as_deref() {
        None | Some("") => Ok(-1),
        Some(raw) => raw.parse().map_err(|e| sqlx::Error::ColumnDecode {
            index: "value".to_string(),
            source: Box::new(e),
        }),
    }
}
