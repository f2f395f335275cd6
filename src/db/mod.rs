pub mod app_state;
pub mod base_transaction;
pub mod connection;
pub mod migration;
pub mod registry;
pub mod transaction;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

/// Monetary amounts are stored as TEXT and re-parsed into `Decimal` so
/// balance arithmetic never goes through floating point.
pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// "?,?,?" for building runtime IN clauses.
pub(crate) fn in_placeholders(count: usize) -> String {
    let mut s = String::from("?");
    for _ in 1..count {
        s.push_str(",?");
    }
    s
}
