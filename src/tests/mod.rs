pub mod balance_tests;
pub mod failover_tests;
pub mod ingestion_tests;

pub mod support {
    use crate::config::Config;
    use crate::db::migration;
    use crate::upstream::models::{BaseTransactionData, TransactionData};
    use rust_decimal::Decimal;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::str::FromStr;
    use std::time::Duration;

    /// In-memory store with the full schema applied. Single connection:
    /// every pooled connection to `sqlite::memory:` would otherwise get
    /// its own empty database.
    pub async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        migration::run_migrations(&pool).await.expect("migrations");
        migration::verify_app_states(&pool).await.expect("app states");
        pool
    }

    pub fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            fullnode_url: "http://main.invalid".to_string(),
            backup_fullnode_url: "http://backup.invalid".to_string(),
            native_symbol: "coti".to_string(),
            max_transactions_per_sync: 3000,
            sync_interval: Duration::from_secs(10),
            monitor_interval: Duration::from_secs(5),
            status_interval: Duration::from_secs(10),
            reaper_delay: Duration::from_secs(0),
            reaper_pending_window: Duration::from_secs(3600),
            max_retries: 2,
            http_timeout_secs: 5,
            aggregation_batch: 3000,
        }
    }

    pub fn base_record(name: &str, address: &str, amount: &str) -> BaseTransactionData {
        BaseTransactionData {
            hash: format!("bt-{name}-{address}"),
            name: name.to_string(),
            address_hash: address.to_string(),
            amount: Decimal::from_str(amount).expect("decimal literal"),
            currency_hash: None,
            create_time: 1_000.0,
            original_amount: None,
            reduced_amount: None,
            original_currency_hash: None,
            receiver_description: None,
            signer_hash: None,
            event: None,
            hard_fork: None,
            token_generation_service_data: None,
            token_minting_service_data: None,
        }
    }

    pub fn transaction_record(
        hash: &str,
        index: Option<i64>,
        consensus_update_time: Option<f64>,
        base_transactions: Vec<BaseTransactionData>,
    ) -> TransactionData {
        TransactionData {
            hash: hash.to_string(),
            index,
            amount: Decimal::from_str("10.50").expect("decimal literal"),
            attachment_time: 1_000.0,
            is_valid: Some(true),
            transaction_create_time: 1_000.0,
            left_parent_hash: None,
            right_parent_hash: None,
            sender_hash: None,
            sender_trust_score: 50.0,
            transaction_consensus_update_time: consensus_update_time,
            transaction_description: None,
            trust_chain_consensus: consensus_update_time.is_some(),
            trust_chain_trust_score: if consensus_update_time.is_some() { 110.0 } else { 0.0 },
            transaction_type: "Transfer".to_string(),
            base_transactions,
        }
    }
}
