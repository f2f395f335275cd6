use dotenv::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub fullnode_url: String,
    pub backup_fullnode_url: String,
    pub native_symbol: String,
    pub max_transactions_per_sync: i64,
    pub sync_interval: Duration,
    pub monitor_interval: Duration,
    pub status_interval: Duration,
    pub reaper_delay: Duration,
    pub reaper_pending_window: Duration,
    pub max_retries: u8,
    pub http_timeout_secs: u64,
    pub aggregation_batch: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://mirror.db".to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let fullnode_url =
            env::var("FULLNODE_URL").unwrap_or_else(|_| "http://localhost:7070".to_string());
        let backup_fullnode_url =
            env::var("FULLNODE_BACKUP_URL").unwrap_or_else(|_| fullnode_url.clone());
        let native_symbol = env::var("NATIVE_SYMBOL").unwrap_or_else(|_| "coti".to_string());
        let max_transactions_per_sync = env::var("MAX_TRANSACTIONS_PER_SYNC")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let sync_interval = env_duration_secs("SYNC_INTERVAL_SECS", 10);
        let monitor_interval = env_duration_secs("MONITOR_INTERVAL_SECS", 5);
        let status_interval = env_duration_secs("STATUS_INTERVAL_SECS", 10);
        // the reaper knobs are expressed in hours, like the deployment env they came from
        let reaper_delay = env_duration_hours("DELETE_TX_DELAY_IN_HOURS", 2.0);
        let reaper_pending_window = env_duration_hours("DELETE_TX_PENDING_MIN_HOURS", 1.0);
        let max_retries = env::var("MAX_RETRIES")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .unwrap_or(2);
        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(30))
            .unwrap_or(30);
        let aggregation_batch = env::var("AGGREGATION_BATCH")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        Self {
            database_url,
            server_host,
            server_port,
            fullnode_url,
            backup_fullnode_url,
            native_symbol,
            max_transactions_per_sync,
            sync_interval,
            monitor_interval,
            status_interval,
            reaper_delay,
            reaper_pending_window,
            max_retries,
            http_timeout_secs,
            aggregation_batch,
        }
    }
}

fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default_secs))
}

fn env_duration_hours(key: &str, default_hours: f64) -> Duration {
    let hours: f64 = env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_hours);
    Duration::from_secs((hours * 3600.0) as u64)
}
