use crate::db::app_state;
use sqlx::SqlitePool;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS app_state (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        value TEXT NOT NULL DEFAULT '',
        create_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        update_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    )",
    "CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hash TEXT NOT NULL UNIQUE,
        ledger_index INTEGER,
        amount TEXT NOT NULL,
        attachment_time REAL NOT NULL DEFAULT 0,
        is_valid INTEGER,
        transaction_create_time REAL NOT NULL DEFAULT 0,
        left_parent_hash TEXT,
        right_parent_hash TEXT,
        sender_hash TEXT,
        sender_trust_score REAL NOT NULL DEFAULT 0,
        consensus_update_time REAL,
        transaction_description TEXT,
        trust_chain_consensus INTEGER NOT NULL DEFAULT 0,
        trust_chain_trust_score REAL NOT NULL DEFAULT 0,
        type TEXT NOT NULL,
        is_processed INTEGER NOT NULL DEFAULT 0,
        create_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    )",
    "CREATE INDEX IF NOT EXISTS idx_transactions_ledger_index ON transactions(ledger_index)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_is_processed ON transactions(is_processed)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_create_time ON transactions(create_time)",
    "CREATE TABLE IF NOT EXISTS input_base_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        address_hash TEXT NOT NULL,
        currency_hash TEXT,
        amount TEXT NOT NULL,
        input_create_time REAL NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_ibt_transaction_id ON input_base_transactions(transaction_id)",
    "CREATE TABLE IF NOT EXISTS receiver_base_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        address_hash TEXT NOT NULL,
        currency_hash TEXT,
        amount TEXT NOT NULL,
        receiver_create_time REAL NOT NULL DEFAULT 0,
        original_amount TEXT,
        receiver_description TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_rbt_transaction_id ON receiver_base_transactions(transaction_id)",
    "CREATE TABLE IF NOT EXISTS fullnode_fee_base_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        address_hash TEXT NOT NULL,
        currency_hash TEXT,
        amount TEXT NOT NULL,
        fullnode_fee_create_time REAL NOT NULL DEFAULT 0,
        original_amount TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_ffbt_transaction_id ON fullnode_fee_base_transactions(transaction_id)",
    "CREATE TABLE IF NOT EXISTS network_fee_base_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        address_hash TEXT NOT NULL,
        currency_hash TEXT,
        amount TEXT NOT NULL,
        network_fee_create_time REAL NOT NULL DEFAULT 0,
        original_amount TEXT,
        reduced_amount TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_nfbt_transaction_id ON network_fee_base_transactions(transaction_id)",
    "CREATE TABLE IF NOT EXISTS token_generation_fee_base_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        address_hash TEXT NOT NULL,
        currency_hash TEXT,
        amount TEXT NOT NULL,
        token_generation_fee_create_time REAL NOT NULL DEFAULT 0,
        original_amount TEXT,
        original_currency_hash TEXT,
        signer_hash TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_tgbt_transaction_id ON token_generation_fee_base_transactions(transaction_id)",
    "CREATE TABLE IF NOT EXISTS token_minting_fee_base_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        address_hash TEXT NOT NULL,
        currency_hash TEXT,
        amount TEXT NOT NULL,
        token_minting_fee_create_time REAL NOT NULL DEFAULT 0,
        original_amount TEXT,
        original_currency_hash TEXT,
        signer_hash TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_tmbt_transaction_id ON token_minting_fee_base_transactions(transaction_id)",
    "CREATE TABLE IF NOT EXISTS event_input_base_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        address_hash TEXT NOT NULL,
        currency_hash TEXT,
        amount TEXT NOT NULL,
        event_input_create_time REAL NOT NULL DEFAULT 0,
        event TEXT,
        hard_fork INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_eibt_transaction_id ON event_input_base_transactions(transaction_id)",
    "CREATE TABLE IF NOT EXISTS token_generation_service_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        base_transaction_id INTEGER NOT NULL,
        fee_amount TEXT NOT NULL DEFAULT '0',
        symbol TEXT NOT NULL DEFAULT '',
        currency_name TEXT,
        description TEXT,
        originator_hash TEXT,
        total_supply TEXT NOT NULL DEFAULT '0',
        scale INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_tgsd_base_transaction_id
        ON token_generation_service_data(base_transaction_id)",
    "CREATE TABLE IF NOT EXISTS token_minting_service_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        base_transaction_id INTEGER NOT NULL,
        minting_currency_hash TEXT NOT NULL,
        minting_amount TEXT NOT NULL DEFAULT '0',
        service_data_create_time REAL NOT NULL DEFAULT 0,
        receiver_address TEXT NOT NULL,
        fee_amount TEXT NOT NULL DEFAULT '0',
        signer_hash TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_tmsd_base_transaction_id
        ON token_minting_service_data(base_transaction_id)",
    "CREATE TABLE IF NOT EXISTS currencies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hash TEXT NOT NULL UNIQUE,
        transaction_id INTEGER,
        create_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    )",
    "CREATE TABLE IF NOT EXISTS addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address_hash TEXT NOT NULL UNIQUE,
        create_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    )",
    "CREATE TABLE IF NOT EXISTS address_balances (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address_hash TEXT NOT NULL,
        currency_hash TEXT NOT NULL,
        amount TEXT NOT NULL,
        UNIQUE(address_hash, currency_hash)
    )",
    "CREATE INDEX IF NOT EXISTS idx_address_balances_address ON address_balances(address_hash)",
    "CREATE TABLE IF NOT EXISTS address_transaction_counts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address_hash TEXT NOT NULL UNIQUE,
        count INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS transaction_addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        address_hash TEXT NOT NULL,
        attachment_time REAL NOT NULL DEFAULT 0,
        UNIQUE(transaction_id, address_hash)
    )",
    "CREATE INDEX IF NOT EXISTS idx_transaction_addresses_address
        ON transaction_addresses(address_hash)",
    "CREATE TABLE IF NOT EXISTS transaction_currencies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        currency_hash TEXT NOT NULL,
        attachment_time REAL NOT NULL DEFAULT 0,
        UNIQUE(transaction_id, currency_hash)
    )",
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Make sure every named cursor/lock row exists before the sync tasks
/// start; each task leases its own row at the top of every iteration.
pub async fn verify_app_states(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for name in app_state::ALL_STATES {
        sqlx::query("INSERT OR IGNORE INTO app_state (name, value) VALUES (?, '')")
            .bind(name)
            .execute(pool)
            .await?;
    }
    Ok(())
}
