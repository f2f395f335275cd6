use rust_decimal::Decimal;
use serde::Deserialize;

/// One transaction record as served by a fullnode. Pending transactions
/// carry no index; consensus fields arrive later and may be zero until
/// the trust chain reaches the transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub hash: String,
    #[serde(default)]
    pub index: Option<i64>,
    pub amount: Decimal,
    #[serde(default)]
    pub attachment_time: f64,
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default)]
    pub transaction_create_time: f64,
    #[serde(default)]
    pub left_parent_hash: Option<String>,
    #[serde(default)]
    pub right_parent_hash: Option<String>,
    #[serde(default)]
    pub sender_hash: Option<String>,
    #[serde(default)]
    pub sender_trust_score: f64,
    #[serde(default)]
    pub transaction_consensus_update_time: Option<f64>,
    #[serde(default)]
    pub transaction_description: Option<String>,
    #[serde(default)]
    pub trust_chain_consensus: bool,
    #[serde(default)]
    pub trust_chain_trust_score: f64,
    #[serde(rename = "type")]
    pub transaction_type: String,
    #[serde(default, rename = "baseTransactions")]
    pub base_transactions: Vec<BaseTransactionData>,
}

impl TransactionData {
    /// The upstream reports "no consensus yet" as either a missing field
    /// or a zero timestamp.
    pub fn consensus_update_time(&self) -> Option<f64> {
        self.transaction_consensus_update_time.filter(|t| *t > 0.0)
    }

    /// A zero index on the wire means the transaction is still pending.
    pub fn ledger_index(&self) -> Option<i64> {
        self.index.filter(|i| *i > 0)
    }
}

/// One money movement line item. The `name` tag selects which of the
/// seven typed tables the row lands in; unknown tags survive decoding
/// and are dropped at persist time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseTransactionData {
    pub hash: String,
    pub name: String,
    pub address_hash: String,
    pub amount: Decimal,
    #[serde(default)]
    pub currency_hash: Option<String>,
    #[serde(default)]
    pub create_time: f64,
    #[serde(default)]
    pub original_amount: Option<Decimal>,
    #[serde(default)]
    pub reduced_amount: Option<Decimal>,
    #[serde(default)]
    pub original_currency_hash: Option<String>,
    #[serde(default)]
    pub receiver_description: Option<String>,
    #[serde(default)]
    pub signer_hash: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub hard_fork: Option<bool>,
    #[serde(default)]
    pub token_generation_service_data: Option<TokenGenerationServiceData>,
    #[serde(default)]
    pub token_minting_service_data: Option<TokenMintingServiceData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGenerationServiceData {
    #[serde(default)]
    pub fee_amount: Decimal,
    #[serde(default)]
    pub originator_currency_data: Option<OriginatorCurrencyData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginatorCurrencyData {
    #[serde(default)]
    pub name: Option<String>,
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub originator_hash: Option<String>,
    #[serde(default)]
    pub total_supply: Decimal,
    #[serde(default)]
    pub scale: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMintingServiceData {
    pub minting_currency_hash: String,
    #[serde(default)]
    pub minting_amount: Decimal,
    #[serde(default)]
    pub create_time: f64,
    pub receiver_address: String,
    #[serde(default)]
    pub fee_amount: Decimal,
    #[serde(default)]
    pub signer_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastIndexResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_index: i64,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBatchRequest {
    pub starting_index: i64,
    pub ending_index: i64,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionByHashRequest {
    pub transaction_hashes: Vec<String>,
}
