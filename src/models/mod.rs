use rust_decimal::Decimal;
use serde::Serialize;

/// The seven typed money movement kinds a transaction can carry.
/// `from_tag` is the single place wire tags are interpreted; an unknown
/// tag yields `None` and the caller logs and skips the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseTransactionKind {
    Input,
    Receiver,
    FullnodeFee,
    NetworkFee,
    TokenGenerationFee,
    TokenMintingFee,
    EventInput,
}

impl BaseTransactionKind {
    pub const ALL: [BaseTransactionKind; 7] = [
        BaseTransactionKind::Input,
        BaseTransactionKind::Receiver,
        BaseTransactionKind::FullnodeFee,
        BaseTransactionKind::NetworkFee,
        BaseTransactionKind::TokenGenerationFee,
        BaseTransactionKind::TokenMintingFee,
        BaseTransactionKind::EventInput,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "IBT" => Some(Self::Input),
            "RBT" => Some(Self::Receiver),
            "FFBT" => Some(Self::FullnodeFee),
            "NFBT" => Some(Self::NetworkFee),
            "TGBT" => Some(Self::TokenGenerationFee),
            "TMBT" => Some(Self::TokenMintingFee),
            "EIBT" => Some(Self::EventInput),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Input => "input_base_transactions",
            Self::Receiver => "receiver_base_transactions",
            Self::FullnodeFee => "fullnode_fee_base_transactions",
            Self::NetworkFee => "network_fee_base_transactions",
            Self::TokenGenerationFee => "token_generation_fee_base_transactions",
            Self::TokenMintingFee => "token_minting_fee_base_transactions",
            Self::EventInput => "event_input_base_transactions",
        }
    }

}

/// Mirrored transaction row. `ledger_index` is null while the network
/// has not ordered the transaction ("pending").
#[derive(Debug, Clone)]
pub struct TransactionRow {
    pub id: i64,
    pub hash: String,
    pub ledger_index: Option<i64>,
    pub amount: Decimal,
    pub attachment_time: f64,
    pub consensus_update_time: Option<f64>,
    pub trust_chain_consensus: bool,
    pub trust_chain_trust_score: f64,
    pub transaction_type: String,
    pub is_processed: bool,
}

/// Common projection over the seven base-transaction tables, enough for
/// balance aggregation and reference counting.
#[derive(Debug, Clone)]
pub struct BaseTransactionRow {
    pub transaction_id: i64,
    pub kind: BaseTransactionKind,
    pub address_hash: String,
    pub currency_hash: Option<String>,
    pub amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct AddressBalanceRow {
    pub address_hash: String,
    pub currency_hash: String,
    pub amount: Decimal,
}

/// Payload of the status endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStateResponse {
    pub node_tip_index: i64,
    pub sync_iteration_tip_index: i64,
    pub last_monitored_index: i64,
    pub sync_percentage: f64,
    pub is_synced: bool,
}
