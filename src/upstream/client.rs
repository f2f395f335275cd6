use crate::config::Config;
use crate::upstream::models::{
    LastIndexResponse, TransactionBatchRequest, TransactionByHashRequest, TransactionData,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(StatusCode),

    #[error("malformed upstream response: {0}")]
    Decode(String),

    #[error("upstream reported error: {0}")]
    Upstream(String),
}

/// Stateless request/response wrapper around a fullnode HTTP API.
/// The same client serves both the primary and backup endpoints; the
/// caller picks the base URL per request.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self { http })
    }

    /// Current tip index known to the node.
    pub async fn get_last_index(&self, base_url: &str) -> Result<i64, ClientError> {
        let res = self
            .http
            .get(format!("{base_url}/transaction/lastIndex"))
            .send()
            .await?;
        let body: LastIndexResponse = decode_response(res).await?;
        if body.status == "error" {
            return Err(ClientError::Upstream(body.status));
        }
        Ok(body.last_index)
    }

    /// Indexed transactions in the inclusive range `[starting_index, ending_index]`.
    pub async fn get_transaction_batch(
        &self,
        base_url: &str,
        starting_index: i64,
        ending_index: i64,
    ) -> Result<Vec<TransactionData>, ClientError> {
        debug!(
            starting_index,
            ending_index, "fetching transaction batch from {base_url}"
        );
        let res = self
            .http
            .post(format!("{base_url}/transaction_batch"))
            .json(&TransactionBatchRequest {
                starting_index,
                ending_index,
            })
            .send()
            .await?;
        decode_response(res).await
    }

    /// Transactions the node has seen but the network has not indexed yet.
    pub async fn get_unindexed_batch(
        &self,
        base_url: &str,
    ) -> Result<Vec<TransactionData>, ClientError> {
        let res = self
            .http
            .get(format!("{base_url}/transaction/none-indexed/batch"))
            .send()
            .await?;
        decode_response(res).await
    }

    pub async fn get_transactions_by_hash(
        &self,
        base_url: &str,
        transaction_hashes: Vec<String>,
    ) -> Result<Vec<TransactionData>, ClientError> {
        let res = self
            .http
            .post(format!("{base_url}/transaction/multiple"))
            .json(&TransactionByHashRequest { transaction_hashes })
            .send()
            .await?;
        decode_response(res).await
    }
}

async fn decode_response<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ClientError> {
    if !res.status().is_success() {
        return Err(ClientError::Status(res.status()));
    }
    let body = res.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
}
