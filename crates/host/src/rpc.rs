//! Chain access over JSON-RPC

use alloy_primitives::{Address, B256};
use arbius_bindings::RawLog;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::trace;

use crate::error::HostError;

/// Log query against one contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    /// Emitting contract
    pub address: Address,
    /// First block, inclusive
    pub from_block: u64,
    /// Last block, inclusive
    pub to_block: u64,
    /// Positional topic filter; `None` matches anything
    pub topics: Vec<Option<B256>>,
}

impl LogFilter {
    fn to_params(&self) -> Value {
        json!([{
            "address": self.address,
            "fromBlock": format!("0x{:x}", self.from_block),
            "toBlock": format!("0x{:x}", self.to_block),
            "topics": self.topics,
        }])
    }
}

/// Read-only chain access shared by every reader
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, HostError>;

    /// `eth_blockNumber`
    async fn block_number(&self) -> Result<u64, HostError>;

    /// `eth_getLogs`
    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, HostError>;
}

/// [`ChainClient`] over HTTP JSON-RPC
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    url: String,
    http_client: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    /// Create a client for the given endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_client: reqwest::Client::new(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call RPC
    async fn request(&self, method: &str, params: Value) -> Result<Value, HostError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });
        trace!(target: "rpc", method, id, "sending request");

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(HostError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        response.get("result").cloned().ok_or_else(|| HostError::MissingResult(method.to_string()))
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, HostError> {
        let result = self
            .request(
                "eth_call",
                json!([
                    {
                        "to": to,
                        "data": format!("0x{}", hex::encode(&data))
                    },
                    "latest"
                ]),
            )
            .await?;

        let hex_result = result
            .as_str()
            .ok_or_else(|| HostError::InvalidResponse(format!("eth_call result {result}")))?;
        Ok(hex::decode(hex_result.trim_start_matches("0x"))?)
    }

    async fn block_number(&self) -> Result<u64, HostError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        parse_quantity(&result)
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, HostError> {
        let result = self.request("eth_getLogs", filter.to_params()).await?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Parse a hex quantity such as `"0x1b4"`
fn parse_quantity(value: &Value) -> Result<u64, HostError> {
    let text = value
        .as_str()
        .ok_or_else(|| HostError::InvalidResponse(format!("expected quantity, got {value}")))?;
    u64::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|_| HostError::InvalidResponse(format!("invalid quantity {text:?}")))
}
