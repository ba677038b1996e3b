//! JSON-RPC client for Ethereum-family chains.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use pangea_types::{ChainError, EthereumAddress};

use crate::eip155::EthereumTransactionRequest;

/// Client for a single chain's JSON-RPC endpoint.
#[derive(Debug)]
pub struct EthereumRpcClient {
    http_client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl EthereumRpcClient {
    pub fn new(url: &str, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn rpc_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(ChainError::Network(format!(
                "{method} HTTP status {}",
                response.status()
            )));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::Protocol(format!("failed to parse {method} response: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(ChainError::Protocol(format!(
                "{method} failed: {} (code {})",
                error.message, error.code
            )));
        }
        parsed
            .result
            .ok_or_else(|| ChainError::Protocol(format!("{method} returned no result")))
    }

    /// Native balance in wei.
    pub async fn balance(&self, address: &EthereumAddress) -> Result<u128, ChainError> {
        let hex: String = self
            .rpc_call("eth_getBalance", json!([address.checksummed(), "latest"]))
            .await?;
        parse_hex_u128(&hex)
    }

    pub async fn gas_price(&self) -> Result<u128, ChainError> {
        let hex: String = self.rpc_call("eth_gasPrice", json!([])).await?;
        parse_hex_u128(&hex)
    }

    /// Next nonce for the address, counting pending transactions.
    pub async fn transaction_count(&self, address: &EthereumAddress) -> Result<u64, ChainError> {
        let hex: String = self
            .rpc_call(
                "eth_getTransactionCount",
                json!([address.checksummed(), "pending"]),
            )
            .await?;
        parse_hex_u64(&hex)
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        let hex: String = self.rpc_call("eth_chainId", json!([])).await?;
        parse_hex_u64(&hex)
    }

    pub async fn estimate_gas(
        &self,
        request: &EthereumTransactionRequest,
    ) -> Result<u128, ChainError> {
        let hex: String = self
            .rpc_call("eth_estimateGas", json!([request.to_call_object()]))
            .await?;
        parse_hex_u128(&hex)
    }

    /// Submit a signed raw transaction; returns the transaction hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, ChainError> {
        self.rpc_call(
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(raw))]),
        )
        .await
    }
}

fn map_transport_error(e: reqwest::Error) -> ChainError {
    if e.is_timeout() {
        ChainError::Network(format!("rpc request timed out: {e}"))
    } else if e.is_connect() {
        ChainError::Network(format!("rpc connection failed: {e}"))
    } else {
        ChainError::Network(e.to_string())
    }
}

/// Render a JSON-RPC quantity (`0x0`, no leading zeros).
pub(crate) fn hex_quantity(v: u128) -> String {
    format!("{v:#x}")
}

pub(crate) fn parse_hex_u128(s: &str) -> Result<u128, ChainError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    if stripped.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(stripped, 16)
        .map_err(|e| ChainError::Protocol(format!("invalid hex quantity {s}: {e}")))
}

pub(crate) fn parse_hex_u64(s: &str) -> Result<u64, ChainError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    if stripped.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(stripped, 16)
        .map_err(|e| ChainError::Protocol(format!("invalid hex quantity {s}: {e}")))
}
