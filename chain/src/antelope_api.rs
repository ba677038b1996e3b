//! Typed client for the Antelope chain HTTP API.
//!
//! Covers the endpoints the wallet needs: `get_info`, `get_abi`,
//! `get_currency_balance`, `get_table_rows`, and `push_transaction`.
//! Push failures carrying a known authorization-failure signature are
//! translated into [`ChainError::AuthorizationFailure`] so callers can
//! match on the variant instead of the node's message strings.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use pangea_types::{Abi, AntelopeName, ChainError};

/// Error signatures nodeos uses for missing or unsatisfied authority.
const AUTHORIZATION_FAILURE_SIGNATURES: [&str; 4] = [
    "unsatisfied_authorization",
    "missing_auth_exception",
    "tx_no_auths",
    "transaction declares authority",
];

/// Client for a single Antelope chain's HTTP API.
#[derive(Debug)]
pub struct AntelopeApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

/// Subset of `get_info` needed to build transaction headers.
#[derive(Clone, Debug, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    #[serde(default)]
    pub head_block_num: u64,
    pub head_block_time: String,
    pub last_irreversible_block_id: String,
}

#[derive(Debug, Deserialize)]
struct GetAbiResponse {
    #[serde(default)]
    abi: Option<Abi>,
}

#[derive(Debug, Deserialize)]
struct TableRowsResponse {
    #[serde(default)]
    rows: Vec<Value>,
}

impl AntelopeApiClient {
    pub fn new(base_url: &str, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ChainError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(translate_chain_error(path, status.as_u16(), &text));
        }

        response
            .json()
            .await
            .map_err(|e| ChainError::Protocol(format!("failed to parse {path} response: {e}")))
    }

    pub async fn get_info(&self) -> Result<ChainInfo, ChainError> {
        self.post("/v1/chain/get_info", json!({})).await
    }

    /// Fetch a contract's ABI; an account without one is an error.
    pub async fn get_abi(&self, account: &AntelopeName) -> Result<Abi, ChainError> {
        let response: GetAbiResponse = self
            .post("/v1/chain/get_abi", json!({ "account_name": account }))
            .await?;
        response
            .abi
            .ok_or_else(|| ChainError::Protocol(format!("account {account} has no abi")))
    }

    /// Balance rows as quantity strings; empty when the account holds none.
    pub async fn get_currency_balance(
        &self,
        code: &AntelopeName,
        account: &AntelopeName,
        symbol: &str,
    ) -> Result<Vec<String>, ChainError> {
        self.post(
            "/v1/chain/get_currency_balance",
            json!({ "code": code, "account": account, "symbol": symbol }),
        )
        .await
    }

    pub async fn get_table_rows(
        &self,
        code: &AntelopeName,
        scope: &str,
        table: &str,
        limit: u32,
    ) -> Result<Vec<Value>, ChainError> {
        let response: TableRowsResponse = self
            .post(
                "/v1/chain/get_table_rows",
                json!({
                    "json": true,
                    "code": code,
                    "scope": scope,
                    "table": table,
                    "limit": limit,
                }),
            )
            .await?;
        Ok(response.rows)
    }

    /// Submit a signed, packed transaction.
    pub async fn push_transaction(
        &self,
        signatures: &[String],
        packed: &[u8],
    ) -> Result<Value, ChainError> {
        self.post(
            "/v1/chain/push_transaction",
            json!({
                "signatures": signatures,
                "compression": 0,
                "packed_context_free_data": "",
                "packed_trx": hex::encode(packed),
            }),
        )
        .await
    }
}

fn map_transport_error(e: reqwest::Error) -> ChainError {
    if e.is_timeout() {
        ChainError::Network(format!("chain api request timed out: {e}"))
    } else if e.is_connect() {
        ChainError::Network(format!("chain api connection failed: {e}"))
    } else {
        ChainError::Network(e.to_string())
    }
}

/// Translate a non-2xx chain API response into a typed error.
fn translate_chain_error(path: &str, status: u16, body: &str) -> ChainError {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return ChainError::Network(format!("{path} HTTP status {status}"));
    };
    let error = parsed.get("error").cloned().unwrap_or(Value::Null);

    let mut messages = Vec::new();
    if let Some(details) = error.get("details").and_then(Value::as_array) {
        for detail in details {
            if let Some(message) = detail.get("message").and_then(Value::as_str) {
                messages.push(message.to_string());
            }
        }
    }
    if let Some(what) = error.get("what").and_then(Value::as_str) {
        messages.push(what.to_string());
    }
    if let Some(name) = error.get("name").and_then(Value::as_str) {
        messages.push(name.to_string());
    }

    let summary = messages
        .first()
        .cloned()
        .unwrap_or_else(|| format!("HTTP status {status}"));

    let is_authorization_failure = messages.iter().any(|m| {
        AUTHORIZATION_FAILURE_SIGNATURES
            .iter()
            .any(|sig| m.contains(sig))
    });
    if is_authorization_failure {
        ChainError::AuthorizationFailure(summary)
    } else {
        ChainError::Protocol(format!("{path} failed: {summary}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_failure_is_recognized() {
        let body = r#"{
            "code": 500,
            "error": {
                "code": 3090003,
                "name": "unsatisfied_authorization",
                "what": "Provided keys, permissions, and delays do not satisfy declared authorizations",
                "details": [
                    { "message": "transaction declares authority '{\"actor\":\"alice\",\"permission\":\"active\"}'" }
                ]
            }
        }"#;
        let err = translate_chain_error("/v1/chain/push_transaction", 500, body);
        assert!(matches!(err, ChainError::AuthorizationFailure(_)));
    }

    #[test]
    fn other_chain_errors_stay_protocol_errors() {
        let body = r#"{
            "code": 500,
            "error": {
                "code": 3050003,
                "name": "eosio_assert_message_exception",
                "what": "eosio_assert_message assertion failure",
                "details": [ { "message": "assertion failure with message: overdrawn balance" } ]
            }
        }"#;
        let err = translate_chain_error("/v1/chain/push_transaction", 500, body);
        match err {
            ChainError::Protocol(message) => assert!(message.contains("overdrawn balance")),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_maps_to_network_error() {
        let err = translate_chain_error("/v1/chain/get_info", 502, "<html>bad gateway</html>");
        assert!(matches!(err, ChainError::Network(_)));
    }
}
