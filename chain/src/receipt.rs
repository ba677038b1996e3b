//! Broadcast results.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::asset::Asset;
use crate::chain::{Chain, ExplorerTarget};

/// The immutable result of a broadcast transaction.
///
/// Carries the chain-native response verbatim in [`raw`](Self::raw) so
/// callers can relay it (WalletConnect responds with it unmodified)
/// without this type having to model every node's response shape.
#[derive(Clone, Debug)]
pub struct TransactionReceipt {
    chain: Chain,
    id: String,
    fee: Asset,
    timestamp: DateTime<Utc>,
    raw: Value,
    signatures: Vec<String>,
}

impl TransactionReceipt {
    pub fn new(chain: Chain, id: String, fee: Asset, raw: Value) -> Self {
        Self {
            chain,
            id,
            fee,
            timestamp: Utc::now(),
            raw,
            signatures: Vec::new(),
        }
    }

    /// Attach the signatures the transaction was broadcast with.
    ///
    /// Antelope callback payloads echo the first signature back to the
    /// requesting origin; Ethereum receipts leave this empty.
    pub fn with_signatures(mut self, signatures: Vec<String>) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The transaction id: `0x`-prefixed hash for Ethereum, hex id for
    /// Antelope.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The fee charged, as known at broadcast time.
    ///
    /// For Ethereum this is the signed gas limit times the gas price, an
    /// upper bound on what the chain will take. Antelope chains charge no
    /// per-transaction fee, so the value is zero there.
    pub fn fee(&self) -> &Asset {
        &self.fee
    }

    /// When the transaction was accepted by the local broadcaster.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Block-explorer link for the transaction.
    pub fn explorer_url(&self) -> String {
        self.chain
            .explorer_url(&ExplorerTarget::Transaction(self.id.clone()))
    }

    /// The chain's own response body, verbatim.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn first_signature(&self) -> Option<&str> {
        self.signatures.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::EthereumChain;
    use crate::token::Token;
    use std::sync::Arc;

    #[test]
    fn receipt_exposes_explorer_link() {
        let chain = Chain::Ethereum(Arc::new(EthereumChain::new(
            "Sepolia",
            11155111,
            "https://ethereum-sepolia-rpc.publicnode.com",
            "https://sepolia.etherscan.io",
            true,
            reqwest::Client::new(),
        )));
        let token = Token::new(chain.chain_id(), "Ether", "ETH", 18);
        let receipt = TransactionReceipt::new(
            chain,
            "0xabc123".to_string(),
            Asset::zero(token),
            serde_json::json!({"status": "ok"}),
        );
        assert_eq!(
            receipt.explorer_url(),
            "https://sepolia.etherscan.io/tx/0xabc123"
        );
        assert_eq!(receipt.raw()["status"], "ok");
        assert!(receipt.fee().is_zero());
        assert!(receipt.first_signature().is_none());
    }

    #[test]
    fn signatures_ride_along_when_attached() {
        let chain = Chain::Ethereum(Arc::new(EthereumChain::new(
            "Sepolia",
            11155111,
            "https://ethereum-sepolia-rpc.publicnode.com",
            "https://sepolia.etherscan.io",
            true,
            reqwest::Client::new(),
        )));
        let token = Token::new(chain.chain_id(), "Ether", "ETH", 18);
        let receipt = TransactionReceipt::new(
            chain,
            "deadbeef".to_string(),
            Asset::zero(token),
            serde_json::json!({}),
        )
        .with_signatures(vec!["SIG_K1_abc".to_string()]);
        assert_eq!(receipt.first_signature(), Some("SIG_K1_abc"));
    }
}
