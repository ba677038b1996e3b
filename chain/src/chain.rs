//! Chain identity and per-chain behavior.
//!
//! `Chain` is a closed sum over the two supported families. Every
//! chain-specific branch point (key derivation, explorer URLs, account
//! name rules) matches exhaustively on it, so a new family extends the
//! enum rather than duck-typing its way in.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use pangea_crypto::private_key_from_seed;
use pangea_types::{
    AntelopeChainId, AntelopeName, ChainError, ChainFamily, ChainId, EthereumAddress,
};

use crate::antelope_api::AntelopeApiClient;
use crate::ethereum_rpc::EthereumRpcClient;
use crate::key::ChainPrivateKey;
use crate::token::Token;
use crate::transaction::DEFAULT_EXPIRE_SECS;

/// What a block-explorer link should point at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExplorerTarget {
    Transaction(String),
    Account(String),
}

/// An Ethereum-family (EIP-155) chain.
#[derive(Debug)]
pub struct EthereumChain {
    name: String,
    chain_id: u64,
    explorer_url: String,
    logo_url: Option<String>,
    testnet: bool,
    native_token: OnceCell<Token>,
    client: EthereumRpcClient,
}

impl EthereumChain {
    pub fn new(
        name: &str,
        chain_id: u64,
        rpc_url: &str,
        explorer_url: &str,
        testnet: bool,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.to_string(),
            chain_id,
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
            logo_url: None,
            testnet,
            native_token: OnceCell::new(),
            client: EthereumRpcClient::new(rpc_url, http_client),
        }
    }

    pub fn with_logo_url(mut self, url: &str) -> Self {
        self.logo_url = Some(url.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The numeric EIP-155 chain id.
    pub fn id(&self) -> u64 {
        self.chain_id
    }

    pub fn chain_id(&self) -> ChainId {
        ChainId::Ethereum(self.chain_id)
    }

    pub fn is_testnet(&self) -> bool {
        self.testnet
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    pub fn client(&self) -> &EthereumRpcClient {
        &self.client
    }

    /// Bind the native token. May be called exactly once.
    pub fn set_native_token(&self, token: Token) -> Result<(), ChainError> {
        self.native_token.set(token).map_err(|_| {
            ChainError::Protocol(format!("native token for {} already set", self.name))
        })
    }

    pub fn native_token(&self) -> Result<Token, ChainError> {
        self.native_token
            .get()
            .cloned()
            .ok_or_else(|| ChainError::NativeTokenNotSet(self.name.clone()))
    }

    /// Deterministic per-chain key derivation from a wallet seed.
    pub fn create_key_from_seed(&self, seed: &str) -> pangea_crypto::PrivateKey {
        private_key_from_seed(seed, &self.chain_id())
    }

    pub fn is_valid_account_name(&self, name: &str) -> bool {
        EthereumAddress::is_valid(name)
    }

    /// `0x1234…abcd` elision for addresses; other inputs pass through.
    pub fn format_short_account_name(&self, name: &str) -> String {
        name.parse::<EthereumAddress>()
            .map(|address| address.short())
            .unwrap_or_else(|_| name.to_string())
    }

    pub fn explorer_url(&self, target: &ExplorerTarget) -> String {
        match target {
            ExplorerTarget::Transaction(hash) => {
                format!("{}/tx/{}", self.explorer_url, with_0x(hash))
            }
            ExplorerTarget::Account(account) => {
                format!("{}/address/{account}", self.explorer_url)
            }
        }
    }
}

/// An Antelope chain.
#[derive(Debug)]
pub struct AntelopeChain {
    name: String,
    chain_id: AntelopeChainId,
    explorer_url: String,
    logo_url: Option<String>,
    testnet: bool,
    native_token: OnceCell<Token>,
    client: AntelopeApiClient,
    expire_secs: u32,
}

impl AntelopeChain {
    pub fn new(
        name: &str,
        chain_id: AntelopeChainId,
        api_url: &str,
        explorer_url: &str,
        testnet: bool,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.to_string(),
            chain_id,
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
            logo_url: None,
            testnet,
            native_token: OnceCell::new(),
            client: AntelopeApiClient::new(api_url, http_client),
            expire_secs: DEFAULT_EXPIRE_SECS,
        }
    }

    pub fn with_logo_url(mut self, url: &str) -> Self {
        self.logo_url = Some(url.to_string());
        self
    }

    /// Override the default transaction expiration window.
    pub fn with_expiration(mut self, expire_secs: u32) -> Self {
        self.expire_secs = expire_secs;
        self
    }

    /// Seconds a transaction built on this chain stays valid after
    /// signing.
    pub fn expire_secs(&self) -> u32 {
        self.expire_secs
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn antelope_chain_id(&self) -> &AntelopeChainId {
        &self.chain_id
    }

    pub fn chain_id(&self) -> ChainId {
        ChainId::Antelope(self.chain_id.clone())
    }

    pub fn is_testnet(&self) -> bool {
        self.testnet
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    pub fn client(&self) -> &AntelopeApiClient {
        &self.client
    }

    /// Bind the native token. May be called exactly once.
    pub fn set_native_token(&self, token: Token) -> Result<(), ChainError> {
        self.native_token.set(token).map_err(|_| {
            ChainError::Protocol(format!("native token for {} already set", self.name))
        })
    }

    pub fn native_token(&self) -> Result<Token, ChainError> {
        self.native_token
            .get()
            .cloned()
            .ok_or_else(|| ChainError::NativeTokenNotSet(self.name.clone()))
    }

    /// Deterministic per-chain key derivation from a wallet seed.
    pub fn create_key_from_seed(&self, seed: &str) -> pangea_crypto::PrivateKey {
        private_key_from_seed(seed, &self.chain_id())
    }

    pub fn is_valid_account_name(&self, name: &str) -> bool {
        AntelopeName::is_valid(name)
    }

    /// Antelope names are short already; returned unchanged.
    pub fn format_short_account_name(&self, name: &str) -> String {
        name.to_string()
    }

    pub fn explorer_url(&self, target: &ExplorerTarget) -> String {
        match target {
            ExplorerTarget::Transaction(id) => {
                format!("{}/transaction/{id}", self.explorer_url)
            }
            ExplorerTarget::Account(account) => {
                format!("{}/account/{account}", self.explorer_url)
            }
        }
    }
}

/// A supported chain, cheap to clone and share.
#[derive(Clone)]
pub enum Chain {
    Ethereum(Arc<EthereumChain>),
    Antelope(Arc<AntelopeChain>),
}

impl Chain {
    pub fn family(&self) -> ChainFamily {
        match self {
            Chain::Ethereum(_) => ChainFamily::Ethereum,
            Chain::Antelope(_) => ChainFamily::Antelope,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Chain::Ethereum(chain) => chain.name(),
            Chain::Antelope(chain) => chain.name(),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            Chain::Ethereum(chain) => chain.chain_id(),
            Chain::Antelope(chain) => chain.chain_id(),
        }
    }

    pub fn is_testnet(&self) -> bool {
        match self {
            Chain::Ethereum(chain) => chain.is_testnet(),
            Chain::Antelope(chain) => chain.is_testnet(),
        }
    }

    pub fn logo_url(&self) -> Option<&str> {
        match self {
            Chain::Ethereum(chain) => chain.logo_url(),
            Chain::Antelope(chain) => chain.logo_url(),
        }
    }

    pub fn native_token(&self) -> Result<Token, ChainError> {
        match self {
            Chain::Ethereum(chain) => chain.native_token(),
            Chain::Antelope(chain) => chain.native_token(),
        }
    }

    pub fn create_key_from_seed(&self, seed: &str) -> ChainPrivateKey {
        match self {
            Chain::Ethereum(chain) => ChainPrivateKey::Ethereum(chain.create_key_from_seed(seed)),
            Chain::Antelope(chain) => ChainPrivateKey::Antelope(chain.create_key_from_seed(seed)),
        }
    }

    pub fn is_valid_account_name(&self, name: &str) -> bool {
        match self {
            Chain::Ethereum(chain) => chain.is_valid_account_name(name),
            Chain::Antelope(chain) => chain.is_valid_account_name(name),
        }
    }

    pub fn format_short_account_name(&self, name: &str) -> String {
        match self {
            Chain::Ethereum(chain) => chain.format_short_account_name(name),
            Chain::Antelope(chain) => chain.format_short_account_name(name),
        }
    }

    pub fn explorer_url(&self, target: &ExplorerTarget) -> String {
        match self {
            Chain::Ethereum(chain) => chain.explorer_url(target),
            Chain::Antelope(chain) => chain.explorer_url(target),
        }
    }

    /// Slot name for this chain's key in a key store.
    pub fn key_name(&self) -> String {
        self.name().to_lowercase().replace(' ', "-")
    }

    pub fn as_ethereum(&self) -> Option<&Arc<EthereumChain>> {
        match self {
            Chain::Ethereum(chain) => Some(chain),
            Chain::Antelope(_) => None,
        }
    }

    pub fn as_antelope(&self) -> Option<&Arc<AntelopeChain>> {
        match self {
            Chain::Antelope(chain) => Some(chain),
            Chain::Ethereum(_) => None,
        }
    }
}

impl PartialEq for Chain {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id() == other.chain_id()
    }
}

impl Eq for Chain {}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name())
            .field("chain_id", &self.chain_id())
            .finish()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn with_0x(hash: &str) -> String {
    if hash.starts_with("0x") {
        hash.to_string()
    } else {
        format!("0x{hash}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sepolia() -> Arc<EthereumChain> {
        Arc::new(EthereumChain::new(
            "Sepolia",
            11155111,
            "https://ethereum-sepolia-rpc.publicnode.com",
            "https://sepolia.etherscan.io",
            true,
            reqwest::Client::new(),
        ))
    }

    fn pangea() -> Arc<AntelopeChain> {
        let chain_id = "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
            .parse()
            .unwrap();
        Arc::new(AntelopeChain::new(
            "Pangea Testnet",
            chain_id,
            "https://blockchain-api-testnet.pangea.web4.world",
            "https://explorer.testnet.pangea.web4.world",
            true,
            reqwest::Client::new(),
        ))
    }

    #[test]
    fn native_token_is_set_exactly_once() {
        let chain = sepolia();
        assert!(matches!(
            chain.native_token(),
            Err(ChainError::NativeTokenNotSet(_))
        ));

        let token = Token::new(chain.chain_id(), "Ether", "ETH", 18);
        chain.set_native_token(token.clone()).unwrap();
        assert_eq!(chain.native_token().unwrap(), token);
        assert!(chain.set_native_token(token).is_err());
    }

    #[test]
    fn key_derivation_is_deterministic_and_chain_scoped() {
        let eth = sepolia();
        let ant = pangea();
        let a = eth.create_key_from_seed("correct horse battery staple");
        let b = eth.create_key_from_seed("correct horse battery staple");
        let c = ant.create_key_from_seed("correct horse battery staple");
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_ne!(a.to_bytes(), c.to_bytes());
    }

    #[test]
    fn explorer_urls() {
        let eth = sepolia();
        assert_eq!(
            eth.explorer_url(&ExplorerTarget::Transaction("abc123".to_string())),
            "https://sepolia.etherscan.io/tx/0xabc123"
        );
        assert_eq!(
            eth.explorer_url(&ExplorerTarget::Account(
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string()
            )),
            "https://sepolia.etherscan.io/address/0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );

        let ant = pangea();
        assert_eq!(
            ant.explorer_url(&ExplorerTarget::Account("alice".to_string())),
            "https://explorer.testnet.pangea.web4.world/account/alice"
        );
    }

    #[test]
    fn account_name_rules_per_family() {
        let eth = Chain::Ethereum(sepolia());
        let ant = Chain::Antelope(pangea());
        assert!(eth.is_valid_account_name("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(!eth.is_valid_account_name("alice"));
        assert!(ant.is_valid_account_name("alice"));
        assert!(!ant.is_valid_account_name("0xf39F"));

        assert_eq!(
            eth.format_short_account_name("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            "0xf39f...2266"
        );
        assert_eq!(ant.format_short_account_name("alice"), "alice");
    }

    #[test]
    fn key_names_are_slug_form() {
        assert_eq!(Chain::Ethereum(sepolia()).key_name(), "sepolia");
        assert_eq!(Chain::Antelope(pangea()).key_name(), "pangea-testnet");
    }
}
