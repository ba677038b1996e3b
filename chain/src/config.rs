//! Wallet configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use pangea_types::ChainError;

/// Which set of chains the wallet connects to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Configuration for the wallet core.
///
/// Can be loaded from a TOML file via [`WalletConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). The chain registry is built
/// from this once at startup; there are no module-level singletons.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Which network's chain set to register.
    #[serde(default = "default_network")]
    pub network: Network,

    /// Per-chain RPC/API URL overrides, keyed by lowercase chain name
    /// (e.g. `ethereum`, `sepolia`, `pangea`).
    #[serde(default)]
    pub rpc_urls: HashMap<String, String>,

    /// Per-chain block-explorer URL overrides, keyed like [`rpc_urls`].
    ///
    /// [`rpc_urls`]: WalletConfig::rpc_urls
    #[serde(default)]
    pub explorer_urls: HashMap<String, String>,

    /// Override for the Antelope chain id (hex checksum), for local nets.
    #[serde(default)]
    pub antelope_chain_id: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// HTTP connection timeout in seconds.
    #[serde(default = "default_http_connect_timeout")]
    pub http_connect_timeout_secs: u64,

    /// Default transaction expiration window in seconds (Antelope).
    #[serde(default = "default_expire_secs")]
    pub transaction_expire_secs: u32,

    /// Base URL of the USD price endpoint (coingecko-compatible).
    #[serde(default = "default_price_oracle_url")]
    pub price_oracle_url: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> Network {
    Network::Testnet
}

fn default_http_timeout() -> u64 {
    30
}

fn default_http_connect_timeout() -> u64 {
    10
}

fn default_expire_secs() -> u32 {
    120
}

fn default_price_oracle_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ChainError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ChainError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ChainError> {
        toml::from_str(s).map_err(|e| ChainError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("WalletConfig is always serializable to TOML")
    }

    /// RPC/API URL for `chain_key`, falling back to `default_url`.
    pub fn rpc_url(&self, chain_key: &str, default_url: &str) -> String {
        self.rpc_urls
            .get(chain_key)
            .cloned()
            .unwrap_or_else(|| default_url.to_string())
    }

    /// Explorer URL for `chain_key`, falling back to `default_url`.
    pub fn explorer_url(&self, chain_key: &str, default_url: &str) -> String {
        self.explorer_urls
            .get(chain_key)
            .cloned()
            .unwrap_or_else(|| default_url.to_string())
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            rpc_urls: HashMap::new(),
            explorer_urls: HashMap::new(),
            antelope_chain_id: None,
            http_timeout_secs: default_http_timeout(),
            http_connect_timeout_secs: default_http_connect_timeout(),
            transaction_expire_secs: default_expire_secs(),
            price_oracle_url: default_price_oracle_url(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
