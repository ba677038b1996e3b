//! The set of chains the wallet knows about.
//!
//! Built once from [`WalletConfig`] at startup. Every registered chain
//! gets its native token bound and shares one HTTP client configured
//! with the wallet's timeouts. Lookups never construct chains on the
//! fly; an id outside the registered set is
//! [`ChainError::UnsupportedChain`].

use std::sync::Arc;
use std::time::Duration;

use pangea_types::{AntelopeChainId, ChainError, ChainId};

use crate::chain::{AntelopeChain, Chain, EthereumChain};
use crate::config::{Network, WalletConfig};
use crate::token::Token;

const PANGEA_CHAIN_ID: &str = "66d565f72ac08f8321a3036e2d92eea7f96ddc90599bdbfc2d025d810c74c248";
const PANGEA_TESTNET_CHAIN_ID: &str =
    "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f";

/// All chains registered for the configured network.
pub struct ChainRegistry {
    chains: Vec<Chain>,
}

impl ChainRegistry {
    /// Build the registry for `config.network`, applying the config's
    /// URL and chain-id overrides.
    pub fn from_config(config: &WalletConfig) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(config.http_connect_timeout_secs))
            .build()
            .map_err(|e| ChainError::Config(e.to_string()))?;

        let chains = match config.network {
            Network::Mainnet => mainnet_chains(config, &client)?,
            Network::Testnet => testnet_chains(config, &client)?,
        };
        tracing::info!(
            network = %config.network,
            chains = chains.len(),
            "chain registry built"
        );
        Ok(Self { chains })
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// The native token of every registered chain.
    pub fn tokens(&self) -> Vec<Token> {
        // Construction binds a native token to every chain.
        self.chains
            .iter()
            .filter_map(|chain| chain.native_token().ok())
            .collect()
    }

    pub fn chain(&self, id: &ChainId) -> Result<&Chain, ChainError> {
        self.chains
            .iter()
            .find(|chain| chain.chain_id() == *id)
            .ok_or_else(|| ChainError::UnsupportedChain(id.to_string()))
    }

    /// Look up by CAIP-2 namespace and reference, e.g. `eip155` / `137`.
    ///
    /// Antelope references match both the 32-character truncated form
    /// CAIP-2 uses and the full 64-character checksum.
    pub fn chain_for_caip(&self, namespace: &str, reference: &str) -> Result<&Chain, ChainError> {
        let miss = || ChainError::UnsupportedChain(format!("{namespace}:{reference}"));
        match namespace {
            "eip155" => {
                let id: u64 = reference.parse().map_err(|_| miss())?;
                self.chain(&ChainId::Ethereum(id))
            }
            "antelope" => self
                .chains
                .iter()
                .find(|chain| match chain.chain_id() {
                    ChainId::Antelope(id) => {
                        id.short_hex() == reference || id.to_string() == reference
                    }
                    ChainId::Ethereum(_) => false,
                })
                .ok_or_else(miss),
            _ => Err(miss()),
        }
    }

    pub fn antelope_chain(&self, id: &AntelopeChainId) -> Result<Arc<AntelopeChain>, ChainError> {
        self.chains
            .iter()
            .filter_map(Chain::as_antelope)
            .find(|chain| chain.antelope_chain_id() == id)
            .cloned()
            .ok_or_else(|| ChainError::UnsupportedChain(id.to_string()))
    }

    pub fn token_for_chain(&self, id: &ChainId) -> Result<Token, ChainError> {
        self.chain(id)?.native_token()
    }
}

fn mainnet_chains(
    config: &WalletConfig,
    client: &reqwest::Client,
) -> Result<Vec<Chain>, ChainError> {
    let ethereum = ethereum_chain(
        config,
        client,
        "ethereum",
        "Ethereum",
        1,
        "https://ethereum-rpc.publicnode.com",
        "https://etherscan.io",
        false,
        ("Ether", "ETH"),
        Some("https://cryptologos.cc/logos/ethereum-eth-logo.png"),
    )?;
    let polygon = ethereum_chain(
        config,
        client,
        "polygon",
        "Polygon",
        137,
        "https://polygon-bor-rpc.publicnode.com",
        "https://polygonscan.com",
        false,
        ("Polygon", "POL"),
        Some("https://cryptologos.cc/logos/polygon-matic-logo.png"),
    )?;
    let pangea = pangea_chain(
        config,
        client,
        "pangea",
        "Pangea",
        PANGEA_CHAIN_ID,
        "https://blockchain-api.pangea.web4.world",
        "https://explorer.pangea.web4.world",
        false,
    )?;
    Ok(vec![ethereum, polygon, pangea])
}

fn testnet_chains(
    config: &WalletConfig,
    client: &reqwest::Client,
) -> Result<Vec<Chain>, ChainError> {
    let sepolia = ethereum_chain(
        config,
        client,
        "sepolia",
        "Sepolia",
        11155111,
        "https://ethereum-sepolia-rpc.publicnode.com",
        "https://sepolia.etherscan.io",
        true,
        ("Ether", "ETH"),
        Some("https://cryptologos.cc/logos/ethereum-eth-logo.png"),
    )?;
    let amoy = ethereum_chain(
        config,
        client,
        "polygon-amoy",
        "Polygon Amoy",
        80002,
        "https://polygon-amoy-bor-rpc.publicnode.com",
        "https://amoy.polygonscan.com",
        true,
        ("Polygon", "POL"),
        Some("https://cryptologos.cc/logos/polygon-matic-logo.png"),
    )?;
    let pangea = pangea_chain(
        config,
        client,
        "pangea-testnet",
        "Pangea Testnet",
        PANGEA_TESTNET_CHAIN_ID,
        "https://blockchain-api-testnet.pangea.web4.world",
        "https://explorer.testnet.pangea.web4.world",
        true,
    )?;
    Ok(vec![sepolia, amoy, pangea])
}

#[allow(clippy::too_many_arguments)]
fn ethereum_chain(
    config: &WalletConfig,
    client: &reqwest::Client,
    key: &str,
    name: &str,
    id: u64,
    rpc_url: &str,
    explorer_url: &str,
    testnet: bool,
    token: (&str, &str),
    logo_url: Option<&str>,
) -> Result<Chain, ChainError> {
    let mut chain = EthereumChain::new(
        name,
        id,
        &config.rpc_url(key, rpc_url),
        &config.explorer_url(key, explorer_url),
        testnet,
        client.clone(),
    );
    if let Some(url) = logo_url {
        chain = chain.with_logo_url(url);
    }
    let chain = Arc::new(chain);
    let (token_name, token_symbol) = token;
    let mut native = Token::new(chain.chain_id(), token_name, token_symbol, 18);
    if let Some(url) = logo_url {
        native = native.with_logo_url(url);
    }
    chain.set_native_token(native)?;
    Ok(Chain::Ethereum(chain))
}

#[allow(clippy::too_many_arguments)]
fn pangea_chain(
    config: &WalletConfig,
    client: &reqwest::Client,
    key: &str,
    name: &str,
    default_chain_id: &str,
    api_url: &str,
    explorer_url: &str,
    testnet: bool,
) -> Result<Chain, ChainError> {
    // Local nets swap in their own chain id without touching the rest
    // of the Pangea settings.
    let chain_id: AntelopeChainId = config
        .antelope_chain_id
        .as_deref()
        .unwrap_or(default_chain_id)
        .parse()?;
    let chain = Arc::new(
        AntelopeChain::new(
            name,
            chain_id,
            &config.rpc_url(key, api_url),
            &config.explorer_url(key, explorer_url),
            testnet,
            client.clone(),
        )
        .with_expiration(config.transaction_expire_secs),
    );
    let native = Token::new(chain.chain_id(), "LEOS", "LEOS", 6)
        .with_contract("eosio.token".parse()?)
        .with_vesting("vesting.tmy".parse()?)
        .with_staking();
    chain.set_native_token(native)?;
    Ok(Chain::Antelope(chain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testnet_registry() -> ChainRegistry {
        ChainRegistry::from_config(&WalletConfig::default()).unwrap()
    }

    fn mainnet_registry() -> ChainRegistry {
        let config = WalletConfig {
            network: Network::Mainnet,
            ..WalletConfig::default()
        };
        ChainRegistry::from_config(&config).unwrap()
    }

    #[test]
    fn testnet_set_has_three_chains_with_stable_keys() {
        let registry = testnet_registry();
        let keys: Vec<String> = registry.chains().iter().map(Chain::key_name).collect();
        assert_eq!(keys, ["sepolia", "polygon-amoy", "pangea-testnet"]);
        assert!(registry.chains().iter().all(Chain::is_testnet));
    }

    #[test]
    fn mainnet_set_has_three_chains() {
        let registry = mainnet_registry();
        let keys: Vec<String> = registry.chains().iter().map(Chain::key_name).collect();
        assert_eq!(keys, ["ethereum", "polygon", "pangea"]);
        assert!(registry.chains().iter().all(|c| !c.is_testnet()));
    }

    #[test]
    fn every_chain_carries_its_native_token() {
        let registry = testnet_registry();
        let tokens = registry.tokens();
        assert_eq!(tokens.len(), 3);
        let symbols: Vec<&str> = tokens.iter().map(Token::symbol).collect();
        assert_eq!(symbols, ["ETH", "POL", "LEOS"]);
        assert!(tokens[2].is_vestable());
        assert!(tokens[2].is_stakeable());
    }

    #[test]
    fn lookups_hit_registered_chains_only() {
        let registry = testnet_registry();
        let sepolia = registry.chain(&ChainId::Ethereum(11155111)).unwrap();
        assert_eq!(sepolia.name(), "Sepolia");

        assert!(matches!(
            registry.chain(&ChainId::Ethereum(1)),
            Err(ChainError::UnsupportedChain(_))
        ));
        assert!(matches!(
            registry.token_for_chain(&ChainId::Ethereum(1)),
            Err(ChainError::UnsupportedChain(_))
        ));
    }

    #[test]
    fn caip_lookup_covers_both_namespaces() {
        let registry = testnet_registry();
        let sepolia = registry.chain_for_caip("eip155", "11155111").unwrap();
        assert_eq!(sepolia.name(), "Sepolia");

        let short = &PANGEA_TESTNET_CHAIN_ID[..32];
        let pangea = registry.chain_for_caip("antelope", short).unwrap();
        assert_eq!(pangea.name(), "Pangea Testnet");
        let pangea = registry
            .chain_for_caip("antelope", PANGEA_TESTNET_CHAIN_ID)
            .unwrap();
        assert_eq!(pangea.name(), "Pangea Testnet");

        assert!(registry.chain_for_caip("cosmos", "cosmoshub-4").is_err());
        assert!(registry.chain_for_caip("eip155", "not-a-number").is_err());
    }

    #[test]
    fn expiration_window_flows_from_config() {
        let config = WalletConfig {
            transaction_expire_secs: 300,
            ..WalletConfig::default()
        };
        let registry = ChainRegistry::from_config(&config).unwrap();
        let id: AntelopeChainId = PANGEA_TESTNET_CHAIN_ID.parse().unwrap();
        let pangea = registry.antelope_chain(&id).unwrap();
        assert_eq!(pangea.expire_secs(), 300);
    }

    #[test]
    fn antelope_lookup_returns_the_chain_handle() {
        let registry = testnet_registry();
        let id: AntelopeChainId = PANGEA_TESTNET_CHAIN_ID.parse().unwrap();
        let chain = registry.antelope_chain(&id).unwrap();
        assert_eq!(chain.name(), "Pangea Testnet");

        let other: AntelopeChainId = PANGEA_CHAIN_ID.parse().unwrap();
        assert!(matches!(
            registry.antelope_chain(&other),
            Err(ChainError::UnsupportedChain(_))
        ));
    }

    #[test]
    fn config_overrides_rewrite_urls_and_chain_id() {
        let mut config = WalletConfig::default();
        config
            .rpc_urls
            .insert("sepolia".to_string(), "http://localhost:8545".to_string());
        config.antelope_chain_id = Some(
            "0000000000000000000000000000000000000000000000000000000000000042".to_string(),
        );
        let registry = ChainRegistry::from_config(&config).unwrap();

        let sepolia = registry.chain(&ChainId::Ethereum(11155111)).unwrap();
        let ethereum = sepolia.as_ethereum().unwrap();
        assert_eq!(ethereum.client().url(), "http://localhost:8545");

        let overridden: AntelopeChainId =
            "0000000000000000000000000000000000000000000000000000000000000042"
                .parse()
                .unwrap();
        assert!(registry.antelope_chain(&overridden).is_ok());
    }
}
