//! On-chain accounts and the keys that control them.
//!
//! A [`ChainAccount`] names an account on one chain and optionally owns
//! the private key controlling it. Key-less accounts are view-only:
//! balances and DIDs work, signing reports
//! [`ChainError::KeyNotFound`].

use std::sync::Arc;

use pangea_crypto::{ethereum_address, PublicKey};
use pangea_types::{AntelopeName, ChainError, Did, EthereumAddress};

use crate::asset::Asset;
use crate::chain::{AntelopeChain, Chain, EthereumChain};
use crate::key::ChainPrivateKey;
use crate::receipt::TransactionReceipt;
use crate::token::Token;
use crate::transaction::{ChainTransaction, SignedTransaction};

/// An account on an Ethereum chain: an address, optionally with its key.
#[derive(Clone, Debug)]
pub struct EthereumAccount {
    chain: Arc<EthereumChain>,
    address: EthereumAddress,
    key: Option<ChainPrivateKey>,
}

impl EthereumAccount {
    pub fn new(
        chain: Arc<EthereumChain>,
        address: EthereumAddress,
        key: Option<ChainPrivateKey>,
    ) -> Self {
        Self {
            chain,
            address,
            key,
        }
    }

    pub fn chain(&self) -> &Arc<EthereumChain> {
        &self.chain
    }

    pub fn address(&self) -> &EthereumAddress {
        &self.address
    }

    pub fn did(&self) -> Did {
        Did::ethereum(self.chain.id(), &self.address)
    }
}

/// An account on an Antelope chain: a name, optionally with its key.
#[derive(Clone, Debug)]
pub struct AntelopeAccount {
    chain: Arc<AntelopeChain>,
    name: AntelopeName,
    key: Option<ChainPrivateKey>,
}

impl AntelopeAccount {
    pub fn new(
        chain: Arc<AntelopeChain>,
        name: AntelopeName,
        key: Option<ChainPrivateKey>,
    ) -> Self {
        Self { chain, name, key }
    }

    pub fn chain(&self) -> &Arc<AntelopeChain> {
        &self.chain
    }

    pub fn account_name(&self) -> AntelopeName {
        self.name
    }

    pub fn did(&self) -> Did {
        Did::antelope(self.chain.antelope_chain_id(), &self.name)
    }
}

/// An account on any supported chain.
#[derive(Clone, Debug)]
pub enum ChainAccount {
    Ethereum(EthereumAccount),
    Antelope(AntelopeAccount),
}

impl ChainAccount {
    /// A view-only account from its on-chain name, validated per family.
    pub fn from_account(chain: Chain, account: &str) -> Result<Self, ChainError> {
        match chain {
            Chain::Ethereum(chain) => {
                let address: EthereumAddress = account.parse()?;
                Ok(ChainAccount::Ethereum(EthereumAccount::new(
                    chain, address, None,
                )))
            }
            Chain::Antelope(chain) => {
                let name: AntelopeName = account.parse()?;
                Ok(ChainAccount::Antelope(AntelopeAccount::new(
                    chain, name, None,
                )))
            }
        }
    }

    /// A view-only account derived from a public key.
    ///
    /// Ethereum addresses are a hash of the key; Antelope names carry no
    /// such relationship and must come from a lookup instead.
    pub fn from_public_key(chain: Chain, key: &PublicKey) -> Result<Self, ChainError> {
        match chain {
            Chain::Ethereum(chain) => {
                let address = ethereum_address(key);
                Ok(ChainAccount::Ethereum(EthereumAccount::new(
                    chain, address, None,
                )))
            }
            Chain::Antelope(_) => Err(ChainError::Protocol(
                "antelope account names cannot be derived from a public key".to_string(),
            )),
        }
    }

    /// An account that owns its signing key.
    ///
    /// The key's family must match the chain's. The name is taken at the
    /// caller's word: whether the key actually controls the account is
    /// only proven when the chain accepts a signature.
    pub fn from_account_and_key(
        chain: Chain,
        account: &str,
        key: ChainPrivateKey,
    ) -> Result<Self, ChainError> {
        if key.family() != chain.family() {
            return Err(ChainError::Protocol(format!(
                "{} key cannot control an account on {}",
                key.family(),
                chain.name()
            )));
        }
        match chain {
            Chain::Ethereum(chain) => {
                let address: EthereumAddress = account.parse()?;
                Ok(ChainAccount::Ethereum(EthereumAccount::new(
                    chain,
                    address,
                    Some(key),
                )))
            }
            Chain::Antelope(chain) => {
                let name: AntelopeName = account.parse()?;
                Ok(ChainAccount::Antelope(AntelopeAccount::new(
                    chain,
                    name,
                    Some(key),
                )))
            }
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            ChainAccount::Ethereum(account) => Chain::Ethereum(account.chain.clone()),
            ChainAccount::Antelope(account) => Chain::Antelope(account.chain.clone()),
        }
    }

    /// The account name in its chain's canonical form.
    pub fn name(&self) -> String {
        match self {
            ChainAccount::Ethereum(account) => account.address.checksummed(),
            ChainAccount::Antelope(account) => account.name.to_string(),
        }
    }

    pub fn did(&self) -> Did {
        match self {
            ChainAccount::Ethereum(account) => account.did(),
            ChainAccount::Antelope(account) => account.did(),
        }
    }

    /// Whether `name` is well-formed for this account's chain.
    pub fn is_valid_name(&self, name: &str) -> bool {
        self.chain().is_valid_account_name(name)
    }

    pub fn has_key(&self) -> bool {
        self.key().is_some()
    }

    pub fn key(&self) -> Option<&ChainPrivateKey> {
        match self {
            ChainAccount::Ethereum(account) => account.key.as_ref(),
            ChainAccount::Antelope(account) => account.key.as_ref(),
        }
    }

    /// The account's balance of `token`, or of the chain's native token
    /// when none is given.
    pub async fn balance(&self, token: Option<&Token>) -> Result<Asset, ChainError> {
        let chain = self.chain();
        let name = self.name();
        match token {
            Some(token) => token.balance(&chain, Some(&name)).await,
            None => chain.native_token()?.balance(&chain, Some(&name)).await,
        }
    }

    fn signing_key(&self, transaction: &ChainTransaction) -> Result<&ChainPrivateKey, ChainError> {
        let own = self.chain();
        let target = transaction.chain();
        if own != target {
            return Err(ChainError::ChainIdMismatch {
                expected: own.chain_id().to_string(),
                found: target.chain_id().to_string(),
            });
        }
        self.key().ok_or_else(|| ChainError::KeyNotFound {
            account: self.name(),
            chain: own.name().to_string(),
        })
    }

    /// Sign `transaction` with the owned key.
    pub async fn sign_transaction(
        &self,
        transaction: &ChainTransaction,
    ) -> Result<SignedTransaction, ChainError> {
        let key = self.signing_key(transaction)?;
        transaction.sign(key).await
    }

    /// Sign and broadcast `transaction` with the owned key.
    pub async fn send_transaction(
        &self,
        transaction: &ChainTransaction,
    ) -> Result<TransactionReceipt, ChainError> {
        let key = self.signing_key(transaction)?;
        transaction.send(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use crate::transaction::AntelopeTransaction;
    use pangea_types::ChainFamily;

    fn ethereum() -> Chain {
        let chain = Arc::new(EthereumChain::new(
            "Ethereum",
            1,
            "https://ethereum-rpc.publicnode.com",
            "https://etherscan.io",
            false,
            reqwest::Client::new(),
        ));
        chain
            .set_native_token(Token::new(chain.chain_id(), "Ether", "ETH", 18))
            .unwrap();
        Chain::Ethereum(chain)
    }

    fn pangea() -> Chain {
        let chain_id = "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
            .parse()
            .unwrap();
        let chain = Arc::new(AntelopeChain::new(
            "Pangea Testnet",
            chain_id,
            "https://blockchain-api-testnet.pangea.web4.world",
            "https://explorer.testnet.pangea.web4.world",
            true,
            reqwest::Client::new(),
        ));
        chain
            .set_native_token(
                Token::new(chain.chain_id(), "LEOS", "LEOS", 6)
                    .with_contract("eosio.token".parse().unwrap()),
            )
            .unwrap();
        Chain::Antelope(chain)
    }

    #[test]
    fn account_names_validate_per_family() {
        let account =
            ChainAccount::from_account(ethereum(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
                .unwrap();
        assert_eq!(account.name(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert!(ChainAccount::from_account(ethereum(), "not-an-address").is_err());

        let account = ChainAccount::from_account(pangea(), "coinsale.tmy").unwrap();
        assert_eq!(account.name(), "coinsale.tmy");
        assert!(ChainAccount::from_account(pangea(), "NotAName").is_err());
    }

    #[test]
    fn public_key_derivation_is_ethereum_only() {
        let key = ChainPrivateKey::from_seed("account tests", &ethereum().chain_id());
        let account = ChainAccount::from_public_key(ethereum(), &key.public_key()).unwrap();
        assert!(account.name().starts_with("0x"));
        assert!(!account.has_key());

        let key = ChainPrivateKey::from_seed("account tests", &pangea().chain_id());
        assert!(matches!(
            ChainAccount::from_public_key(pangea(), &key.public_key()),
            Err(ChainError::Protocol(_))
        ));
    }

    #[test]
    fn key_family_must_match_the_chain() {
        let ethereum_key = ChainPrivateKey::from_seed("account tests", &ethereum().chain_id());
        assert_eq!(ethereum_key.family(), ChainFamily::Ethereum);
        assert!(matches!(
            ChainAccount::from_account_and_key(pangea(), "coinsale.tmy", ethereum_key),
            Err(ChainError::Protocol(_))
        ));
    }

    #[test]
    fn dids_follow_the_chain_method() {
        let account =
            ChainAccount::from_account(ethereum(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
                .unwrap();
        assert_eq!(
            account.did().as_str(),
            "did:ethr:0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );

        let account = ChainAccount::from_account(pangea(), "coinsale.tmy").unwrap();
        assert!(account.did().as_str().starts_with("did:antelope:8a34ec7d"));
    }

    #[test]
    fn name_validation_uses_the_owning_chain() {
        let account = ChainAccount::from_account(pangea(), "coinsale.tmy").unwrap();
        assert!(account.is_valid_name("eosio.token"));
        assert!(!account.is_valid_name("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    }

    #[tokio::test]
    async fn signing_without_a_key_reports_key_not_found() {
        let chain = pangea();
        let account = ChainAccount::from_account(chain.clone(), "coinsale.tmy").unwrap();
        let antelope = chain.as_antelope().unwrap();
        let tx = ChainTransaction::Antelope(AntelopeTransaction::new(antelope.clone(), vec![]));

        let err = account.sign_transaction(&tx).await.unwrap_err();
        match err {
            ChainError::KeyNotFound { account, chain } => {
                assert_eq!(account, "coinsale.tmy");
                assert_eq!(chain, "Pangea Testnet");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn signing_for_another_chain_is_refused() {
        let chain = pangea();
        let key = ChainPrivateKey::from_seed("account tests", &chain.chain_id());
        let account =
            ChainAccount::from_account_and_key(chain, "coinsale.tmy", key).unwrap();

        let other = ethereum();
        let ethereum_chain = other.as_ethereum().unwrap().clone();
        let amount = Asset::new(other.native_token().unwrap(), 1.into());
        let tx = ChainTransaction::Ethereum(
            crate::transaction::EthereumTransaction::transfer(
                ethereum_chain,
                "0x3535353535353535353535353535353535353535".parse().unwrap(),
                &amount,
            )
            .unwrap(),
        );

        assert!(matches!(
            account.sign_transaction(&tx).await,
            Err(ChainError::ChainIdMismatch { .. })
        ));
    }
}
