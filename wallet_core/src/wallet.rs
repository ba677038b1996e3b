//! The wallet facade the host application embeds.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use pangea_chain::{Asset, ChainAccount, ChainRegistry, PriceOracle};
use pangea_store::{AssetStore, KeyStore, StoredAsset};
use pangea_types::{ChainError, ChainId};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Store(#[from] pangea_store::StoreError),
}

/// Keys, accounts, and cached balances over every registered chain.
///
/// One instance per running wallet. All dependencies are passed in;
/// the facade owns no global state. Chain I/O happens only in
/// [`refresh_balance`](Self::refresh_balance); everything else works
/// against the registry and the stores.
pub struct Wallet {
    registry: Arc<ChainRegistry>,
    keys: Arc<dyn KeyStore>,
    assets: Arc<dyn AssetStore>,
    oracle: Arc<dyn PriceOracle>,
}

impl Wallet {
    pub fn new(
        registry: Arc<ChainRegistry>,
        keys: Arc<dyn KeyStore>,
        assets: Arc<dyn AssetStore>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Self {
        Self {
            registry,
            keys,
            assets,
            oracle,
        }
    }

    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    /// Derive and store one signing key per registered chain.
    ///
    /// Derivation is deterministic per chain, so re-running with the
    /// same seed recovers the same keys — the basis of wallet recovery
    /// without per-chain secret storage. Returns the key slot names.
    pub fn provision_keys_from_seed(&self, seed: &str) -> Result<Vec<String>, WalletError> {
        let mut slots = Vec::new();
        for chain in self.registry.chains() {
            let slot = chain.key_name();
            let key = chain.create_key_from_seed(seed);
            self.keys.emplace(&slot, key)?;
            slots.push(slot);
        }
        tracing::info!(keys = slots.len(), "provisioned chain keys from seed");
        Ok(slots)
    }

    /// Whether a key is stored for `chain_id`.
    pub fn has_key(&self, chain_id: &ChainId) -> Result<bool, WalletError> {
        let chain = self.registry.chain(chain_id)?;
        Ok(self.keys.find_by_name(&chain.key_name())?.is_some())
    }

    /// The named account on `chain_id`, bound to the stored signing
    /// key.
    pub fn account(&self, chain_id: &ChainId, name: &str) -> Result<ChainAccount, WalletError> {
        let chain = self.registry.chain(chain_id)?.clone();
        let key = self
            .keys
            .find_by_name(&chain.key_name())?
            .ok_or_else(|| ChainError::KeyNotFound {
                account: name.to_string(),
                chain: chain.name().to_string(),
            })?;
        Ok(ChainAccount::from_account_and_key(chain, name, key)?)
    }

    /// The Ethereum-family account controlled by the stored key, with
    /// the address derived from the key itself.
    pub fn ethereum_account(&self, chain_id: &ChainId) -> Result<ChainAccount, WalletError> {
        let chain = self.registry.chain(chain_id)?.clone();
        let key = self
            .keys
            .find_by_name(&chain.key_name())?
            .ok_or_else(|| ChainError::KeyNotFound {
                account: "wallet".to_string(),
                chain: chain.name().to_string(),
            })?;
        let address = key.ethereum_address()?.checksummed();
        Ok(ChainAccount::from_account_and_key(chain, &address, key)?)
    }

    /// Query the chain for `account`'s native-token balance, value it
    /// in USD, and upsert the cached row. Returns the fresh balance.
    pub async fn refresh_balance(
        &self,
        chain_id: &ChainId,
        account: &str,
    ) -> Result<Asset, WalletError> {
        let chain = self.registry.chain(chain_id)?;
        let token = chain.native_token()?;
        let balance = token.balance(chain, Some(account)).await?;
        let usd = balance.usd_value(self.oracle.as_ref()).await?;
        self.record_balance(account, &balance, usd)?;
        tracing::debug!(
            chain = chain.name(),
            account,
            balance = %balance,
            "balance refreshed"
        );
        Ok(balance)
    }

    /// Upsert one cached balance row.
    fn record_balance(
        &self,
        account: &str,
        balance: &Asset,
        usd: Decimal,
    ) -> Result<(), WalletError> {
        let token = balance.token();
        let existing = self.assets.find_asset(token.chain_id(), token.symbol())?;
        match existing {
            Some(_) => {
                self.assets
                    .update_balance(token.chain_id(), token.symbol(), balance.amount(), usd)?
            }
            None => self.assets.create_asset(StoredAsset::new(
                *token.chain_id(),
                token.symbol(),
                account,
                balance.amount(),
                usd,
            ))?,
        }
        Ok(())
    }

    /// The last cached balance row for `chain_id`'s native token, if a
    /// refresh ever ran.
    pub fn cached_balance(&self, chain_id: &ChainId) -> Result<Option<StoredAsset>, WalletError> {
        let token = self.registry.token_for_chain(chain_id)?;
        Ok(self.assets.find_asset(chain_id, token.symbol())?)
    }

    /// Forget every stored key.
    pub fn logout(&self) -> Result<(), WalletError> {
        self.keys.delete_all()?;
        tracing::info!("wallet logged out; keys deleted");
        Ok(())
    }
}
