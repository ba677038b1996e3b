//! Cached balance storage.
//!
//! The wallet shows the last known balance immediately and refreshes it
//! in the background; this store holds that snapshot per token.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use pangea_types::ChainId;

use crate::error::StoreError;

/// One cached balance row: account, token amount, and its USD value at
/// refresh time.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredAsset {
    pub chain_id: ChainId,
    pub symbol: String,
    pub account_name: String,
    pub balance: Decimal,
    pub usd_balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl StoredAsset {
    pub fn new(
        chain_id: ChainId,
        symbol: &str,
        account_name: &str,
        balance: Decimal,
        usd_balance: Decimal,
    ) -> Self {
        Self {
            chain_id,
            symbol: symbol.to_string(),
            account_name: account_name.to_string(),
            balance,
            usd_balance,
            updated_at: Utc::now(),
        }
    }
}

/// Storage for cached balances, keyed by chain and token symbol.
pub trait AssetStore: Send + Sync {
    /// The cached row for a token, if one was ever written.
    fn find_asset(
        &self,
        chain_id: &ChainId,
        symbol: &str,
    ) -> Result<Option<StoredAsset>, StoreError>;

    /// Insert a new row, replacing any previous one for the same token.
    fn create_asset(&self, asset: StoredAsset) -> Result<(), StoreError>;

    /// Update the balance columns of an existing row and stamp it.
    fn update_balance(
        &self,
        chain_id: &ChainId,
        symbol: &str,
        balance: Decimal,
        usd_balance: Decimal,
    ) -> Result<(), StoreError>;
}

/// Balance cache held in process memory.
#[derive(Default)]
pub struct MemoryAssetStore {
    assets: RwLock<HashMap<(ChainId, String), StoredAsset>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetStore for MemoryAssetStore {
    fn find_asset(
        &self,
        chain_id: &ChainId,
        symbol: &str,
    ) -> Result<Option<StoredAsset>, StoreError> {
        let assets = self
            .assets
            .read()
            .map_err(|_| StoreError::Backend("asset store lock poisoned".to_string()))?;
        Ok(assets.get(&(*chain_id, symbol.to_string())).cloned())
    }

    fn create_asset(&self, asset: StoredAsset) -> Result<(), StoreError> {
        let mut assets = self
            .assets
            .write()
            .map_err(|_| StoreError::Backend("asset store lock poisoned".to_string()))?;
        assets.insert((asset.chain_id, asset.symbol.clone()), asset);
        Ok(())
    }

    fn update_balance(
        &self,
        chain_id: &ChainId,
        symbol: &str,
        balance: Decimal,
        usd_balance: Decimal,
    ) -> Result<(), StoreError> {
        let mut assets = self
            .assets
            .write()
            .map_err(|_| StoreError::Backend("asset store lock poisoned".to_string()))?;
        let asset = assets
            .get_mut(&(*chain_id, symbol.to_string()))
            .ok_or_else(|| StoreError::NotFound(format!("asset {symbol} on {chain_id}")))?;
        asset.balance = balance;
        asset.usd_balance = usd_balance;
        asset.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn chain_id() -> ChainId {
        ChainId::Ethereum(11155111)
    }

    #[test]
    fn missing_rows_read_as_none() {
        let store = MemoryAssetStore::new();
        assert!(store.find_asset(&chain_id(), "ETH").unwrap().is_none());
    }

    #[test]
    fn create_then_update_round_trips() {
        let store = MemoryAssetStore::new();
        let row = StoredAsset::new(
            chain_id(),
            "ETH",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            Decimal::from_str("1.5").unwrap(),
            Decimal::from_str("4500").unwrap(),
        );
        store.create_asset(row.clone()).unwrap();

        let found = store.find_asset(&chain_id(), "ETH").unwrap().unwrap();
        assert_eq!(found.balance, row.balance);

        store
            .update_balance(
                &chain_id(),
                "ETH",
                Decimal::from_str("2").unwrap(),
                Decimal::from_str("6000").unwrap(),
            )
            .unwrap();
        let found = store.find_asset(&chain_id(), "ETH").unwrap().unwrap();
        assert_eq!(found.balance, Decimal::from_str("2").unwrap());
        assert_eq!(found.usd_balance, Decimal::from_str("6000").unwrap());
        assert!(found.updated_at >= row.updated_at);
    }

    #[test]
    fn updating_a_missing_row_is_not_found() {
        let store = MemoryAssetStore::new();
        let err = store
            .update_balance(&chain_id(), "ETH", Decimal::ZERO, Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
