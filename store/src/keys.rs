//! Key storage trait and the in-memory backend.

use std::collections::HashMap;
use std::sync::RwLock;

use pangea_chain::ChainPrivateKey;

use crate::error::StoreError;

/// Storage for the wallet's signing keys, one per chain key slot.
///
/// Callers fetch keys on demand for each signing operation and drop
/// them afterwards; nothing above this trait caches key material.
pub trait KeyStore: Send + Sync {
    /// The key stored under `name`, if any.
    fn find_by_name(&self, name: &str) -> Result<Option<ChainPrivateKey>, StoreError>;

    /// Store `key` under `name`, replacing any previous entry.
    fn emplace(&self, name: &str, key: ChainPrivateKey) -> Result<(), StoreError>;

    /// Slot names with stored keys, sorted.
    fn names(&self) -> Result<Vec<String>, StoreError>;

    /// Remove every stored key.
    fn delete_all(&self) -> Result<(), StoreError>;
}

/// Keys held in process memory. Test and ephemeral-session backend.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, ChainPrivateKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn find_by_name(&self, name: &str) -> Result<Option<ChainPrivateKey>, StoreError> {
        let keys = self
            .keys
            .read()
            .map_err(|_| StoreError::Backend("key store lock poisoned".to_string()))?;
        Ok(keys.get(name).cloned())
    }

    fn emplace(&self, name: &str, key: ChainPrivateKey) -> Result<(), StoreError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| StoreError::Backend("key store lock poisoned".to_string()))?;
        keys.insert(name.to_string(), key);
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>, StoreError> {
        let keys = self
            .keys
            .read()
            .map_err(|_| StoreError::Backend("key store lock poisoned".to_string()))?;
        let mut names: Vec<String> = keys.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| StoreError::Backend("key store lock poisoned".to_string()))?;
        keys.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pangea_types::{ChainFamily, ChainId};

    fn key(seed: &str) -> ChainPrivateKey {
        ChainPrivateKey::from_seed(seed, &ChainId::Ethereum(1))
    }

    #[test]
    fn keys_come_back_under_their_slot() {
        let store = MemoryKeyStore::new();
        assert!(store.find_by_name("ethereum").unwrap().is_none());

        store.emplace("ethereum", key("a")).unwrap();
        let found = store.find_by_name("ethereum").unwrap().unwrap();
        assert_eq!(found.family(), ChainFamily::Ethereum);
        assert_eq!(found.to_bytes(), key("a").to_bytes());
    }

    #[test]
    fn emplace_replaces_and_names_stay_sorted() {
        let store = MemoryKeyStore::new();
        store.emplace("pangea", key("a")).unwrap();
        store.emplace("ethereum", key("b")).unwrap();
        store.emplace("pangea", key("c")).unwrap();

        assert_eq!(store.names().unwrap(), ["ethereum", "pangea"]);
        let stored = store.find_by_name("pangea").unwrap().unwrap();
        assert_eq!(stored.to_bytes(), key("c").to_bytes());
    }

    #[test]
    fn delete_all_empties_the_store() {
        let store = MemoryKeyStore::new();
        store.emplace("ethereum", key("a")).unwrap();
        store.delete_all().unwrap();
        assert!(store.names().unwrap().is_empty());
        assert!(store.find_by_name("ethereum").unwrap().is_none());
    }
}
