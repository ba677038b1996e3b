//! Private keys bound to the chain family they sign for.

use pangea_crypto::{
    ethereum_address, private_key_from_seed, public_key_to_string, PrivateKey, PublicKey,
};
use pangea_types::{ChainError, ChainFamily, ChainId, EthereumAddress};

use crate::receipt::TransactionReceipt;
use crate::transaction::{ChainTransaction, SignedTransaction};

/// A secp256k1 private key tagged with its chain family.
///
/// The same scalar renders differently per family (Keccak address and
/// low-s recoverable signatures for Ethereum, `PUB_K1_` text and
/// canonical signatures for Antelope), so the key carries the family it
/// was derived for and refuses cross-family use.
#[derive(Clone)]
pub enum ChainPrivateKey {
    Ethereum(PrivateKey),
    Antelope(PrivateKey),
}

impl ChainPrivateKey {
    /// Derive the key for `chain_id` from a wallet seed.
    ///
    /// Deterministic: the same seed and chain always yield the same key,
    /// and distinct chains yield unrelated keys.
    pub fn from_seed(seed: &str, chain_id: &ChainId) -> Self {
        let key = private_key_from_seed(seed, chain_id);
        match chain_id.family() {
            ChainFamily::Ethereum => ChainPrivateKey::Ethereum(key),
            ChainFamily::Antelope => ChainPrivateKey::Antelope(key),
        }
    }

    /// Rebuild a key from its raw scalar, e.g. out of a key store.
    pub fn from_bytes(family: ChainFamily, bytes: &[u8; 32]) -> Result<Self, ChainError> {
        let key = PrivateKey::from_bytes(bytes)?;
        Ok(match family {
            ChainFamily::Ethereum => ChainPrivateKey::Ethereum(key),
            ChainFamily::Antelope => ChainPrivateKey::Antelope(key),
        })
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            ChainPrivateKey::Ethereum(_) => ChainFamily::Ethereum,
            ChainPrivateKey::Antelope(_) => ChainFamily::Antelope,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            ChainPrivateKey::Ethereum(key) | ChainPrivateKey::Antelope(key) => key.public_key(),
        }
    }

    /// The public key in the family's native text form: `0x`-hex of the
    /// compressed point for Ethereum, `PUB_K1_` for Antelope.
    pub fn public_key_string(&self) -> String {
        match self {
            ChainPrivateKey::Ethereum(key) => {
                format!("0x{}", hex::encode(key.public_key().compressed()))
            }
            ChainPrivateKey::Antelope(key) => public_key_to_string(&key.public_key()),
        }
    }

    /// The address this key controls (Ethereum only).
    pub fn ethereum_address(&self) -> Result<EthereumAddress, ChainError> {
        let key = self.ethereum_key()?;
        Ok(ethereum_address(&key.public_key()))
    }

    /// The raw scalar, for storage. Handle with care.
    pub fn to_bytes(&self) -> [u8; 32] {
        match self {
            ChainPrivateKey::Ethereum(key) | ChainPrivateKey::Antelope(key) => key.to_bytes(),
        }
    }

    pub fn ethereum_key(&self) -> Result<&PrivateKey, ChainError> {
        match self {
            ChainPrivateKey::Ethereum(key) => Ok(key),
            ChainPrivateKey::Antelope(_) => Err(ChainError::Protocol(
                "antelope key cannot sign for an ethereum chain".to_string(),
            )),
        }
    }

    pub fn antelope_key(&self) -> Result<&PrivateKey, ChainError> {
        match self {
            ChainPrivateKey::Antelope(key) => Ok(key),
            ChainPrivateKey::Ethereum(_) => Err(ChainError::Protocol(
                "ethereum key cannot sign for an antelope chain".to_string(),
            )),
        }
    }

    /// Sign `transaction`, failing on a family mismatch.
    pub async fn sign_transaction(
        &self,
        transaction: &ChainTransaction,
    ) -> Result<SignedTransaction, ChainError> {
        transaction.sign(self).await
    }

    /// Sign and broadcast `transaction` through its chain's endpoint.
    pub async fn send_transaction(
        &self,
        transaction: &ChainTransaction,
    ) -> Result<TransactionReceipt, ChainError> {
        transaction.send(self).await
    }
}

impl std::fmt::Debug for ChainPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("ChainPrivateKey")
            .field("family", &self.family())
            .field("public_key", &self.public_key_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pangea_id() -> ChainId {
        ChainId::Antelope(
            "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
                .parse()
                .unwrap(),
        )
    }

    #[test]
    fn derivation_tags_the_family() {
        let eth = ChainPrivateKey::from_seed("seed phrase", &ChainId::Ethereum(1));
        let ant = ChainPrivateKey::from_seed("seed phrase", &pangea_id());
        assert_eq!(eth.family(), ChainFamily::Ethereum);
        assert_eq!(ant.family(), ChainFamily::Antelope);
        assert_ne!(eth.to_bytes(), ant.to_bytes());
    }

    #[test]
    fn public_key_strings_per_family() {
        let eth = ChainPrivateKey::from_seed("seed phrase", &ChainId::Ethereum(1));
        let ant = ChainPrivateKey::from_seed("seed phrase", &pangea_id());
        assert!(eth.public_key_string().starts_with("0x"));
        assert_eq!(eth.public_key_string().len(), 2 + 66);
        assert!(ant.public_key_string().starts_with("PUB_K1_"));
    }

    #[test]
    fn cross_family_access_is_refused() {
        let eth = ChainPrivateKey::from_seed("seed phrase", &ChainId::Ethereum(1));
        assert!(eth.ethereum_key().is_ok());
        assert!(matches!(eth.antelope_key(), Err(ChainError::Protocol(_))));

        let ant = ChainPrivateKey::from_seed("seed phrase", &pangea_id());
        assert!(ant.antelope_key().is_ok());
        assert!(matches!(ant.ethereum_address(), Err(ChainError::Protocol(_))));
    }

    #[test]
    fn round_trips_through_raw_bytes() {
        let key = ChainPrivateKey::from_seed("seed phrase", &ChainId::Ethereum(1));
        let bytes = key.to_bytes();
        let back = ChainPrivateKey::from_bytes(ChainFamily::Ethereum, &bytes).unwrap();
        assert_eq!(back.public_key_string(), key.public_key_string());
    }

    #[test]
    fn debug_output_hides_the_scalar() {
        let key = ChainPrivateKey::from_seed("seed phrase", &ChainId::Ethereum(1));
        let debug = format!("{key:?}");
        assert!(!debug.contains(&hex::encode(key.to_bytes())));
        assert!(debug.contains("Ethereum"));
    }
}
