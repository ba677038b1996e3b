//! secp256k1 key wrappers and deterministic derivation.

use crate::hash::{sha256, sha256_multi};
use k256::ecdsa::{SigningKey, VerifyingKey};
use pangea_types::{ChainError, ChainId};
use rand::RngCore;
use std::fmt;
use zeroize::Zeroize;

/// A secp256k1 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Parse from SEC1 bytes (33-byte compressed or 65-byte uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let inner = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|_| ChainError::InvalidKey("not a valid secp256k1 point".into()))?;
        Ok(Self { inner })
    }

    pub(crate) fn from_verifying_key(inner: VerifyingKey) -> Self {
        Self { inner }
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }

    /// 33-byte compressed SEC1 encoding.
    pub fn compressed(&self) -> [u8; 33] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// 65-byte uncompressed SEC1 encoding (0x04 prefix).
    pub fn uncompressed(&self) -> [u8; 65] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.compressed()))
    }
}

/// A secp256k1 private key.
///
/// Intentionally implements neither `Debug` nor any serde trait; the
/// wrapped scalar is zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Construct from a raw 32-byte scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, ChainError> {
        let inner = SigningKey::from_slice(bytes)
            .map_err(|_| ChainError::InvalidKey("scalar out of range".into()))?;
        Ok(Self { inner })
    }

    /// The raw 32-byte scalar. Callers own wiping the copy.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: *self.inner.verifying_key(),
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

/// Derive the private key for one chain from the wallet seed.
///
/// The scalar is SHA-256 over `seed || 0x00 || chain-id`, rehashed until
/// it lands in the curve's scalar field. The same seed and chain always
/// produce the same key; different chains produce unrelated keys.
pub fn private_key_from_seed(seed: &str, chain_id: &ChainId) -> PrivateKey {
    let chain_tag = chain_id.to_string();
    let mut material = sha256_multi(&[seed.as_bytes(), &[0u8], chain_tag.as_bytes()]);
    loop {
        match SigningKey::from_slice(&material) {
            Ok(inner) => {
                material.zeroize();
                return PrivateKey { inner };
            }
            // out-of-range scalar, probability ~2^-128 per draw
            Err(_) => material = sha256(&material),
        }
    }
}

/// Generate a fresh random private key.
pub fn generate_private_key() -> PrivateKey {
    let mut material = [0u8; 32];
    rand::rng().fill_bytes(&mut material);
    loop {
        match SigningKey::from_slice(&material) {
            Ok(inner) => {
                material.zeroize();
                return PrivateKey { inner };
            }
            Err(_) => material = sha256(&material),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethereum_chain() -> ChainId {
        ChainId::Ethereum(11155111)
    }

    fn antelope_chain() -> ChainId {
        ChainId::Antelope(
            "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
                .parse()
                .unwrap(),
        )
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = private_key_from_seed("correct horse battery staple", &ethereum_chain());
        let b = private_key_from_seed("correct horse battery staple", &ethereum_chain());
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn different_chains_produce_different_keys() {
        let eth = private_key_from_seed("seed", &ethereum_chain());
        let ant = private_key_from_seed("seed", &antelope_chain());
        assert_ne!(eth.to_bytes(), ant.to_bytes());
    }

    #[test]
    fn different_seeds_produce_different_keys() {
        let a = private_key_from_seed("seed-one", &ethereum_chain());
        let b = private_key_from_seed("seed-two", &ethereum_chain());
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn round_trips_through_bytes() {
        let key = private_key_from_seed("roundtrip", &ethereum_chain());
        let restored = PrivateKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(
            key.public_key().compressed(),
            restored.public_key().compressed()
        );
    }

    #[test]
    fn rejects_zero_scalar() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn public_key_sec1_round_trip() {
        let key = generate_private_key();
        let public = key.public_key();
        let compressed = PublicKey::from_sec1_bytes(&public.compressed()).unwrap();
        let uncompressed = PublicKey::from_sec1_bytes(&public.uncompressed()).unwrap();
        assert_eq!(compressed, public);
        assert_eq!(uncompressed, public);
    }
}
