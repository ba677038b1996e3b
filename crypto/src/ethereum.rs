//! Ethereum address derivation and recoverable ECDSA signing.

use crate::hash::keccak256;
use crate::keys::{PrivateKey, PublicKey};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use pangea_types::{ChainError, EthereumAddress};

/// A signature with its recovery parity, split into raw scalars.
///
/// `recovery` is the bare parity bit (0 or 1); EIP-155 `v` values are
/// computed by the transaction encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery: u8,
}

/// Derive the Ethereum address: last 20 bytes of the Keccak-256 of the
/// uncompressed public key (without the 0x04 prefix).
pub fn ethereum_address(public_key: &PublicKey) -> EthereumAddress {
    let point = public_key.uncompressed();
    let digest = keccak256(&point[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    EthereumAddress(addr)
}

/// Sign a 32-byte digest, returning the low-s signature and recovery parity.
pub fn sign_prehash(digest: &[u8; 32], key: &PrivateKey) -> Result<RecoverableSignature, ChainError> {
    let (sig, recid) = key
        .signing_key()
        .sign_prehash_recoverable(digest)
        .map_err(|e| ChainError::Protocol(format!("signing failed: {e}")))?;
    let (r, s, recovery) = split_normalized(sig, recid.to_byte());
    Ok(RecoverableSignature { r, s, recovery })
}

/// Recover the signing public key from a digest and signature.
pub fn recover_public_key(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<PublicKey, ChainError> {
    let sig = Signature::from_scalars(signature.r, signature.s)
        .map_err(|_| ChainError::InvalidKey("signature scalars out of range".into()))?;
    let recid = RecoveryId::from_byte(signature.recovery)
        .ok_or_else(|| ChainError::InvalidKey("bad recovery id".into()))?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|_| ChainError::InvalidKey("signature does not recover".into()))?;
    Ok(PublicKey::from_verifying_key(key))
}

/// Force a signature into low-s form; the recovery parity flips with s.
pub(crate) fn split_normalized(sig: Signature, recid: u8) -> ([u8; 32], [u8; 32], u8) {
    let (sig, recovery) = match sig.normalize_s() {
        Some(normalized) => (normalized, recid ^ 1),
        None => (sig, recid),
    };
    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    (r, s, recovery)
}
