//! Antelope canonical signing and `PUB_K1_` / `SIG_K1_` text encodings.
//!
//! Antelope nodes only accept canonical signatures: the leading byte of
//! both r and s must stay below 0x80 with no redundant zero padding.
//! Signing retries RFC6979 with a one-byte entropy counter until the
//! result is canonical, matching the reference wallets.

use crate::ethereum::split_normalized;
use crate::hash::sha256;
use crate::keys::{PrivateKey, PublicKey};
use k256::ecdsa::hazmat::SignPrimitive;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::FieldBytes;
use pangea_types::ChainError;
use ripemd::{Digest, Ripemd160};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

const PUB_K1_PREFIX: &str = "PUB_K1_";
const SIG_K1_PREFIX: &str = "SIG_K1_";
const LEGACY_PREFIX: &str = "EOS";
const K1_SUFFIX: &[u8] = b"K1";

/// A canonical recoverable signature for Antelope chains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AntelopeSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery: u8,
}

impl AntelopeSignature {
    /// The 65-byte compact form: recovery byte, r, s.
    ///
    /// The recovery byte is `parity + 27 + 4`, the +4 marking a
    /// compressed public key.
    pub fn compact(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = self.recovery + 31;
        out[1..33].copy_from_slice(&self.r);
        out[33..].copy_from_slice(&self.s);
        out
    }

    /// Recover the signer's public key from the signed digest.
    pub fn recover(&self, digest: &[u8; 32]) -> Result<PublicKey, ChainError> {
        let sig = Signature::from_scalars(self.r, self.s)
            .map_err(|_| ChainError::InvalidSignature("scalars out of range".into()))?;
        let recid = RecoveryId::from_byte(self.recovery)
            .ok_or_else(|| ChainError::InvalidSignature("bad recovery id".into()))?;
        let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
            .map_err(|_| ChainError::InvalidSignature("does not recover".into()))?;
        Ok(PublicKey::from_verifying_key(key))
    }
}

impl fmt::Display for AntelopeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compact = self.compact();
        write!(f, "{SIG_K1_PREFIX}{}", encode_with_checksum(&compact))
    }
}

impl FromStr for AntelopeSignature {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix(SIG_K1_PREFIX).ok_or_else(|| {
            ChainError::InvalidSignature(format!("must start with {SIG_K1_PREFIX}"))
        })?;
        let payload = decode_with_checksum(body, 65)?;
        if payload[0] < 31 || payload[0] > 34 {
            return Err(ChainError::InvalidSignature(format!(
                "unexpected recovery byte {}",
                payload[0]
            )));
        }
        let mut r = [0u8; 32];
        let mut sv = [0u8; 32];
        r.copy_from_slice(&payload[1..33]);
        sv.copy_from_slice(&payload[33..65]);
        Ok(Self {
            r,
            s: sv,
            recovery: payload[0] - 31,
        })
    }
}

/// Sign a digest, retrying until the signature is canonical.
pub fn sign_canonical(
    digest: &[u8; 32],
    key: &PrivateKey,
) -> Result<AntelopeSignature, ChainError> {
    let z = FieldBytes::from(*digest);
    let scalar = key.signing_key().as_nonzero_scalar();
    for attempt in 0u8..=255 {
        let ad: &[u8] = if attempt == 0 {
            &[]
        } else {
            std::slice::from_ref(&attempt)
        };
        let (sig, recid) = scalar
            .try_sign_prehashed_rfc6979::<Sha256>(&z, ad)
            .map_err(|e| ChainError::Protocol(format!("signing failed: {e}")))?;
        let Some(recid) = recid else { continue };
        let (r, s, recovery) = split_normalized(sig, recid.to_byte());
        if is_canonical(&r, &s) {
            return Ok(AntelopeSignature { r, s, recovery });
        }
    }
    Err(ChainError::Protocol(
        "no canonical signature after 255 attempts".into(),
    ))
}

fn is_canonical(r: &[u8; 32], s: &[u8; 32]) -> bool {
    r[0] & 0x80 == 0
        && !(r[0] == 0 && r[1] & 0x80 == 0)
        && s[0] & 0x80 == 0
        && !(s[0] == 0 && s[1] & 0x80 == 0)
}

/// Encode a public key in the `PUB_K1_` text format.
pub fn public_key_to_string(key: &PublicKey) -> String {
    format!("{PUB_K1_PREFIX}{}", encode_with_checksum(&key.compressed()))
}

/// Parse a public key from `PUB_K1_` or the legacy `EOS` format.
pub fn public_key_from_string(s: &str) -> Result<PublicKey, ChainError> {
    if let Some(body) = s.strip_prefix(PUB_K1_PREFIX) {
        let payload = decode_with_checksum(body, 33)?;
        return PublicKey::from_sec1_bytes(&payload);
    }
    if let Some(body) = s.strip_prefix(LEGACY_PREFIX) {
        let payload = decode_legacy(body)?;
        return PublicKey::from_sec1_bytes(&payload);
    }
    Err(ChainError::InvalidKey(format!(
        "unrecognized public key format: {s}"
    )))
}

fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

fn k1_checksum(payload: &[u8]) -> [u8; 4] {
    let mut buf = Vec::with_capacity(payload.len() + K1_SUFFIX.len());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(K1_SUFFIX);
    let digest = ripemd160(&buf);
    [digest[0], digest[1], digest[2], digest[3]]
}

fn encode_with_checksum(payload: &[u8]) -> String {
    let checksum = k1_checksum(payload);
    let mut buf = Vec::with_capacity(payload.len() + 4);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum);
    bs58::encode(buf).into_string()
}

fn decode_with_checksum(body: &str, payload_len: usize) -> Result<Vec<u8>, ChainError> {
    let raw = bs58::decode(body)
        .into_vec()
        .map_err(|_| ChainError::InvalidKey("bad base58".into()))?;
    if raw.len() != payload_len + 4 {
        return Err(ChainError::InvalidKey(format!(
            "expected {} bytes, got {}",
            payload_len + 4,
            raw.len()
        )));
    }
    let (payload, checksum) = raw.split_at(payload_len);
    if k1_checksum(payload) != checksum {
        return Err(ChainError::InvalidKey("checksum mismatch".into()));
    }
    Ok(payload.to_vec())
}

// legacy EOS keys checksum the raw key without the K1 suffix
fn decode_legacy(body: &str) -> Result<Vec<u8>, ChainError> {
    let raw = bs58::decode(body)
        .into_vec()
        .map_err(|_| ChainError::InvalidKey("bad base58".into()))?;
    if raw.len() != 37 {
        return Err(ChainError::InvalidKey(format!(
            "expected 37 bytes, got {}",
            raw.len()
        )));
    }
    let (payload, checksum) = raw.split_at(33);
    let digest = ripemd160(payload);
    if digest[..4] != *checksum {
        return Err(ChainError::InvalidKey("checksum mismatch".into()));
    }
    Ok(payload.to_vec())
}

/// Encode a public key in the legacy `EOS` format.
pub fn public_key_to_legacy_string(key: &PublicKey) -> String {
    let payload = key.compressed();
    let digest = ripemd160(&payload);
    let mut buf = Vec::with_capacity(37);
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(&digest[..4]);
    format!("{LEGACY_PREFIX}{}", bs58::encode(buf).into_string())
}
