//! Ethereum address type.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 20-byte Ethereum address.
///
/// Displays in EIP-55 mixed-case checksum form. Parsing accepts any case
/// and does not enforce the checksum (wallets routinely receive
/// lowercased addresses from session peers).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthereumAddress(pub [u8; 20]);

impl EthereumAddress {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 checksummed string, `0x` prefixed.
    pub fn checksummed(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Elided display form for UI lists, e.g. `0xf39f...2266`.
    pub fn short(&self) -> String {
        let lower = hex::encode(self.0);
        format!("0x{}...{}", &lower[..4], &lower[36..])
    }

    /// Whether a string parses as an address.
    pub fn is_valid(s: &str) -> bool {
        s.parse::<Self>().is_ok()
    }
}

impl FromStr for EthereumAddress {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 40 {
            return Err(ChainError::InvalidAddress(format!(
                "expected 40 hex characters: {s}"
            )));
        }
        let bytes = hex::decode(stripped)
            .map_err(|_| ChainError::InvalidAddress(format!("non-hex characters: {s}")))?;
        // length checked above
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ChainError::InvalidAddress(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.checksummed())
    }
}

impl fmt::Debug for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthereumAddress({})", self.checksummed())
    }
}

impl Serialize for EthereumAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.checksummed())
    }
}

impl<'de> Deserialize<'de> for EthereumAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
