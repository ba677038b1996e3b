//! Chain families and chain identifiers.
//!
//! Every supported chain belongs to exactly one family. Code that needs
//! per-family behavior matches exhaustively on these enums so a new family
//! cannot be added without visiting every branch point.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The protocol family a chain belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Ethereum,
    Antelope,
}

impl ChainFamily {
    /// CAIP-2 namespace used in session account strings.
    pub fn namespace(&self) -> &'static str {
        match self {
            ChainFamily::Ethereum => "eip155",
            ChainFamily::Antelope => "antelope",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFamily::Ethereum => write!(f, "ethereum"),
            ChainFamily::Antelope => write!(f, "antelope"),
        }
    }
}

/// A 32-byte Antelope chain id (the hash of the chain's genesis state).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AntelopeChainId(pub [u8; 32]);

impl AntelopeChainId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 32 hex characters, as used in CAIP-2 references.
    pub fn short_hex(&self) -> String {
        hex::encode(self.0)[..32].to_string()
    }
}

impl FromStr for AntelopeChainId {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| {
            ChainError::UnsupportedChain(format!("malformed antelope chain id {s}"))
        })?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            ChainError::UnsupportedChain(format!("antelope chain id must be 32 bytes: {s}"))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for AntelopeChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AntelopeChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AntelopeChainId({})", hex::encode(self.0))
    }
}

impl Serialize for AntelopeChainId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AntelopeChainId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A family-tagged chain identifier.
///
/// Ethereum chains are identified by their numeric EIP-155 chain id,
/// Antelope chains by the 32-byte genesis checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainId {
    Ethereum(u64),
    Antelope(AntelopeChainId),
}

impl ChainId {
    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Ethereum(_) => ChainFamily::Ethereum,
            ChainId::Antelope(_) => ChainFamily::Antelope,
        }
    }

    /// CAIP-2 identifier, e.g. `eip155:137`.
    ///
    /// Antelope references are truncated to 32 hex characters per CAIP-2.
    pub fn caip2(&self) -> String {
        match self {
            ChainId::Ethereum(id) => format!("eip155:{id}"),
            ChainId::Antelope(id) => format!("antelope:{}", id.short_hex()),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Ethereum(id) => write!(f, "{id}"),
            ChainId::Antelope(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antelope_chain_id_round_trips_hex() {
        let hex_id = "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906";
        let id: AntelopeChainId = hex_id.parse().unwrap();
        assert_eq!(id.to_string(), hex_id);
        assert_eq!(id.short_hex(), &hex_id[..32]);
    }

    #[test]
    fn malformed_antelope_chain_id_rejected() {
        assert!("abcd".parse::<AntelopeChainId>().is_err());
        assert!("zz".repeat(32).parse::<AntelopeChainId>().is_err());
    }

    #[test]
    fn caip2_forms() {
        let eth = ChainId::Ethereum(137);
        assert_eq!(eth.caip2(), "eip155:137");
        assert_eq!(eth.to_string(), "137");

        let ant = ChainId::Antelope(
            "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906"
                .parse()
                .unwrap(),
        );
        assert_eq!(ant.caip2(), "antelope:aca376f206b8fc25a6ed44dbdc66547c");
    }
}
