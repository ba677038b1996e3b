//! Decentralized identifier strings for on-chain accounts.

use crate::address::EthereumAddress;
use crate::family::AntelopeChainId;
use crate::name::AntelopeName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A DID naming an account on a specific chain.
///
/// Antelope accounts use the `did:antelope` method with the full chain id;
/// Ethereum accounts use `did:ethr`, where only non-mainnet chains carry
/// an explicit network component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Did(String);

impl Did {
    pub fn antelope(chain_id: &AntelopeChainId, name: &AntelopeName) -> Self {
        Self(format!("did:antelope:{chain_id}:{name}"))
    }

    pub fn ethereum(chain_id: u64, address: &EthereumAddress) -> Self {
        if chain_id == 1 {
            Self(format!("did:ethr:{}", address.checksummed()))
        } else {
            Self(format!("did:ethr:0x{chain_id:x}:{}", address.checksummed()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antelope_did_includes_chain_and_name() {
        let chain: AntelopeChainId =
            "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
                .parse()
                .unwrap();
        let name: AntelopeName = "coinsale.tmy".parse().unwrap();
        assert_eq!(
            Did::antelope(&chain, &name).as_str(),
            "did:antelope:8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f:coinsale.tmy"
        );
    }

    #[test]
    fn ethr_did_omits_mainnet_network() {
        let addr: EthereumAddress = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            .parse()
            .unwrap();
        assert_eq!(
            Did::ethereum(1, &addr).as_str(),
            "did:ethr:0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(
            Did::ethereum(137, &addr).as_str(),
            "did:ethr:0x89:0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }
}
