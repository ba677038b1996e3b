//! Classification of operations for consent screens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an operation does, as shown to the user before signing.
///
/// `Both` marks a contract call that also moves value, such as a token
/// transfer through a contract method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    Transfer,
    ContractCall,
    Both,
}

impl TransactionType {
    pub fn transfers_value(&self) -> bool {
        matches!(self, TransactionType::Transfer | TransactionType::Both)
    }

    pub fn calls_contract(&self) -> bool {
        matches!(self, TransactionType::ContractCall | TransactionType::Both)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Transfer => write!(f, "transfer"),
            TransactionType::ContractCall => write!(f, "contract-call"),
            TransactionType::Both => write!(f, "transfer-and-call"),
        }
    }
}
